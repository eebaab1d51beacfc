//! Config command
//!
//! Show the effective splvkit configuration

use anyhow::{Context, Result};
use splvkit::Config;
use std::path::Path;

/// Print the effective configuration as TOML
///
/// With `--resolved`, settings left unset in the file are filled in from the
/// environment and built-in defaults, showing exactly what `build` and
/// `bench` would use.
pub(crate) fn run(config_path: Option<&Path>, resolved: bool) -> Result<()> {
    let config = Config::load_with_options(config_path).context("Failed to load configuration")?;
    let config = if resolved { resolve(config) } else { config };

    let rendered = config.to_toml_string()?;
    if rendered.trim().is_empty() {
        println!("# no configuration set; defaults apply");
    } else {
        print!("{rendered}");
    }
    Ok(())
}

fn resolve(mut config: Config) -> Config {
    let build = config.build_configuration();
    let params = config.sweep_params();

    config.build.platform = Some(build.platform);
    config.build.bindings_option = Some(build.bindings_option.clone());
    config.build.extension_suffix = build.extension_suffix.clone();
    config.toolchain.timeout_secs = Some(build.timeout.map_or(0, |t| t.as_secs()));

    config.bench.dataset = Some(config.dataset_dir());
    config.bench.tool = Some(config.bench_tool());
    config.bench.output = Some(config.bench_output());
    config.bench.framerate = Some(params.framerate);
    config.bench.gop_size = Some(params.gop_size);
    config.bench.max_brickgroup_size = Some(params.max_brickgroup_size);
    config.bench.motion_vectors = Some(params.motion_vectors);
    config.bench.timeout_secs = Some(config.bench_timeout().map_or(0, |t| t.as_secs()));

    config
}
