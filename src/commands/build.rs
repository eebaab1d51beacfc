//! Build command
//!
//! Configure, build and stage native extensions

use anyhow::{Context, Result, bail};
use splvkit::Config;
use splvkit::extensions::{BuildConfiguration, CMakeToolchain, ExtensionBuilder, ExtensionTarget};
use splvkit::platform::HostPlatform;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options for `splvkit build`
#[derive(Debug, Default)]
pub(crate) struct BuildOptions {
    pub(crate) name: Option<String>,
    pub(crate) source: Option<PathBuf>,
    pub(crate) dest: Option<PathBuf>,
    pub(crate) aux_bin: Option<PathBuf>,
    pub(crate) build_dir: Option<PathBuf>,
    pub(crate) cmake: Option<PathBuf>,
    pub(crate) platform: Option<HostPlatform>,
    pub(crate) timeout: Option<u64>,
    pub(crate) options: Vec<String>,
    pub(crate) dry_run: bool,
    pub(crate) verbose: bool,
}

/// Build extensions and stage them into their package directories
///
/// Targets come from the command line when `--name` is given (filling any
/// missing paths from a matching `[[extension]]` entry), otherwise from
/// every `[[extension]]` entry in the config file.
pub(crate) fn run(options: &BuildOptions, config_path: Option<&Path>) -> Result<()> {
    let mut config =
        Config::load_with_options(config_path).context("Failed to load configuration")?;
    if options.platform.is_some() {
        config.build.platform = options.platform;
    }

    let targets = select_targets(options, &config)?;
    let build_config = apply_overrides(config.build_configuration(), options)?;
    ensure_buildable_platform(build_config.platform, options.dry_run)?;

    let explicit_cmake = options.cmake.as_deref().or_else(|| config.cmake_path());
    let toolchain = match CMakeToolchain::locate(explicit_cmake) {
        Ok(toolchain) => toolchain,
        Err(e) if options.dry_run => {
            splvkit::warning!("{e}");
            CMakeToolchain::with_path(explicit_cmake.unwrap_or_else(|| Path::new("cmake")))
        }
        Err(e) => return Err(e).context("Cannot build without CMake"),
    };
    let builder = ExtensionBuilder::new(toolchain, options.verbose);

    if options.dry_run {
        for target in &targets {
            print_plan(&builder, target, &build_config);
        }
        return Ok(());
    }

    if let [target] = targets.as_slice() {
        println!("Building {}...", target.name);
        let report = builder
            .build_and_stage(target, &build_config)
            .with_context(|| format!("Failed to build {}", target.name))?;

        println!(
            "Built {} in {:.1}s -> {}",
            report.target_name,
            report.duration.as_secs_f64(),
            report.staged.artifact.display()
        );
        if !report.staged.auxiliary.is_empty() {
            println!(
                "  staged {} auxiliary file(s), skipped {}",
                report.staged.auxiliary.len(),
                report.staged.excluded.len()
            );
        }
        return Ok(());
    }

    println!("Building {} extensions...", targets.len());
    let results = builder.build_many(&targets, &build_config);
    for result in &results {
        if result.success {
            println!(
                "  OK {} ({:.1}s)",
                result.target_name,
                result.duration.as_secs_f64()
            );
        } else {
            eprintln!(
                "  FAIL {} - {}",
                result.target_name,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let (built, failed, total) = ExtensionBuilder::summarize(&results);
    println!();
    println!("Built {built} extensions in {:.1}s", total.as_secs_f64());

    if failed > 0 {
        bail!("{failed} extensions failed to build");
    }
    Ok(())
}

fn select_targets(options: &BuildOptions, config: &Config) -> Result<Vec<ExtensionTarget>> {
    let Some(name) = &options.name else {
        if options.source.is_some() || options.dest.is_some() {
            bail!("--source and --dest need --name");
        }
        let targets = config.extension_targets();
        if targets.is_empty() {
            bail!(
                "Nothing to build: pass --name, --source and --dest, or add an [[extension]] table to the config file"
            );
        }
        return Ok(targets);
    };

    let entry = config.extensions.iter().find(|e| &e.name == name);
    let source = options
        .source
        .clone()
        .or_else(|| entry.map(|e| e.source_dir.clone()))
        .with_context(|| format!("No source directory for {name}: pass --source"))?;
    let dest = options
        .dest
        .clone()
        .or_else(|| entry.map(|e| e.destination.clone()))
        .with_context(|| format!("No package directory for {name}: pass --dest"))?;
    let aux = options
        .aux_bin
        .clone()
        .or_else(|| entry.and_then(|e| e.aux_bin_dir.clone()));

    let target = ExtensionTarget::new(name, source, dest);
    Ok(vec![match aux {
        Some(dir) => target.with_aux_bin_dir(dir),
        None => target,
    }])
}

fn apply_overrides(
    mut config: BuildConfiguration,
    options: &BuildOptions,
) -> Result<BuildConfiguration> {
    for define in &options.options {
        let (key, value) = parse_define(define)?;
        config = config.with_option(key, value);
    }
    if let Some(dir) = &options.build_dir {
        config = config.with_build_dir(dir);
    }
    if let Some(secs) = options.timeout {
        config = config.with_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }
    Ok(config)
}

/// A platform other than the host's can only be planned, never built
fn ensure_buildable_platform(platform: HostPlatform, dry_run: bool) -> Result<()> {
    let host = HostPlatform::current();
    if platform != host && !dry_run {
        bail!(
            "Cannot build for {platform} on a {host} host: the platform setting only applies to --dry-run"
        );
    }
    Ok(())
}

/// Parse a `KEY=VALUE` option (a leading `-D` is tolerated)
fn parse_define(define: &str) -> Result<(&str, &str)> {
    let define = define.strip_prefix("-D").unwrap_or(define);
    match define.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => bail!("Invalid option '{define}': expected KEY=VALUE"),
    }
}

fn print_plan(builder: &ExtensionBuilder, target: &ExtensionTarget, config: &BuildConfiguration) {
    let plan = builder.plan(target, config);

    println!("{} ({})", target.name, config.platform);
    println!("  configure: {}", plan.configure.command_line());
    if let Some(dir) = plan.configure.working_dir() {
        println!("         in: {}", dir.display());
    }
    println!("  build:     {}", plan.build.command_line());
    println!("  output:    {}", plan.layout.output_dir().display());
    for path in plan.layout.candidate_paths() {
        println!("    candidate: {}", path.display());
    }
    println!("  stage to:  {}", target.destination.display());
    if let Some(aux) = &target.aux_bin_dir {
        println!("  aux bins:  {}", aux.display());
    }
    if let Err(e) = config.validate() {
        splvkit::warning!("{e}");
    }
}
