//! splvkit command-line interface
//!
//! Builds and stages the SPLV encoder's native Python extension, and sweeps
//! the encoder benchmark over a dataset

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use splvkit::platform::HostPlatform;
use std::path::PathBuf;
use std::process;

/// Display an error with optional backtrace information
fn display_error(err: &anyhow::Error, backtrace_enabled: bool) {
    eprintln!("error: {err}");

    // Show error chain
    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }

    // Show backtrace if enabled
    if backtrace_enabled {
        let backtrace = err.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            eprintln!("\nBacktrace:");
            eprintln!("{backtrace}");
        } else {
            eprintln!("\n(set RUST_BACKTRACE=1 to capture a backtrace)");
        }
    }
}

#[derive(Parser)]
#[command(name = "splvkit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build the SPLV encoder extension and run benchmark sweeps", long_about = None)]
#[command(disable_version_flag = true)]
pub(crate) struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    _version: Option<bool>,

    /// Print debug information
    #[arg(long, global = true)]
    debug: bool,

    /// Show a backtrace when a command fails
    #[arg(long, global = true)]
    backtrace: bool,

    /// Use this config file instead of .splvkit.toml / ~/.config/splvkit/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure and build the native extension, then stage it into the package
    Build {
        /// Extension module name (builds every [[extension]] in the config when omitted)
        #[arg(long)]
        name: Option<String>,

        /// CMake project directory
        #[arg(long, value_name = "DIR")]
        source: Option<PathBuf>,

        /// Package directory the extension is copied into
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,

        /// Directory of companion binaries to stage next to the extension
        #[arg(long, value_name = "DIR")]
        aux_bin: Option<PathBuf>,

        /// Build directory (default: <source>/build)
        #[arg(long, value_name = "DIR")]
        build_dir: Option<PathBuf>,

        /// CMake executable (default: $CMAKE, then cmake on PATH)
        #[arg(long, value_name = "PATH")]
        cmake: Option<PathBuf>,

        /// Plan for another platform family (windows or unix)
        #[arg(long, requires = "dry_run")]
        platform: Option<HostPlatform>,

        /// Kill configure/build steps after this many seconds (0 = never)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Extra CMake option, repeatable
        #[arg(long = "option", short = 'D', value_name = "KEY=VALUE")]
        options: Vec<String>,

        /// Print the commands and paths without running anything
        #[arg(long)]
        dry_run: bool,

        /// Show toolchain output as each step finishes
        #[arg(long)]
        verbose: bool,
    },

    /// Run the benchmark executable over every case in the dataset
    Bench {
        /// Dataset root (<content>/<resolution>/ directories)
        #[arg(long, value_name = "DIR")]
        dataset: Option<PathBuf>,

        /// Benchmark executable (default: ./splv_benchmark)
        #[arg(long, value_name = "PATH")]
        tool: Option<PathBuf>,

        /// Scratch file for encoded output
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Frames per second
        #[arg(short = 'f', long)]
        framerate: Option<u32>,

        /// Group-of-pictures size
        #[arg(short = 'g', long)]
        gop_size: Option<u32>,

        /// Maximum brick group size
        #[arg(short = 'b', long)]
        max_brickgroup_size: Option<u32>,

        /// Motion vectors (on or off)
        #[arg(short = 'm', long, value_name = "on|off", value_parser = commands::bench::parse_on_off)]
        motion_vectors: Option<bool>,

        /// Kill a case after this many seconds (0 = never)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Hide benchmark output and show a progress spinner
        #[arg(long, short)]
        quiet: bool,

        /// Exit with an error when any case fails
        #[arg(long)]
        strict: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Fill unset values from the environment and defaults
        #[arg(long)]
        resolved: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    splvkit::init_debug(cli.debug || splvkit::env_vars::debug());

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Build {
            name,
            source,
            dest,
            aux_bin,
            build_dir,
            cmake,
            platform,
            timeout,
            options,
            dry_run,
            verbose,
        } => {
            let options = commands::build::BuildOptions {
                name,
                source,
                dest,
                aux_bin,
                build_dir,
                cmake,
                platform,
                timeout,
                options,
                dry_run,
                verbose,
            };
            commands::build::run(&options, config_path)
        }
        Commands::Bench {
            dataset,
            tool,
            output,
            framerate,
            gop_size,
            max_brickgroup_size,
            motion_vectors,
            timeout,
            quiet,
            strict,
        } => {
            let options = commands::bench::BenchOptions {
                dataset,
                tool,
                output,
                framerate,
                gop_size,
                max_brickgroup_size,
                motion_vectors,
                timeout,
                quiet,
                strict,
            };
            commands::bench::run(&options, config_path)
        }
        Commands::Config { resolved } => commands::config::run(config_path, resolved),
        Commands::Completion { shell } => commands::completion::run(shell),
    };

    if let Err(e) = result {
        display_error(&e, cli.backtrace);
        process::exit(1);
    }
}

mod commands;
