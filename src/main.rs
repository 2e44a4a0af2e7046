use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use invindex::index::build_index;
use invindex::index::stats::{show_report, write_report};
use invindex::utils::{get_config_path, load_config, save_config};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "invindex")]
#[command(about = "Parallel map/reduce inverted index builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and write one bucket file per letter
    Run {
        /// Number of map worker threads
        map_threads: NonZeroUsize,

        /// Number of reduce worker threads
        reduce_threads: NonZeroUsize,

        /// Input list: file count on the first line, then the file paths
        input_list: PathBuf,

        /// Directory for the bucket files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Extension of the bucket files
        #[arg(short, long)]
        extension: Option<String>,

        /// Also save the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// No progress bar or summary
        #[arg(short, long)]
        quiet: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            map_threads,
            reduce_threads,
            input_list,
            output_dir,
            extension,
            report,
            quiet,
            no_color,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(ext) = extension {
                config.extension = ext;
            }
            if quiet {
                config.show_progress = false;
            }

            if !quiet {
                println!("Indexing: {}", input_list.display());
            }

            let summary = build_index(
                &input_list,
                map_threads.get(),
                reduce_threads.get(),
                &config,
            )
            .with_context(|| format!("Indexing {} failed", input_list.display()))?;

            if let Some(path) = report {
                write_report(&summary, &path)?;
            }

            if !quiet {
                show_report(&summary, &config.output_dir, !no_color)?;
            }
        }
        Commands::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);

            if save {
                let path = cli
                    .config
                    .or_else(get_config_path)
                    .context("No config directory available on this platform")?;
                save_config(&config, &path)?;
                eprintln!("Saved config to {}", path.display());
            }
        }
    }

    Ok(())
}
