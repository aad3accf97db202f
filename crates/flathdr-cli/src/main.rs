mod paths;

use clap::{Parser, Subcommand};
use flathdr_common::DiagnosticLevel;
use flathdr_config::ConverterConfig;
use miette::{IntoDiagnostic, Result, WrapErr};
use paths::FileLayout;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "flathdr")]
#[command(author, version, about = "Convert C++ headers into flat C headers")]
struct Cli {
    /// Log every classification decision
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert headers from the input directory into the output directory
    Convert {
        /// Header files, relative to the input directory
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the configured input directory
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<ConverterConfig> {
    match path {
        Some(path) => ConverterConfig::from_file(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load {}", path.display())),
        None => Ok(ConverterConfig::default()),
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Commands::Convert {
            files,
            config,
            input_dir,
            output_dir,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = input_dir {
                config.layout.input_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.layout.output_dir = dir;
            }

            let layout = FileLayout::beside_executable(&config.layout)
                .into_diagnostic()
                .wrap_err("Failed to locate the executable directory")?;

            for file in &files {
                let input = layout.input_path(file);
                let output = layout
                    .output_path(file)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("Failed to prepare output for {}", file.display()))?;

                let report = flathdr_core::convert_file(&input, &output, &config)?;
                for diag in report.diagnostics {
                    match diag.level {
                        DiagnosticLevel::Warning => {
                            eprintln!("{}: {:?}", input.display(), miette::Report::new(diag))
                        }
                        DiagnosticLevel::Info => log::info!(
                            "{}:{}: {}",
                            input.display(),
                            diag.line.unwrap_or_default(),
                            diag
                        ),
                    }
                }
                log::info!(
                    "{} lines, {} enum values, {} classes",
                    report.lines,
                    report.enum_values.len(),
                    report.classes.len()
                );
                println!("Converted {} -> {}", input.display(), output.display());
            }
        }

        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            let text = config.to_toml().into_diagnostic()?;
            print!("{}", text);
        }
    }

    Ok(())
}
