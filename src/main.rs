//! tf-why CLI entry point.
//!
//! This binary provides the command-line interface for tf-why.

use clap::Parser;
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use tf_why::cli::{ci_exit_code, AnalyzeArgs, Cli, Commands};
use tf_why::error::ResultExt;
use tf_why::reporter::Reporter;
use tf_why::terraform::TerraformRunner;
use tf_why::{err, Analyzer, Config, Plan};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File written by `tf-why init`.
const INIT_CONFIG_FILE: &str = "tf-why.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::debug!(error = %e, "Fatal error");

            eprintln!("Error: {e}");

            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over -v
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,tf_why={level}"))
        })
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Analyze(args) => {
            tracing::debug!("Loading configuration");
            let mut config = Config::discover(cli.config.as_deref())?;
            config.merge_cli_args(&args);
            config.output.colored = use_colors(&config, &args);
            let threshold = config.ci.threshold()?;

            let bytes = read_plan(&args).await?;
            let plan = Plan::parse(&bytes)?;

            let result = Analyzer::from_config(&config).analyze(&plan);

            let report = Reporter::new(&config).generate(&result, args.format)?;

            if let Some(output_path) = &args.output {
                tokio::fs::write(output_path, &report)
                    .await
                    .with_path(output_path)?;
                tracing::info!(path = %output_path.display(), "Report written");
            } else {
                println!("{report}");
            }

            if config.ci.enabled {
                let code = ci_exit_code(&result, threshold);
                tracing::debug!(code, threshold = %threshold, "CI exit code");
                return Ok(ExitCode::from(code));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Init => {
            let config_path = Path::new(INIT_CONFIG_FILE);
            if config_path.exists() {
                return Err(err!(ConfigExists {
                    path: config_path.to_path_buf(),
                })
                .into());
            }
            tokio::fs::write(config_path, Config::example_yaml())
                .await
                .with_path(config_path)?;
            println!("Created example configuration: {INIT_CONFIG_FILE}");
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate(args) => match Config::from_file(&args.config) {
            Ok(_) => {
                println!("Configuration is valid: {}", args.config.display());
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Configuration error: {e}");
                Ok(ExitCode::from(1))
            }
        },
    }
}

/// Plan bytes from `--plan`, `--run`, or stdin.
async fn read_plan(args: &AnalyzeArgs) -> anyhow::Result<Vec<u8>> {
    if let Some(path) = &args.plan {
        tracing::debug!(path = %path.display(), "Reading plan file");
        return Ok(tokio::fs::read(path).await.with_path(path)?);
    }

    if args.run {
        return Ok(TerraformRunner::new(&args.dir).plan_json().await?);
    }

    tracing::debug!("Reading plan from stdin");
    let mut bytes = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut bytes)
        .await
        .with_path("<stdin>")?;
    Ok(bytes)
}

/// Colour only when nothing turns it off and stdout is a terminal.
fn use_colors(config: &Config, args: &AnalyzeArgs) -> bool {
    let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    config.output.colored
        && !no_color_env
        && args.output.is_none()
        && std::io::stdout().is_terminal()
}
