mod event_bus;

use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{
    Args,
    Parser,
    Subcommand,
};
use testlink_runner_core::{
    BuildContext,
    BuildEnvironment,
    BuildOutcome,
    BuildResult,
    ConfigLoader,
    ReportHistory,
    RunnerConfig,
    TestLinkBuilder,
};

use crate::event_bus::TracingEventBus;

const SUMMARY_FILE: &str = "testlink-summary.html";
const DETAILS_FILE: &str = "testlink-details.html";

#[derive(Parser, Debug)]
#[command(name = "testlink-runner", version, about = "Runs TestLink automated test cases and reports their results")]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the configured job against TestLink
    Run(RunArgs),
    /// Load and validate the configuration without contacting TestLink
    CheckConfig {
        /// Config file (defaults to $TESTLINK_RUNNER_CONFIG or ./testlink-runner.toml)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Config file (defaults to $TESTLINK_RUNNER_CONFIG or ./testlink-runner.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory the build steps run in and result files are searched from
    #[arg(long, short, default_value = ".")]
    workspace: PathBuf,

    /// Where the report history and the HTML summaries are written
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Extra build variable, may be repeated
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,
}

fn parse_var(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{input}'")),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RunnerConfig> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(ConfigLoader::discover_config_path);
    tracing::info!(path = %path.display(), "Loading configuration");

    let config = ConfigLoader::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    let errors = config.validate();
    if !errors.is_empty() {
        anyhow::bail!("Invalid configuration: {}", errors.join(", "));
    }
    Ok(config)
}

fn write_summaries(data_dir: &Path, outcome: &BuildOutcome) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    for (file, html) in [
        (SUMMARY_FILE, &outcome.summary_html),
        (DETAILS_FILE, &outcome.details_html),
    ] {
        let path = data_dir.join(file);
        std::fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote report");
    }
    Ok(())
}

async fn run(args: RunArgs) -> anyhow::Result<BuildResult> {
    let config = load_config(args.config.as_deref())?;
    let data_dir = args.data_dir.unwrap_or_else(|| config.data_dir());

    let mut environment = BuildEnvironment::from_process();
    for (key, value) in args.vars {
        environment.set_override(key, value);
    }

    let mut context = BuildContext::new(args.workspace, environment, Arc::new(TracingEventBus));
    let mut builder =
        TestLinkBuilder::from_config(config).with_history(ReportHistory::new(&data_dir));

    let outcome = builder.perform(&mut context).await?;
    write_summaries(&data_dir, &outcome)?;

    Ok(outcome.result)
}

fn exit_code(result: BuildResult) -> ExitCode {
    match result {
        BuildResult::Success => ExitCode::SUCCESS,
        BuildResult::Unstable => ExitCode::from(2),
        BuildResult::Failure => ExitCode::FAILURE,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    testlink_runner_core::logging::init(cli.verbose);

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::error!("Failed to install rustls crypto provider");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Command::Run(args) => match run(args).await {
            Ok(result) => {
                println!("Build result: {result} ({})", result.color());
                exit_code(result)
            }
            Err(e) => {
                tracing::error!("{e:#}");
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
        Command::CheckConfig { config } => match load_config(config.as_deref()) {
            Ok(config) => {
                println!(
                    "Configuration OK: {} installation(s), {} result seeker(s)",
                    config.installations.len(),
                    config.job.result_seekers.len()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}
