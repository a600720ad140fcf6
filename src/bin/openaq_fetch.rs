use anyhow::{Context, Result};
use clap::Parser;
use openaq_fetch::{Client, Pipeline, Settings, logging};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "openaq-fetch",
    version,
    about = "Download OpenAQ air-quality data as JSON files"
)]
struct Cli {
    /// Output directory (emptied before the run). Default: data/raw
    #[arg(short, long)]
    path: Option<PathBuf>,
    /// Log progress to the console and to a timestamped file under logs/.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env(cli.path, cli.verbose);
    if let Some(path) = logging::init(settings.verbose, &settings.log_dir)? {
        log::info!("logging to {}", path.display());
    }
    log::info!("starting, output in {}", settings.output_dir.display());

    let client = Client::new(settings.base_url.clone())?;
    let summary = Pipeline::new(&settings, &client)
        .run()
        .with_context(|| format!("download from {} failed", settings.base_url))?;

    log::info!(
        "completed: {} file(s), {} location(s)",
        summary.files.len(),
        summary.locations.len()
    );
    Ok(())
}
