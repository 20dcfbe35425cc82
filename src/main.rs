mod datasets;
mod error;
mod fetch;
mod pipeline;
mod service;
mod settings;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use datasets::Dataset;
use fetch::Document;
use pipeline::table::Selection;
use service::{Outcome, Service};
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "vitibrasil_scraper",
    about = "Embrapa VitiBrasil tables as normalized JSON records"
)]
struct Cli {
    /// Settings file (TOML, JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available datasets
    List,
    /// Fetch one dataset
    Get {
        #[arg(value_enum)]
        dataset: Dataset,
    },
    /// Fetch every dataset concurrently
    All,
    /// Fetch tables from any page
    Url {
        url: String,
        /// Only the table at this index (default: every table)
        #[arg(short, long)]
        index: Option<usize>,
    },
    /// Run the pipeline over a saved HTML file
    Parse {
        file: PathBuf,
        /// Only the table at this index (default: every table)
        #[arg(short, long)]
        index: Option<usize>,
    },
}

#[derive(Serialize)]
struct DatasetEntry {
    name: &'static str,
    description: &'static str,
    url: String,
    selection: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::List => {
            let entries: Vec<DatasetEntry> = Dataset::ALL
                .iter()
                .map(|d| DatasetEntry {
                    name: d.name(),
                    description: d.description(),
                    url: d.url(&settings.base_url),
                    selection: match d.selection() {
                        Selection::All => "all".to_string(),
                        Selection::Index(i) => format!("index {}", i),
                    },
                })
                .collect();
            print_json(&entries, cli.pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Get { dataset } => {
            let service = Service::from_settings(&settings)?;
            let outcome = service.dataset(dataset).await;
            print_json(&outcome, cli.pretty)?;
            Ok(exit_code(&outcome))
        }
        Commands::All => {
            let service = Arc::new(Service::from_settings(&settings)?);
            let outcomes = run_all(service, &Dataset::ALL).await?;
            let ok = outcomes.iter().all(|(_, o)| o.is_success());
            let mut by_name = serde_json::Map::new();
            for (dataset, outcome) in outcomes {
                by_name.insert(dataset.name().to_string(), serde_json::to_value(outcome)?);
            }
            print_json(&by_name, cli.pretty)?;
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::from(2) })
        }
        Commands::Url { url, index } => {
            let service = Service::from_settings(&settings)?;
            let outcome = service.url(&url, selection(index)).await;
            print_json(&outcome, cli.pretty)?;
            Ok(exit_code(&outcome))
        }
        Commands::Parse { file, index } => {
            let body = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let service = Service::from_settings(&settings)?;
            let doc = Document::new(file.display().to_string(), None, body);
            let outcome: Outcome = service.pipeline().process(&doc, selection(index)).into();
            print_json(&outcome, cli.pretty)?;
            Ok(exit_code(&outcome))
        }
    }
}

/// One task per dataset. Results come back in the order given.
async fn run_all(service: Arc<Service>, datasets: &[Dataset]) -> anyhow::Result<Vec<(Dataset, Outcome)>> {
    let pb = ProgressBar::new(datasets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let handles: Vec<_> = datasets
        .iter()
        .copied()
        .map(|dataset| {
            let service = Arc::clone(&service);
            let pb = pb.clone();
            tokio::spawn(async move {
                let outcome = service.dataset(dataset).await;
                pb.set_message(dataset.name());
                pb.inc(1);
                (dataset, outcome)
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await?);
    }
    pb.finish_and_clear();
    Ok(outcomes)
}

fn selection(index: Option<usize>) -> Selection {
    index.map_or(Selection::All, Selection::Index)
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}
