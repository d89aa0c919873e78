mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use searchengine::activity::LogIndicator;
use searchengine::config::Config;
use searchengine::context::AppContext;
use searchengine::detail::BandDetail;
use searchengine::observability::init_tracing;
use searchengine::response::StderrAlerts;
use searchengine::search::{SearchController, SearchEvent};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

const SETTLE_POLL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_with_path(path)?,
        None => Config::load()?,
    };
    init_tracing(&config.telemetry.log_filter);

    let context = AppContext::build(config, Arc::new(LogIndicator), Arc::new(StderrAlerts))?;

    let outcome = match cli.command {
        Commands::Search { word } => search_once(&context, &word.join(" ")).await,
        Commands::Album { id } => {
            let band = context.detail_controller().band_for_album(id).await?;
            print_band(&band);
            Ok(())
        }
        Commands::Band { id } => {
            let band = context.detail_controller().band(id).await?;
            print_band(&band);
            Ok(())
        }
        Commands::History => {
            print_results(&context.results.results());
            Ok(())
        }
        Commands::Interactive => interactive(&context).await,
    };

    context.persist()?;
    info!(metrics = ?context.metrics.snapshot(), "Exiting");
    outcome
}

async fn search_once(context: &AppContext, query: &str) -> Result<(), AnyError> {
    let controller = context.search_controller();
    match controller.run_search(query).await {
        SearchEvent::Completed { .. } => {
            print_results(&controller.results());
            Ok(())
        }
        SearchEvent::Failed { reason, .. } => Err(reason.to_string().into()),
        SearchEvent::Stale { .. } => Ok(()),
    }
}

async fn interactive(context: &AppContext) -> Result<(), AnyError> {
    let controller = context.search_controller();
    let mut events = controller.subscribe();

    let printer = {
        let store = controller.store().clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SearchEvent::Completed { query, count, .. }) => {
                        println!("# {} ({} results)", query, count);
                        print_results(&store.results());
                    }
                    Ok(SearchEvent::Failed { query, reason, .. }) => {
                        eprintln!("# {} failed: {}", query, reason);
                    }
                    Ok(SearchEvent::Stale { .. }) => {}
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Dropped search events"),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(text) => controller.on_text_changed(&text),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                controller.on_text_changed("");
                break;
            }
        }
    }

    settle(&controller).await;
    drop(controller);

    if let Err(e) = printer.await {
        warn!(error = %e, "Result printer stopped unexpectedly");
    }
    Ok(())
}

/// Wait for the last scheduled search to finish
async fn settle(controller: &SearchController) {
    while !controller.is_idle() {
        tokio::time::sleep(SETTLE_POLL).await;
    }
}

fn print_results(results: &[Value]) {
    for result in results {
        println!("{}", result);
    }
}

fn print_band(band: &BandDetail) {
    println!("band {}", band.band_id);
    for (label, value) in [
        ("genre", band.genre()),
        ("country", band.country()),
        ("active", band.years_active()),
    ] {
        if let Some(value) = value {
            println!("  {}: {}", label, value);
        }
    }
    if let Some(photo) = &band.photo {
        println!("  photo: {}", photo);
    }

    for release in &band.discography {
        println!(
            "  - {} ({}, {})",
            text_of(release, "title"),
            text_of(release, "type"),
            text_of(release, "year")
        );
    }
}

fn text_of(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => "?".to_string(),
        Some(other) => other.to_string(),
    }
}
