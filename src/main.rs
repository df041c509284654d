use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use bioseeker::ai::research::ResearchAssistant;
use bioseeker::collection::load_collection;
use bioseeker::config::Config;
use bioseeker::logging;
use bioseeker::record::{Publication, RawPublication};
use bioseeker::search::debounce::debounce;
use bioseeker::search::local::search_publications;
use bioseeker::search::{SearchEvent, SearchOutcome, SearchService};

#[derive(Parser)]
#[command(name = "bioseeker", version, about = "Space biology publication search")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog and allow-listed NASA sites
    Search {
        query: String,
        /// Skip every AI call (no external results, no overview)
        #[arg(long)]
        local_only: bool,
        /// Print the merged outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Extract search terms with AI and run a term-weighted search
    Enhance { query: String },
    /// AI analysis of the catalog publication best matching a title
    Analyze { title: String },
    /// Research-gap analysis for a topic
    Gaps { topic: String },
}

fn print_results(label: &str, results: &[Publication]) {
    println!("{} ({} results)", label, results.len());
    for (rank, r) in results.iter().enumerate() {
        println!(
            "{:>3}. [{}] {} ({})",
            rank + 1,
            r.origin.label(),
            r.title,
            r.link.as_deref().unwrap_or("#")
        );
        if !r.description.is_empty() {
            println!("     {}", r.description);
        }
    }
}

fn print_outcome(outcome: &SearchOutcome) {
    if let Some(summary) = &outcome.ai_summary {
        let heading = if summary.is_question { "Answer" } else { "Overview" };
        println!("\n{}:\n{}\n", heading, summary.summary);
    }
    print_results("Results", &outcome.results);
    println!(
        "\n{} local, {} external, {} ms{}",
        outcome.stats.local_count,
        outcome.stats.external_count,
        outcome.stats.search_time_ms,
        if outcome.stats.cached { " (cached)" } else { "" }
    );
}

/// Read stdin lines, debounce them and run each accepted query as a search.
/// A newer query cancels the external call of the one still running.
async fn interactive(service: Arc<SearchService>, publications: Arc<Vec<Publication>>, config: &Config) -> Result<()> {
    let (line_tx, line_rx) = mpsc::channel::<String>(64);
    let mut queries = debounce(line_rx, config.search.debounce());

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    eprintln!("Type a query (Ctrl-D to quit)");
    let mut running = Vec::new();
    while let Some(query) = queries.recv().await {
        if query.trim().is_empty() {
            continue;
        }
        let service = service.clone();
        let publications = publications.clone();
        running.push(tokio::spawn(async move {
            let (tx, mut rx) = mpsc::channel(4);
            let printer = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match event {
                        SearchEvent::Local(local) => print_results("Local matches", &local),
                        SearchEvent::Merged(outcome) if outcome.superseded => {
                            tracing::debug!(query = %outcome.query, "Superseded by a newer query");
                        }
                        SearchEvent::Merged(outcome) => print_outcome(&outcome),
                    }
                }
            });
            if let Err(e) = service.search(&query, &publications, Some(&tx)).await {
                eprintln!("{}", e);
            }
            drop(tx);
            let _ = printer.await;
        }));
        running.retain(|h| !h.is_finished());
    }

    for handle in running {
        let _ = handle.await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse CLI args
    let cli = Cli::parse();

    // 2. Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Config error (using defaults): {}", e);
        Config::default()
    });

    // 3. Initialize logging before any other output
    logging::init_logging(&config);

    // 4. Load the local collection; this is the only fatal failure
    let publications = Arc::new(load_collection(&config.collection).await?);

    let local_only = matches!(cli.command, Some(Commands::Search { local_only: true, .. }));
    let assistant = if local_only {
        ResearchAssistant::new(None, &config.ai)
    } else {
        ResearchAssistant::from_config(&config.ai)
    };
    let service = Arc::new(SearchService::new(assistant, &config.search));
    let cancel = CancellationToken::new();

    match cli.command {
        Some(Commands::Search { query, json, .. }) => {
            let outcome = service.search(&query, &publications, None).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
        }

        Some(Commands::Enhance { query }) => {
            let (enhanced, hits) = service.search_enhanced(&query, &publications).await?;
            println!("{}", serde_json::to_string_pretty(&enhanced)?);
            for hit in hits.iter().take(config.search.format_limit) {
                println!(
                    "{:>4}  {:<18} {}",
                    hit.score,
                    hit.tier.label(),
                    hit.publication.title
                );
            }
        }

        Some(Commands::Analyze { title }) => {
            let publication = search_publications(&publications, &title)
                .into_iter()
                .next()
                .unwrap_or_else(|| {
                    Publication::from_raw(RawPublication {
                        title: Some(title.clone()),
                        ..Default::default()
                    })
                });
            match service.assistant().analyze_publication(&publication, &cancel).await {
                Some(analysis) => {
                    println!("{}\n", publication.title);
                    println!("Summary:\n{}\n", analysis.summary);
                    if !analysis.findings.is_empty() {
                        println!("Key findings:\n{}\n", analysis.findings);
                    }
                    if !analysis.gaps.is_empty() {
                        println!("Research gaps:\n{}", analysis.gaps);
                    }
                }
                None => println!("AI analysis unavailable"),
            }
        }

        Some(Commands::Gaps { topic }) => {
            match service.assistant().analyze_research_gaps(&topic, &cancel).await {
                Some(gaps) => {
                    println!("{}", gaps.analysis);
                    for citation in &gaps.citations {
                        println!("  - {}", citation);
                    }
                }
                None => println!("AI gap analysis unavailable"),
            }
        }

        None => {
            tracing::info!(version = env!("CARGO_PKG_VERSION"), ai = service.assistant().is_enabled(), "bioseeker interactive mode");
            interactive(service, publications, &config).await?;
        }
    }

    Ok(())
}
