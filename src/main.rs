use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vinoscout::config::Settings;
use vinoscout::core_state::AppState;
use vinoscout::db::repository::{get_source, upsert_source};
use vinoscout::db::sqlite::open_database;
use vinoscout::lexicon::WineLexicon;
use vinoscout::models::Source;
use vinoscout::pipeline::{Collaborators, Orchestrator, RunOptions};

#[derive(Parser)]
#[command(name = "vinoscout", version, about = "Supermarket-wine extraction from TikTok videos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server and the daily scheduler.
    Serve,
    /// Run the extraction pipeline over explicit post URLs or a
    /// registered source profile.
    Process {
        /// Post URLs to process.
        urls: Vec<String>,
        /// Read additional URLs from a file, one per line.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Run the URL list of a registered source instead; updates its
        /// counters like a scheduled run.
        #[arg(long, conflicts_with_all = ["urls", "file"])]
        source: Option<String>,
        /// Process at most this many URLs.
        #[arg(long)]
        limit: Option<usize>,
        /// Stop after extraction; persist nothing.
        #[arg(long)]
        dry_run: bool,
        /// Persist even for an already-processed URL, under a
        /// disambiguated URL.
        #[arg(long)]
        duplicate: bool,
    },
    /// Register or update a source profile for the daily batch run.
    AddSource {
        /// Profile handle, e.g. "wijnkoningin_tiktok".
        handle: String,
        /// Post URLs for the profile.
        urls: Vec<String>,
        /// Read additional URLs from a file, one per line.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Register without activating; the scheduler skips inactive
        /// sources.
        #[arg(long)]
        inactive: bool,
    },
}

/// Merge explicit URLs with the optional `--file` list.
fn collect_urls(
    mut urls: Vec<String>,
    file: Option<&PathBuf>,
) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)?;
        urls.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from),
        );
    }
    Ok(urls)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    vinoscout::init_tracing();
    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Command::Serve => {
            let db = open_database(&settings.database_path())?;
            let lexicon = WineLexicon::from_settings(&settings);
            let state = AppState::new(db, settings, lexicon);
            vinoscout::api::serve(state).await?;
        }
        Command::Process {
            urls,
            file,
            source,
            limit,
            dry_run,
            duplicate,
        } => {
            let options = RunOptions {
                dry_run,
                allow_duplicate: duplicate,
            };

            let summary = tokio::task::spawn_blocking(move || {
                let conn = open_database(&settings.database_path())?;
                let lexicon = WineLexicon::from_settings(&settings);
                let orchestrator = Orchestrator::new(
                    Collaborators::from_settings(&settings),
                    &lexicon,
                    &settings,
                );

                let summary = if let Some(handle) = source {
                    let registered = get_source(&conn, &handle)?.ok_or_else(|| {
                        format!("unknown source: {handle}; register it with add-source")
                    })?;
                    orchestrator.run_sources(&conn, &[registered], &options, None)
                } else {
                    let mut urls = collect_urls(urls, file.as_ref())?;
                    if urls.is_empty() {
                        return Err(
                            "no URLs given; pass them as arguments, via --file, or use --source"
                                .into(),
                        );
                    }
                    if let Some(limit) = limit {
                        urls.truncate(limit);
                    }
                    orchestrator.run_batch(&conn, &urls, "manual", &options, None)
                };
                Ok::<_, Box<dyn std::error::Error + Send + Sync>>(summary)
            })
            .await??;

            println!(
                "Processed {} URL(s): {} persisted, {} duplicates skipped, \
                 {} without wines, {} dry runs, {} failed",
                summary.attempted,
                summary.persisted,
                summary.skipped_duplicates,
                summary.no_wine,
                summary.dry_runs,
                summary.failed,
            );
        }
        Command::AddSource {
            handle,
            urls,
            file,
            inactive,
        } => {
            let urls = collect_urls(urls, file.as_ref())?;
            let mut source = Source::new(&handle, urls);
            source.is_active = !inactive;

            let conn = open_database(&settings.database_path())?;
            upsert_source(&conn, &source)?;
            println!(
                "Source '{}' registered with {} URL(s){}",
                source.handle,
                source.video_urls.len(),
                if source.is_active { "" } else { " (inactive)" },
            );
        }
    }

    Ok(())
}
