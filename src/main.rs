use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use bookmark_categorizer::browsers::ChromiumBookmarkProvider;
use bookmark_categorizer::config::AppConfig;
use bookmark_categorizer::filter::CategoryFilter;
use bookmark_categorizer::index::IndexedBookmark;
use bookmark_categorizer::progress;
use bookmark_categorizer::report::CategoryReport;
use bookmark_categorizer::settings::Theme;
use bookmark_categorizer::storage::JsonFileStorage;
use bookmark_categorizer::transfer::export_filename;
use bookmark_categorizer::Session;

type CliSession = Session<ChromiumBookmarkProvider, JsonFileStorage>;

#[derive(Parser)]
#[command(name = "bookmark-categorizer")]
#[command(about = "Organize browser bookmarks into your own categories", long_about = None)]
#[command(version)]
struct Cli {
    /// Category store (JSON). Defaults to $BOOKMARK_CATEGORIES_STORE or ~/.bookmark-categories.json
    #[arg(long, global = true)]
    store: Option<String>,

    /// Chromium "Bookmarks" file. Defaults to $BOOKMARK_CATEGORIES_BOOKMARKS or the Chrome profile
    #[arg(long, global = true)]
    bookmarks: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List bookmarks with their categories
    List {
        /// Only show this category ("uncategorized" for bookmarks without one)
        #[arg(short, long)]
        category: Option<String>,

        /// Case-insensitive search over title, URL and category
        #[arg(short, long)]
        search: Option<String>,

        /// Number of pages to show
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Show every matching bookmark
        #[arg(long)]
        all: bool,
    },

    /// Show the categories and how many bookmarks each one holds
    Categories {
        /// Show counts for labels that are not in the category list
        #[arg(short, long)]
        detailed: bool,
    },

    /// Add a category at the end of the list
    AddCategory { name: String },

    /// Rename a category and every bookmark labelled with it
    RenameCategory { old: String, new: String },

    /// Delete a category; its bookmarks become uncategorized
    DeleteCategory {
        name: String,

        /// Skip confirmation prompts
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Put one bookmark into a category
    Assign { id: String, category: String },

    /// Put several bookmarks (comma-separated ids) into a category
    BatchAssign {
        #[arg(short, long)]
        ids: String,
        category: String,
    },

    /// Delete several bookmarks (comma-separated ids) from the browser
    BatchDelete {
        #[arg(short, long)]
        ids: String,

        /// Skip confirmation prompts
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Delete one bookmark from the browser
    Delete {
        id: String,

        /// Skip confirmation prompts
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Export categories, assignments and settings to JSON
    Export {
        /// Output file (default: bookmark-categories-<date>.json)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Replace categories, assignments and settings from an export file
    Import { file: String },

    /// Show or change settings
    Settings {
        /// light, dark or system
        #[arg(long)]
        theme: Option<Theme>,

        /// Bookmarks per page
        #[arg(long)]
        page_size: Option<usize>,
    },
}

fn confirm(prompt: &str) -> bool {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    io::stdout().flush().ok();

    let mut input = String::new();
    io::stdin().read_line(&mut input).ok();
    input.trim().eq_ignore_ascii_case("y")
}

fn parse_ids(ids: &str) -> Vec<String> {
    ids.split(',')
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

fn print_rows(rows: &[IndexedBookmark]) {
    for row in rows {
        println!("  [{}] {} | {} ({})", row.category, row.title(), row.url(), row.id());
    }
}

fn print_notifications(session: &mut CliSession) {
    for notification in session.take_notifications() {
        if notification.is_error() {
            eprintln!("❌ {}", notification.message);
        } else {
            eprintln!("✅ {}", notification.message);
        }
    }
}

fn select_ids(session: &mut CliSession, ids: &[String]) {
    session.toggle_batch_mode();
    for id in ids {
        session.toggle_selection(id);
    }
}

async fn run(command: Commands, session: &mut CliSession) -> Result<()> {
    match command {
        Commands::List { category, search, pages, all } => {
            session.select_category(CategoryFilter::from(category));
            session.search(search.as_deref().unwrap_or(""));

            if session.no_results() {
                println!("No matching bookmarks");
                return Ok(());
            }
            for _ in 1..pages.max(1) {
                if !session.has_more() {
                    break;
                }
                session.load_more();
            }
            while all && session.has_more() {
                session.load_more();
            }

            print_rows(session.rendered());
            println!(
                "\n📊 Showing {}/{} bookmarks{}",
                session.rendered().len(),
                session.filtered().len(),
                if session.has_more() { " (more available)" } else { "" }
            );
        }

        Commands::Categories { detailed } => {
            let report = CategoryReport::new(session.categories(), session.all_bookmarks());
            println!("{}", report.format(detailed));
        }

        Commands::AddCategory { name } => {
            if !session.add_category(&name).await? {
                info!("Category {:?} already exists", name);
            }
        }

        Commands::RenameCategory { old, new } => {
            if !session.rename_category(&old, &new).await? {
                info!("Nothing to rename");
            }
        }

        Commands::DeleteCategory { name, yes } => {
            if !yes && !confirm(&format!("Delete category \"{}\"?", name)) {
                info!("❌ Cancelled");
                return Ok(());
            }
            if !session.delete_category(&name).await? {
                info!("Category {:?} not found", name);
            }
        }

        Commands::Assign { id, category } => {
            session.assign(&id, &category).await?;
        }

        Commands::BatchAssign { ids, category } => {
            let ids = parse_ids(&ids);
            select_ids(session, &ids);
            if !session.batch_assign(&category).await? {
                info!("Nothing selected");
            }
        }

        Commands::BatchDelete { ids, yes } => {
            let ids = parse_ids(&ids);
            if !yes && !confirm(&format!("Delete the {} selected bookmarks?", ids.len())) {
                info!("❌ Cancelled");
                return Ok(());
            }
            select_ids(session, &ids);

            let pb = progress::create_spinner("Deleting bookmarks...");
            let report = session.batch_delete().await?;
            if report.failed.is_empty() {
                progress::finish_with_success(&pb, &format!("Deleted {} bookmarks", report.deleted.len()));
            } else {
                progress::finish_with_error(&pb, &format!("{} deletions failed", report.failed.len()));
                for (id, reason) in &report.failed {
                    eprintln!("  • {}: {}", id, reason);
                }
            }
        }

        Commands::Delete { id, yes } => {
            if !yes && !confirm("Delete this bookmark?") {
                info!("❌ Cancelled");
                return Ok(());
            }
            session.delete_bookmark(&id).await?;
        }

        Commands::Export { output } => {
            let now = chrono::Utc::now();
            let document = session.export(now).await?;
            let path = output.unwrap_or_else(|| export_filename(now));
            tokio::fs::write(&path, document.to_json()?)
                .await
                .with_context(|| format!("Failed to write {}", path))?;
            info!("📤 Exported to {}", path);
        }

        Commands::Import { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file))?;
            session.import_json(&text).await?;
        }

        Commands::Settings { theme, page_size } => {
            if let Some(theme) = theme {
                session.set_theme(theme).await?;
            }
            if let Some(page_size) = page_size {
                session.set_page_size(page_size).await?;
            }
            let settings = session.settings();
            println!("theme: {}", settings.theme);
            println!("pageSize: {}", settings.page_size);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().with_overrides(cli.store.as_deref(), cli.bookmarks.as_deref());
    info!("📚 Bookmarks: {:?}", config.bookmarks_path);
    info!("🗂️  Store: {:?}", config.store_path);

    let mut session = Session::with_notification_ttl(
        ChromiumBookmarkProvider::new(&config.bookmarks_path),
        JsonFileStorage::new(&config.store_path),
        config.notification_ttl,
    );

    let loaded = session.reload().await;
    if loaded.is_err() {
        print_notifications(&mut session);
    }
    loaded.context("Failed to load bookmarks")?;

    let result = run(cli.command, &mut session).await;
    print_notifications(&mut session);
    result
}
