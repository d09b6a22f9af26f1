use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bookshelf_client::{BookshelfClient, ClientError};
use bookshelf_core::insights::{filter_authors, read_share_percent, top_author};
use bookshelf_core::{
    AppConfig, Book, BookFilter, BookStatus, ExitCode, LibrarySummary,
    MonthlyTrend, NewBook, RatingBucket,
};
use bookshelf_server::{AppState, BookshelfServer};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "bookshelf",
    about = "Personal reading list: books read, books wanted, and what they add up to",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting BOOKSHELF_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Base URL of the backend, overriding `client.base_url`.
    #[arg(long, global = true)]
    api: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP backend.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },

    /// List books, optionally filtered.
    List {
        /// read | wishlist
        #[arg(long)]
        status: Option<BookStatus>,
        /// high | medium | low | unrated
        #[arg(long)]
        rating: Option<RatingBucket>,
        /// Exact author name.
        #[arg(long)]
        author: Option<String>,
        /// Case-insensitive match on title or author.
        #[arg(short, long, default_value = "")]
        query: String,
    },

    /// Add a book.
    Add {
        title: String,
        author: String,
        #[arg(long, default_value = "wishlist")]
        status: BookStatus,
        #[arg(long)]
        pages: Option<u32>,
        #[arg(long)]
        rating: Option<f64>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        cover: Option<String>,
    },

    /// Edit a book. Only the given fields change.
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        status: Option<BookStatus>,
        #[arg(long)]
        pages: Option<u32>,
        /// 0 clears the rating.
        #[arg(long)]
        rating: Option<f64>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        cover: Option<String>,
    },

    /// Delete a book.
    Delete {
        id: i64,
        #[arg(long)]
        confirm: bool,
    },

    /// Show reading statistics.
    Stats,

    /// Show the author index.
    Authors {
        /// Case-insensitive match on the author name.
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Search the external catalog.
    Lookup {
        query: String,
        /// Add the N-th hit (1-based) to the wishlist.
        #[arg(long)]
        add: Option<usize>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Get a specific config key.
    Get { key: String },
    /// Print the config file path.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    // ── Env var overrides ──────────────────────────────────────────────────
    let json_output = cli.json || std::env::var("BOOKSHELF_JSON").as_deref() == Ok("1");
    init_tracing(matches!(cli.command, Commands::Serve { .. }));

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => fail(json_output, start, e.exit_code(), "config_error", &e.to_string()),
    };
    if let Some(api) = cli.api {
        config.client.base_url = api;
    }

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let addr: SocketAddr = config
                .bind_address()
                .parse()
                .with_context(|| format!("invalid bind address: {}", config.bind_address()))?;

            let state = AppState::from_config(&config)?;
            BookshelfServer::new(Arc::new(state))
                .serve_until_ctrl_c(addr)
                .await?;
        }

        Commands::List { status, rating, author, query } => {
            let client = connect(&config)?;
            let books = or_exit(client.list_books(status).await, json_output, start);
            let filter = BookFilter { query, status, rating, author };
            let shown = filter.apply(&books);
            let summary = LibrarySummary::from_books(&books);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": shown, "total": shown.len(), "summary": summary },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if shown.is_empty() {
                println!("No books found. Use `bookshelf add` to add books.");
            } else {
                for book in &shown {
                    println!("{}", book_line(book));
                }
                println!(
                    "\n{} shown · {} read · {} wishlist · {} pages · avg rating {:.1}",
                    shown.len(),
                    summary.total_read,
                    summary.total_wishlist,
                    summary.total_pages,
                    summary.avg_rating,
                );
            }
        }

        Commands::Add { title, author, status, pages, rating, year, cover } => {
            let new_book = NewBook {
                title,
                author,
                status,
                cover_url: cover.unwrap_or_default(),
                year,
                rating,
                pages,
            };
            let client = connect(&config)?;
            let book = or_exit(client.create_book(&new_book).await, json_output, start);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":book,"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Added #{}: {} ({})", book.id, book.title, book.status);
            }
        }

        Commands::Update { id, title, author, status, pages, rating, year, cover } => {
            let client = connect(&config)?;
            let books = or_exit(client.list_books(None).await, json_output, start);
            let Some(mut book) = books.into_iter().find(|b| b.id == id) else {
                fail(json_output, start, ExitCode::NotFound, "not_found", &format!("Book not found: {id}"));
            };

            let mut changes = book.to_new_book();
            if let Some(t) = title { changes.title = t; }
            if let Some(a) = author { changes.author = a; }
            if let Some(s) = status { changes.status = s; }
            if let Some(p) = pages { changes.pages = Some(p); }
            if let Some(r) = rating { changes.rating = if r == 0.0 { None } else { Some(r) }; }
            if let Some(y) = year { changes.year = Some(y); }
            if let Some(c) = cover { changes.cover_url = c; }
            book.apply(changes);

            let updated = or_exit(client.update_book(&book).await, json_output, start);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":updated,"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Updated: {}", updated.title);
            }
        }

        Commands::Delete { id, confirm } => {
            if !confirm {
                fail(json_output, start, ExitCode::ConfirmRequired, "confirm_required", "Add --confirm to delete without prompt.");
            }
            let client = connect(&config)?;
            or_exit(client.delete_book(id).await, json_output, start);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"deleted":id},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Deleted: {id}");
            }
        }

        // ── Stats ──────────────────────────────────────────────────────────

        Commands::Stats => {
            let client = connect(&config)?;
            let stats = or_exit(client.statistics().await, json_output, start);
            let trend = MonthlyTrend::from_monthly(&stats.monthly);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "overall": stats.overall, "monthly": stats.monthly, "trend": trend },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                let overall = &stats.overall;
                println!("Reading statistics:");
                println!("  Read:        {} ({:.0}%)", overall.total_read, read_share_percent(overall));
                println!("  Wishlist:    {}", overall.total_wishlist);
                println!("  Pages read:  {}", overall.total_pages);
                println!("  Avg rating:  {:.1}", overall.avg_rating);

                if !stats.monthly.is_empty() {
                    println!("\nBy month:");
                    for month in &stats.monthly {
                        let width = (trend.bar_percent(month) / 5.0).round() as usize;
                        println!(
                            "  {}  {:<20}  {:>3} books  {:>6} pages",
                            month.label(),
                            "█".repeat(width),
                            month.books_count,
                            month.pages_count,
                        );
                    }
                    println!(
                        "\n  ~{:.1} books and ~{} pages per month",
                        trend.avg_books_per_month, trend.avg_pages_per_month
                    );
                }
            }
        }

        Commands::Authors { search } => {
            let client = connect(&config)?;
            let authors = or_exit(client.authors().await, json_output, start);
            let shown = filter_authors(&authors, &search);
            let top = top_author(&authors);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": shown, "total": authors.len(), "top_author": top },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if shown.is_empty() {
                println!("No authors found.");
            } else {
                if let Some(top) = top {
                    println!("Top author: {} ({} pages)\n", top.name, top.pages_read);
                }
                for author in &shown {
                    println!(
                        "{:<30}  {:>3} books  {:>6} pages  {}",
                        author.name,
                        author.books_count,
                        author.pages_read,
                        author.books.join(", "),
                    );
                }
            }
        }

        Commands::Lookup { query, add } => {
            let client = connect(&config)?;
            let found = or_exit(client.search_catalog(&query).await, json_output, start);

            let added = match add {
                None => None,
                Some(n) => {
                    let Some(hit) = n.checked_sub(1).and_then(|i| found.books.get(i)) else {
                        fail(json_output, start, ExitCode::InvalidArgs, "invalid_args", &format!("No result #{n} for: {query}"));
                    };
                    let book = hit.clone().into_new_book();
                    Some(or_exit(client.create_book(&book).await, json_output, start))
                }
            };
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": found.books, "total": found.total, "query": query, "added": added },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if found.books.is_empty() {
                println!("No results for: {query}");
            } else {
                for (i, hit) in found.books.iter().enumerate() {
                    let year = hit.year.map(|y| y.to_string()).unwrap_or_default();
                    println!("{:>2}. {:<40}  {:<25}  {year}", i + 1, hit.title, hit.author);
                }
                if let Some(book) = added {
                    println!("\nAdded #{} to wishlist: {}", book.id, book.title);
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::List => {
                    let kv = config.key_values();
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":kv,"meta":{"duration_ms":dur}}))?;
                    } else {
                        for (k, v) in &kv {
                            println!("{k} = {v}");
                        }
                    }
                }
                ConfigAction::Get { key } => {
                    let kv = config.key_values();
                    match kv.get(key.as_str()) {
                        Some(val) => {
                            if json_output {
                                print_json(&serde_json::json!({"status":"ok","data":{"key":key,"value":val},"meta":{"duration_ms":dur}}))?;
                            } else {
                                println!("{val}");
                            }
                        }
                        None => {
                            fail(json_output, start, ExitCode::NotFound, "not_found", &format!("Unknown config key: {key}"));
                        }
                    }
                }
                ConfigAction::Path => {
                    let path = AppConfig::config_path();
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path,"exists":path.exists()},"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(serving: bool) {
    let default = if serving {
        "bookshelf=info,tower_http=info"
    } else {
        "bookshelf=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn connect(config: &AppConfig) -> Result<BookshelfClient> {
    let client =
        BookshelfClient::from_config(&config.client).context("failed to build API client")?;
    let endpoints = client.endpoints();
    tracing::debug!(
        books = %endpoints.books,
        stats = %endpoints.stats,
        authors = %endpoints.authors,
        book_search = %endpoints.book_search,
        "using API endpoints"
    );
    Ok(client)
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn book_line(book: &Book) -> String {
    let rating = book.rating.map(|r| format!("★{r:.1}")).unwrap_or_default();
    let pages = book.pages.map(|p| format!("{p}p")).unwrap_or_default();
    format!(
        "{id:>4}  {status:<8}  {title:<40}  {author:<25}  {pages:>6}  {rating}",
        id = book.id,
        status = book.status.as_str(),
        title = book.title,
        author = book.author,
    )
}

fn exit_code_for(err: &ClientError) -> (ExitCode, &'static str) {
    match err.status().map(|s| s.as_u16()) {
        Some(404) => (ExitCode::NotFound, "not_found"),
        Some(400) => (ExitCode::InvalidArgs, "invalid_args"),
        Some(409) => (ExitCode::Conflict, "conflict"),
        _ => match err {
            ClientError::InvalidUrl { .. } => (ExitCode::InvalidArgs, "invalid_args"),
            _ => (ExitCode::NetworkError, "network_error"),
        },
    }
}

/// Unwraps an API result, or reports the failure and exits with its code.
fn or_exit<T>(result: Result<T, ClientError>, json_output: bool, start: Instant) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            let (code, kind) = exit_code_for(&err);
            fail(json_output, start, code, kind, &err.to_string())
        }
    }
}

fn fail(json_output: bool, start: Instant, code: ExitCode, kind: &str, message: &str) -> ! {
    if json_output {
        let dur = start.elapsed().as_millis();
        let _ = print_json(&serde_json::json!({"status":"error","error":kind,"message":message,"meta":{"duration_ms":dur}}));
    } else {
        eprintln!("{message}");
    }
    std::process::exit(code.code());
}
