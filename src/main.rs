//! # Trigram Search CLI (`tgs`)
//!
//! ```bash
//! tgs --config ./config/tgs.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tgs init` | Provision extension, tables, materialized view, and indexes |
//! | `tgs ddl` | Print the provisioning DDL without running it |
//! | `tgs add-author` | Insert an author |
//! | `tgs add-article` | Insert an article |
//! | `tgs search "<term>"` | Fuzzy search articles or the full-search view |
//! | `tgs refresh` | Refresh the full-search materialized view |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use trigram_search::config::{self, Config};
use trigram_search::models::{Article, Author, Catalog};
use trigram_search::search::{SearchArgs, SearchTarget};
use trigram_search::{db, ingest, migrate, search};

/// Trigram fuzzy search over PostgreSQL tables and materialized views.
#[derive(Parser)]
#[command(
    name = "tgs",
    about = "Trigram fuzzy search over PostgreSQL tables and materialized views",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tgs.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision the schema.
    ///
    /// Creates the pg_trgm extension, the authors and articles tables, the
    /// full-search materialized view, and both trigram indexes. Idempotent.
    Init,

    /// Print the provisioning DDL.
    Ddl {
        /// Print teardown statements instead.
        #[arg(long)]
        drop: bool,
    },

    /// Insert an author.
    AddAuthor {
        username: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Refresh the full-search view afterwards, in the same session.
        #[arg(long)]
        refresh: bool,
    },

    /// Insert an article.
    AddArticle {
        /// UUID of an existing author.
        author_id: Uuid,
        title: String,
        #[arg(long)]
        body: Option<String>,
        /// Refresh the full-search view afterwards, in the same session.
        #[arg(long)]
        refresh: bool,
    },

    /// Fuzzy search.
    Search {
        /// The search term.
        term: String,

        /// `articles` searches article title and body; `full` searches the
        /// authors-and-articles materialized view.
        #[arg(long, value_enum, default_value = "articles")]
        target: SearchTarget,

        /// Session similarity threshold, overriding the configured one.
        #[arg(long)]
        threshold: Option<f64>,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<u32>,

        /// Do not order by similarity.
        #[arg(long)]
        no_order: bool,

        /// Print the similarity score of each row.
        #[arg(long)]
        scores: bool,
    },

    /// Refresh the full-search materialized view.
    Refresh {
        /// Do not block readers. Needs a unique index on the view.
        #[arg(long)]
        concurrently: bool,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    init_logging(&cfg);

    let catalog = Catalog::new(cfg.search.similarity_threshold)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool, &catalog).await?;
            pool.close().await;
            println!("Schema initialized.");
        }
        Commands::Ddl { drop } => {
            let statements = if drop {
                migrate::teardown_statements(&catalog)
            } else {
                migrate::provisioning_statements(&catalog)
            };
            for statement in statements {
                println!("{statement};");
            }
        }
        Commands::AddAuthor {
            username,
            first_name,
            last_name,
            refresh,
        } => {
            let author = Author {
                first_name,
                last_name,
                ..Author::new(username)
            };
            ingest::run_add_author(&cfg, &catalog, &author, refresh).await?;
        }
        Commands::AddArticle {
            author_id,
            title,
            body,
            refresh,
        } => {
            let article = Article::new(author_id, title, body);
            ingest::run_add_article(&cfg, &catalog, &article, refresh).await?;
        }
        Commands::Search {
            term,
            target,
            threshold,
            limit,
            no_order,
            scores,
        } => {
            let args = SearchArgs {
                term,
                target,
                threshold,
                limit,
                order: !no_order,
                include_score: scores,
            };
            search::run_search(&cfg, &catalog, &args).await?;
        }
        Commands::Refresh { concurrently } => {
            search::run_refresh(&cfg, &catalog, concurrently).await?;
        }
    }

    Ok(())
}
