use clap::{Parser, Subcommand};
use movieflix_engine::{CatalogQuery, EngineConfig, MovieEngine, MovieRecord, SortKey};

#[derive(Parser)]
#[command(name = "movieflix-cli")]
#[command(about = "Movieflix engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database path (overrides DB_PATH)
    #[arg(short, long)]
    db: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one movie by IMDb ID
    Get {
        /// External ID, e.g. tt0113277
        id: String,
    },

    /// Search the upstream by title and cache every hit
    Search {
        /// Title query
        query: String,
    },

    /// Paginated query over the local catalog
    Query {
        /// Case-insensitive title substring
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long, default_value = "10")]
        limit: usize,

        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Sort field, prefix with '-' for descending (e.g. -year)
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,

        /// Genre to match, repeatable
        #[arg(short, long)]
        genre: Vec<String>,
    },

    /// Catalog statistics
    Stats,

    /// Delete records older than the cache TTL
    Evict,

    /// Export the catalog as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn movie_line(movie: &MovieRecord) -> String {
    format!("{}  {}", movie.external_id, movie.display_name())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let engine = MovieEngine::open(&config).await?;

    match cli.command {
        Commands::Get { id } => {
            let movie = engine.resolve_by_id(&id).await?;
            println!("{}", serde_json::to_string_pretty(&movie)?);
        }

        Commands::Search { query } => {
            println!("Searching for: {}", query);

            let movies = engine.search_by_title(&query).await?;
            for movie in &movies {
                println!("{}", movie_line(movie));
            }
            println!("\n{} movies cached", movies.len());
        }

        Commands::Query { search, limit, offset, sort, genre } => {
            let sort = match sort.as_deref() {
                Some(raw) => SortKey::parse(raw)?,
                None => None,
            };
            let query = CatalogQuery {
                search_term: search,
                limit,
                offset,
                sort,
                genre_filter: if genre.is_empty() { None } else { Some(genre) },
            };

            let page = engine.query(&query).await?;
            for movie in &page.items {
                println!("{}", movie_line(movie));
            }
            println!("\nShowing {} of {}", page.items.len(), page.total);
        }

        Commands::Stats => {
            let stats = engine.compute_stats().await?;

            println!("Catalog statistics:");
            match stats.average_rating {
                Some(rating) => println!("   Average rating: {:.2}", rating),
                None => println!("   Average rating: N/A"),
            }

            println!("   Genres:");
            for (genre, count) in &stats.genre_counts {
                println!("      {}: {}", genre, count);
            }

            println!("   Average runtime by year:");
            for entry in &stats.average_runtime_by_year {
                println!("      {}: {:.1} min", entry.year, entry.average_runtime);
            }
        }

        Commands::Evict => {
            println!("Evicting records older than {}h...", config.cache_ttl_hours);

            let deleted = engine.evict_expired().await?;

            println!("Deleted {} records", deleted);
        }

        Commands::Export { output } => {
            let csv = engine.export_csv().await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, csv).await?;
                    println!("Wrote {}", path);
                }
                None => print!("{}", csv),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_line_shows_year_once() {
        let mut movie = MovieRecord::new("tt0113277", "Heat");
        assert_eq!(movie_line(&movie), "tt0113277  Heat");

        movie.year = Some(1995);
        assert_eq!(movie_line(&movie), "tt0113277  Heat (1995)");
    }
}
