use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tvdash::{
    DEFAULT_BASE_URL, Show, ShowsStore, TvDashError, TvMazeClient, format_rating, group_by_genre,
    load_index, open_index_cache, show_count_label, strip_summary,
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Base URL of the show index API
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Directory for the index cache (defaults to the platform cache directory)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List shows from the index, grouped by genre and sorted by rating
    Dashboard {
        /// Index pages to load, comma separated
        #[arg(long, value_delimiter = ',', default_value = "0")]
        pages: Vec<u32>,

        /// Only show this genre
        #[arg(long)]
        genre: Option<String>,

        /// Maximum number of shows listed per genre
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Show details for a single show
    Show {
        /// TVMaze show identifier
        id: u32,

        /// Index pages to look in before asking the API directly
        #[arg(long, value_delimiter = ',', default_value = "0")]
        pages: Vec<u32>,
    },

    /// Search shows by name
    Search {
        /// Name (or part of it) to search for
        query: String,
    },
}

/// One listing line: rating pill followed by the show name
fn format_show_line(show: &Show) -> String {
    format!("  [{:>4}] {}", format_rating(show.rating.average), show.name)
}

fn print_dashboard(shows: &[Show], genre_filter: Option<&str>, limit: usize) {
    let buckets = group_by_genre(shows);

    if buckets.is_empty() {
        println!("No shows loaded.");
        return;
    }

    let mut printed = 0;
    for (genre, bucket) in &buckets {
        if genre_filter.is_some_and(|filter| !filter.eq_ignore_ascii_case(genre)) {
            continue;
        }

        println!("{} ({})", genre, show_count_label(bucket.len()));
        for show in bucket.iter().take(limit) {
            println!("{}", format_show_line(show));
        }
        println!();
        printed += 1;
    }

    if printed == 0 {
        println!("No shows found for genre '{}'.", genre_filter.unwrap_or_default());
    }
}

fn print_show_details(show: &Show) {
    println!("{} (#{})", show.name, show.id);
    println!("  Rating:    {}", format_rating(show.rating.average));

    if !show.genres.is_empty() {
        println!("  Genres:    {}", show.genres.join(", "));
    }
    if let Some(kind) = &show.kind {
        println!("  Type:      {}", kind);
    }
    if let Some(language) = &show.language {
        println!("  Language:  {}", language);
    }
    if let Some(status) = &show.status {
        println!("  Status:    {}", status);
    }
    if let Some(runtime) = show.runtime {
        println!("  Runtime:   {} min", runtime);
    }
    if let Some(premiered) = &show.premiered {
        println!("  Premiered: {}", premiered);
    }
    if let Some(site) = &show.official_site {
        println!("  Website:   {}", site);
    }

    let summary = strip_summary(show.summary.as_deref());
    if !summary.is_empty() {
        println!("\n{}", summary);
    }
}

fn print_search_results(shows: &[Show]) {
    if shows.is_empty() {
        println!("No results.");
        return;
    }

    for show in shows {
        println!("{}  (#{})", format_show_line(show), show.id);
    }
}

fn run(cli: Cli) -> Result<(), TvDashError> {
    let client = TvMazeClient::with_base_url(&cli.base_url);

    let mut store = match open_index_cache(cli.cache_dir.as_deref()) {
        Ok(cache) => ShowsStore::new(client, cache),
        Err(e) => {
            tracing::warn!(error = %e, "index cache unavailable, continuing without it");
            ShowsStore::without_cache(client)
        }
    };

    match cli.command {
        Command::Dashboard {
            pages,
            genre,
            limit,
        } => {
            load_index(&mut store, &pages)?;
            print_dashboard(store.shows(), genre.as_deref(), limit);
        }
        Command::Show { id, pages } => {
            // A failed index load only means the lookup goes to the API
            if let Err(e) = load_index(&mut store, &pages) {
                tracing::warn!(error = %e, "continuing without the show index");
            }
            let show = store.get_show_details(id)?;
            print_show_details(&show);
        }
        Command::Search { query } => {
            let results = store.search_remote(&query)?;
            print_search_results(&results);
        }
    }

    Ok(())
}

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tvdash::Rating;

    fn show(name: &str, rating: Option<f64>) -> Show {
        Show {
            id: 1,
            name: name.to_string(),
            url: None,
            kind: None,
            language: None,
            genres: Vec::new(),
            status: None,
            runtime: None,
            premiered: None,
            official_site: None,
            rating: Rating { average: rating },
            image: None,
            summary: None,
        }
    }

    #[test]
    fn test_dashboard_defaults() {
        let cli = Cli::try_parse_from(["tvdash", "dashboard"]).unwrap();

        assert_eq!(cli.base_url, "https://api.tvmaze.com");
        assert!(cli.cache_dir.is_none());
        match cli.command {
            Command::Dashboard {
                pages,
                genre,
                limit,
            } => {
                assert_eq!(pages, vec![0]);
                assert!(genre.is_none());
                assert_eq!(limit, 10);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_dashboard_page_list() {
        let cli = Cli::try_parse_from(["tvdash", "dashboard", "--pages", "0,1,2"]).unwrap();

        match cli.command {
            Command::Dashboard { pages, .. } => assert_eq!(pages, vec![0, 1, 2]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tvdash",
            "show",
            "42",
            "--base-url",
            "http://localhost:8080",
            "--cache-dir",
            "/tmp/tvdash",
        ])
        .unwrap();

        assert_eq!(cli.base_url, "http://localhost:8080");
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/tvdash")));
        assert!(matches!(cli.command, Command::Show { id: 42, .. }));
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["tvdash", "episodes"]).is_err());
    }

    #[test]
    fn test_invalid_show_id_is_rejected() {
        assert!(Cli::try_parse_from(["tvdash", "show", "abc"]).is_err());
    }

    #[test]
    fn test_format_show_line() {
        assert_eq!(format_show_line(&show("Rated", Some(8.24))), "  [ 8.2] Rated");
        assert_eq!(format_show_line(&show("Unrated", None)), "  [ N/A] Unrated");
    }
}
