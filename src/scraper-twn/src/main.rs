use clap::{Parser, Subcommand, ValueEnum};
use core_twn::{NewsApiClient, PoliteDelay, TimeUnit, api_client::DEFAULT_HTTP_TIMEOUT_S, duration_from_env, setup_logging};
use data_model_twn::models::SourceWebsite;
use scraper_twn::{
    HttpPageFetcher, Scraper,
    process::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_PAGES},
    site_for,
};

#[derive(Parser)]
#[command(name = "scraper-twn")]
#[command(about = "Scrapes Taiwanese news sites into the ingestion API", long_about = None)]
struct ScraperCli {
    #[command(subcommand)]
    command: Commands,
    /// Which site to scrape.
    #[arg(short, long, value_enum)]
    site: Site,
    /// Listing category (TTV only, default 社會).
    #[arg(short, long)]
    category: Option<String>,
    /// Last listing page the list pass visits.
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES, value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: u32,
    /// Articles claimed per request in the fetch pass.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = clap::value_parser!(i64).range(1..=100))]
    batch_size: i64,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit the articles on the listing pages.
    List,
    /// Claim listed articles and store their content.
    Fetch,
    /// List, then fetch.
    Run,
}

#[derive(Clone, Copy, ValueEnum)]
enum Site {
    Ttv,
    Setn,
}

impl From<Site> for SourceWebsite {
    fn from(site: Site) -> Self {
        match site {
            Site::Ttv => SourceWebsite::Ttv,
            Site::Setn => SourceWebsite::Setn,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file., if it exists
    dotenvy::dotenv().ok();

    setup_logging("scraper_twn=info,core_twn=info");

    let cli = ScraperCli::parse();

    let api = NewsApiClient::from_env().unwrap_or_else(|e| panic!("Couldn't configure the API client: {}", e));
    let delay = PoliteDelay::from_env().unwrap_or_else(|e| panic!("Invalid scraper delay: {}", e));
    let timeout = duration_from_env(TimeUnit::Seconds, "HTTP_TIMEOUT_S", DEFAULT_HTTP_TIMEOUT_S)
        .unwrap_or_else(|e| panic!("{}", e));
    let fetcher = HttpPageFetcher::new(timeout).unwrap_or_else(|e| panic!("Failed to build HTTP client: {}", e));

    let source: SourceWebsite = cli.site.into();
    let site = site_for(source, cli.category.as_deref());
    tracing::info!("Scraping {} through {}", source.slug(), api.base_url());

    let scraper = Scraper::new(api, fetcher, site, delay);

    let result = match cli.command {
        Commands::List => scraper
            .list_pass(cli.max_pages)
            .await
            .map(|listed| tracing::info!("List pass done: {:?}", listed)),
        Commands::Fetch => scraper
            .fetch_pass(cli.batch_size)
            .await
            .map(|fetched| tracing::info!("Fetch pass done: {:?}", fetched)),
        Commands::Run => scraper
            .run(cli.max_pages, cli.batch_size)
            .await
            .map(|(listed, fetched)| tracing::info!("Run done: {:?}, {:?}", listed, fetched)),
    };

    if let Err(e) = result {
        tracing::error!("Scraper stopped: {}", e);
        std::process::exit(1);
    }
}
