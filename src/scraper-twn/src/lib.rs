pub mod errors;
pub mod fetcher;
pub mod process;
pub mod sites;

pub use errors::Error;
pub use fetcher::{FixturePageFetcher, HttpPageFetcher, PageFetcher};
pub use process::{FetchSummary, ListSummary, Scraper};
pub use sites::{NewsSite, Setn, Ttv, site_for};
