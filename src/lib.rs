pub mod config;
pub mod extractor;
pub mod fetch;
pub mod normalize;
pub mod output;
mod parser;
pub mod scraper;
pub mod types;
pub mod utils;

pub use config::{PageUrlStrategy, ScraperConfig};
pub use fetch::{Fetch, FetchError, HttpFetcher};
pub use normalize::{normalize, parse_date};
pub use parser::ListingTable;
pub use scraper::{ScraperError, WebScraper};
pub use types::{EolRecord, RawRow, VendorId};

pub(crate) const SITEMAP_URL: &str = "https://relutech.com/sitemap-1.xml";
pub(crate) const BASE_URL: &str = "https://relutech.com/eol-eosl/";

pub(crate) const FALLBACK_VENDORS: &[&str] = &[
    "cisco",
    "dell",
    "emc",
    "emc-ecomm",
    "hpe",
    "ibm",
    "juniper",
    "netapp-ecomm",
    "nimble",
    "sun-oracle",
];
