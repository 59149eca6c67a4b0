use std::collections::BTreeSet;

use url::Url;

use crate::config::ScraperConfig;
use crate::extractor::extract_rows;
use crate::fetch::{Fetch, FetchError, HttpFetcher};
use crate::normalize::normalize;
use crate::parser::{ListingTable, ParseError, parse_listing_table, parse_sitemap_vendors};
use crate::types::{EolRecord, RawRow, VendorId};

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("Fetch failed: {0}")]
    FetchError(#[from] FetchError),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Invalid listing URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("Sitemap lists no vendors under {0}")]
    NoVendors(String),
}

#[derive(Debug, Clone)]
pub struct WebScraper<F = HttpFetcher> {
    fetcher: F,
    config: ScraperConfig,
}

impl WebScraper<HttpFetcher> {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_config(ScraperConfig::default())
    }

    pub fn with_config(config: ScraperConfig) -> Result<Self, ScraperError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self { fetcher, config })
    }
}

impl<F: Fetch> WebScraper<F> {
    pub fn with_fetcher(fetcher: F, config: ScraperConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Vendor ids listed in the sitemap, or the configured fallback list when the
    /// sitemap cannot be fetched, is not XML, or names no vendors.
    pub fn discover_vendors(&self) -> BTreeSet<VendorId> {
        log::info!("Fetching sitemap {}...", self.config.sitemap_url);

        match self.fetch_sitemap_vendors() {
            Ok(vendors) => {
                log::info!("Discovered {} vendor(s) from sitemap", vendors.len());
                vendors
            }
            Err(e) => {
                log::warn!("Failed to discover vendors ({}). Using fallback vendor list.", e);
                self.fallback_vendors()
            }
        }
    }

    fn fetch_sitemap_vendors(&self) -> Result<BTreeSet<VendorId>, ScraperError> {
        let xml = self.fetcher.fetch(&self.config.sitemap_url)?;
        let base_path = self.config.base_path();
        let vendors = parse_sitemap_vendors(&xml, &base_path)?;
        if vendors.is_empty() {
            return Err(ScraperError::NoVendors(base_path));
        }
        Ok(vendors)
    }

    fn fallback_vendors(&self) -> BTreeSet<VendorId> {
        self.config
            .fallback_vendors
            .iter()
            .filter_map(|v| {
                VendorId::new(v)
                    .inspect_err(|e| log::warn!("Skipping fallback vendor: {}", e))
                    .ok()
            })
            .collect()
    }

    pub fn vendor_url(&self, vendor: &VendorId) -> Result<Url, ScraperError> {
        let invalid = |source| ScraperError::InvalidUrl {
            url: format!("{}{}", self.config.base_url, vendor),
            source,
        };
        let mut url = Url::parse(&self.config.base_url).map_err(invalid)?;
        url.path_segments_mut()
            .map_err(|()| invalid(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(vendor.as_str());
        Ok(url)
    }

    /// Lazily walks a vendor's listing pages, one fetched page at a time.
    pub fn paginate(
        &self,
        vendor: &VendorId,
        max_pages: u32,
    ) -> Result<Paginator<'_, F>, ScraperError> {
        Ok(Paginator {
            scraper: self,
            vendor: vendor.clone(),
            vendor_url: self.vendor_url(vendor)?,
            next_page: 1,
            max_pages,
            done: false,
        })
    }

    pub fn vendor_rows(
        &self,
        vendor: &VendorId,
        max_pages: u32,
    ) -> Result<Vec<RawRow>, ScraperError> {
        log::info!("Scraping vendor: {} ({})", vendor, self.vendor_url(vendor)?);

        Ok(self
            .paginate(vendor, max_pages)?
            .flat_map(|table| extract_rows(&table, vendor))
            .collect())
    }

    pub fn scrape_vendor(
        &self,
        vendor: &VendorId,
        max_pages: u32,
    ) -> Result<Vec<EolRecord>, ScraperError> {
        let rows = self.vendor_rows(vendor, max_pages)?;
        Ok(normalize(&rows))
    }

    /// Scrapes every vendor (discovered when `vendors` is `None`) and merges the
    /// combined rows. A vendor that fails is logged and skipped.
    pub fn scrape_all(&self, vendors: Option<&[VendorId]>, max_pages: u32) -> Vec<EolRecord> {
        let vendors: Vec<VendorId> = match vendors {
            Some(vendors) => vendors.to_vec(),
            None => self.discover_vendors().into_iter().collect(),
        };

        log::info!(
            "Found {} vendors: {}",
            vendors.len(),
            vendors
                .iter()
                .map(VendorId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let rows = vendors.iter().fold(Vec::new(), |mut rows, vendor| {
            match self.vendor_rows(vendor, max_pages) {
                Ok(scraped) if scraped.is_empty() => log::warn!("No data found for {}", vendor),
                Ok(scraped) => {
                    log::info!("Scraped {} rows for {}", scraped.len(), vendor);
                    rows.extend(scraped);
                }
                Err(e) => log::error!("Error scraping {}: {}", vendor, e),
            }
            rows
        });

        let records = normalize(&rows);
        log::info!(
            "Merged {} scraped rows into {} records",
            rows.len(),
            records.len()
        );
        records
    }
}

/// Iterator over the listing tables of one vendor.
///
/// Stops at `max_pages`, on the first failed fetch, or on the first page without a
/// non-empty listing table. Nothing is requested after it stops.
pub struct Paginator<'a, F> {
    scraper: &'a WebScraper<F>,
    vendor: VendorId,
    vendor_url: Url,
    next_page: u32,
    max_pages: u32,
    done: bool,
}

impl<F: Fetch> Iterator for Paginator<'_, F> {
    type Item = ListingTable;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next_page > self.max_pages {
            self.done = true;
            return None;
        }

        let page = self.next_page;
        let url = self.scraper.config.page_urls.page_url(&self.vendor_url, page);

        let html = match self.scraper.fetcher.fetch(url.as_str()) {
            Ok(html) => html,
            Err(e) => {
                log::warn!("Stopping {} at page {}: {}", self.vendor, page, e);
                self.done = true;
                return None;
            }
        };

        match parse_listing_table(&html) {
            Some(table) if !table.is_empty() => {
                log::info!("Page {} fetched for {}", page, self.vendor);
                self.next_page += 1;
                Some(table)
            }
            Some(_) => {
                log::debug!("Page {} for {} has an empty table", page, self.vendor);
                self.done = true;
                None
            }
            None => {
                log::debug!("Page {} for {} has no listing table", page, self.vendor);
                self.done = true;
                None
            }
        }
    }
}
