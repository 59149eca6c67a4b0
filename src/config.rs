use std::time::Duration;

use url::Url;

/// Upper bound for a single page or sitemap request.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(20);

/// How listing URLs for pages 2 and onwards are built from the vendor URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageUrlStrategy {
    /// `{vendor_url}?{param}=N`
    Query(String),
    /// `{vendor_url}/{segment}/N`
    PathSegment(String),
}

impl PageUrlStrategy {
    pub fn page_url(&self, vendor_url: &Url, page: u32) -> Url {
        if page <= 1 {
            return vendor_url.clone();
        }
        let mut url = vendor_url.clone();
        match self {
            PageUrlStrategy::Query(param) => {
                url.query_pairs_mut().append_pair(param, &page.to_string());
            }
            PageUrlStrategy::PathSegment(segment) => {
                let path = format!(
                    "{}/{}/{}",
                    vendor_url.path().trim_end_matches('/'),
                    segment,
                    page
                );
                url.set_path(&path);
            }
        }
        url
    }
}

impl Default for PageUrlStrategy {
    fn default() -> Self {
        PageUrlStrategy::Query("page".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub sitemap_url: String,
    pub base_url: String,
    pub timeout: Duration,
    pub verify_tls: bool,
    pub page_urls: PageUrlStrategy,
    pub fallback_vendors: Vec<String>,
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self {
            sitemap_url: crate::SITEMAP_URL.to_string(),
            base_url: crate::BASE_URL.to_string(),
            timeout: MAX_TIMEOUT,
            verify_tls: true,
            page_urls: PageUrlStrategy::default(),
            fallback_vendors: crate::FALLBACK_VENDORS
                .iter()
                .map(|v| v.to_string())
                .collect(),
        }
    }

    pub fn with_sitemap_url(mut self, url: impl Into<String>) -> Self {
        self.sitemap_url = url.into();
        self
    }

    /// The listing root; vendor ids are appended to it, so a trailing `/` is enforced.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.base_url = url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.min(MAX_TIMEOUT);
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_page_urls(mut self, strategy: PageUrlStrategy) -> Self {
        self.page_urls = strategy;
        self
    }

    pub fn with_fallback_vendors(mut self, vendors: Vec<String>) -> Self {
        self.fallback_vendors = vendors;
        self
    }

    /// Path of the listing root (e.g. `/eol-eosl/`), used to pick vendor URLs out of the sitemap.
    pub fn base_path(&self) -> String {
        Url::parse(&self.base_url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| self.base_url.clone())
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor_url() -> Url {
        Url::parse("https://relutech.com/eol-eosl/cisco").unwrap()
    }

    #[test]
    fn test_first_page_is_bare_vendor_url() {
        let strategy = PageUrlStrategy::default();
        assert_eq!(
            strategy.page_url(&vendor_url(), 1).as_str(),
            "https://relutech.com/eol-eosl/cisco"
        );
    }

    #[test]
    fn test_query_page_urls() {
        let strategy = PageUrlStrategy::Query("page".to_string());
        assert_eq!(
            strategy.page_url(&vendor_url(), 3).as_str(),
            "https://relutech.com/eol-eosl/cisco?page=3"
        );
    }

    #[test]
    fn test_path_segment_page_urls() {
        let strategy = PageUrlStrategy::PathSegment("page".to_string());
        assert_eq!(
            strategy.page_url(&vendor_url(), 2).as_str(),
            "https://relutech.com/eol-eosl/cisco/page/2"
        );
    }

    #[test]
    fn test_timeout_is_capped() {
        let config = ScraperConfig::new().with_timeout(Duration::from_secs(90));
        assert_eq!(config.timeout, MAX_TIMEOUT);

        let config = ScraperConfig::new().with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ScraperConfig::new().with_base_url("http://localhost:8080/eol-eosl");
        assert_eq!(config.base_url, "http://localhost:8080/eol-eosl/");
        assert_eq!(config.base_path(), "/eol-eosl/");
    }

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert!(config.verify_tls);
        assert_eq!(config.base_path(), "/eol-eosl/");
        assert_eq!(config.fallback_vendors.len(), 10);
        assert_eq!(config.page_urls, PageUrlStrategy::Query("page".to_string()));
    }
}
