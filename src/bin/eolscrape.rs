use std::path::PathBuf;
use std::process;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use eolscrape::output::{self, DEFAULT_PREFIX, Format};
use eolscrape::utils::ScrapeStats;
use eolscrape::{PageUrlStrategy, ScraperConfig, VendorId, WebScraper};
use log::LevelFilter;

const PREVIEW_RECORDS: usize = 5;

#[derive(Parser)]
#[command(name = "eolscrape")]
#[command(about = "A relutech.com EOL/EOSL listing scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(long, global = true, help = "Sitemap used to discover vendors")]
    sitemap_url: Option<String>,

    #[arg(long, global = true, help = "Listing root that vendor ids are appended to")]
    base_url: Option<String>,

    #[arg(
        long,
        global = true,
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..=20),
        help = "Per-request timeout in seconds"
    )]
    timeout: u64,

    #[arg(long, global = true, help = "Skip TLS certificate verification")]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
enum FileFormat {
    Csv,
    Json,
}

impl From<FileFormat> for Format {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Csv => Format::Csv,
            FileFormat::Json => Format::Json,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum PageStyle {
    /// `{vendor}?page=N`
    Query,
    /// `{vendor}/page/N`
    Path,
}

#[derive(Subcommand)]
enum Commands {
    /// List the vendor listings found in the sitemap
    Vendors {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Scrape, normalize and save EOL/EOSL records
    Scrape {
        #[arg(
            long = "vendor",
            value_parser = parse_vendor,
            help = "Vendor to scrape (repeatable); defaults to every discovered vendor"
        )]
        vendors: Vec<VendorId>,

        #[arg(
            long,
            default_value_t = 100,
            value_parser = clap::value_parser!(u32).range(1..),
            help = "Maximum number of pages to fetch per vendor"
        )]
        max_pages: u32,

        #[arg(
            short = 'f',
            long = "format",
            value_enum,
            default_value = "csv",
            help = "Output file format"
        )]
        format: FileFormat,

        #[arg(long, default_value = ".", help = "Directory for the timestamped output file")]
        output_dir: PathBuf,

        #[arg(short = 'o', long, help = "Explicit output path (overrides --output-dir)")]
        output: Option<PathBuf>,

        #[arg(
            long,
            value_enum,
            default_value = "query",
            help = "URL convention for pages after the first"
        )]
        page_style: PageStyle,
    },
}

fn parse_vendor(s: &str) -> Result<VendorId, String> {
    VendorId::new(s).map_err(|e| e.to_string())
}

fn build_config(cli: &Cli) -> ScraperConfig {
    let mut config = ScraperConfig::new()
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_verify_tls(!cli.insecure);
    if let Some(url) = &cli.sitemap_url {
        config = config.with_sitemap_url(url.clone());
    }
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url.clone());
    }
    config
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let mut config = build_config(&cli);

    match cli.command {
        Commands::Vendors { format } => {
            let scraper = WebScraper::with_config(config).unwrap_or_else(|e| {
                log::error!("Error creating scraper: {}", e);
                process::exit(1);
            });

            let vendors: Vec<VendorId> = scraper.discover_vendors().into_iter().collect();

            match format {
                OutputFormat::Json => match serde_json::to_string_pretty(&vendors) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        log::error!("Error serializing to JSON: {}", e);
                        process::exit(1);
                    }
                },
                OutputFormat::Text => {
                    for (i, vendor) in vendors.iter().enumerate() {
                        println!("{:>3}. {}", i + 1, vendor);
                    }
                }
            }
        }

        Commands::Scrape {
            vendors,
            max_pages,
            format,
            output_dir,
            output,
            page_style,
        } => {
            config = config.with_page_urls(match page_style {
                PageStyle::Query => PageUrlStrategy::Query("page".to_string()),
                PageStyle::Path => PageUrlStrategy::PathSegment("page".to_string()),
            });

            let scraper = WebScraper::with_config(config).unwrap_or_else(|e| {
                log::error!("Error creating scraper: {}", e);
                process::exit(1);
            });

            let vendors = (!vendors.is_empty()).then_some(vendors.as_slice());
            let records = scraper.scrape_all(vendors, max_pages);

            let format = Format::from(format);
            let path = output.unwrap_or_else(|| {
                output_dir.join(output::output_filename(DEFAULT_PREFIX, format, Utc::now()))
            });

            if let Err(e) = output::write_file(&records, &path, format) {
                log::error!("Error writing {}: {}", path.display(), e);
                process::exit(1);
            }

            if !records.is_empty() {
                println!("First {} records:", records.len().min(PREVIEW_RECORDS));
                for record in records.iter().take(PREVIEW_RECORDS) {
                    println!("  {}", record);
                }
                println!();
            }
            print!("{}", ScrapeStats::from_records(&records));
            println!("\nData saved to {}", path.display());
        }
    }
}
