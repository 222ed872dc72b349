use colored::Colorize;

pub mod config;
pub mod error;
pub mod report;
pub mod scan;
pub mod stats;

pub use config::{AppConfig, ConfigError, ConfigOverrides};
pub use error::CoreError;
pub use scan::{ScanOptions, ScanOutcome, ScanProgressCallback, execute_scan, extract_candidates};
pub use stats::ScanStatistics;

pub fn print_banner() {
    let banner = r#"
    ▄▀█ █▀█ █ ▀█▀ █▀▀ █▀ ▀█▀ █▀▀ █▀█
    █▀█ █▀▀ █  █  ██▄ ▄█  █  ██▄ █▀▄
"#;
    eprintln!("{}", banner.cyan().bold());
    eprintln!(
        "    {} {}\n",
        "Endpoint extractor & prober".dimmed(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
