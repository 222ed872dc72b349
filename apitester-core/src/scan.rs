use crate::config::AppConfig;
use crate::error::Result;
use crate::stats::ScanStatistics;
use apitester_scanner::{
    Candidate, Classifier, Extractor, ProbeCallback, ProbeEvent, ProbeResult, Prober,
};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Options for configuring a scan
pub struct ScanOptions {
    pub config: AppConfig,
    pub show_progress: bool,
}

/// Callback for reporting scan milestones
pub type ScanProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Everything a scan produced, in probe order
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub candidates: Vec<Candidate>,
    pub results: Vec<ProbeResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanOutcome {
    pub fn statistics(&self) -> ScanStatistics {
        ScanStatistics::from_results(&self.results)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

pub fn build_extractor(config: &AppConfig) -> Result<Extractor> {
    let classifier = Classifier::new(config.header_profile());
    let extractor =
        Extractor::new(classifier)?.with_blacklist(config.advanced.blacklist_domains.clone());
    Ok(extractor)
}

/// Run extraction only. Never touches the network.
pub fn extract_candidates(text: &str, config: &AppConfig) -> Result<Vec<Candidate>> {
    config.validate()?;
    let extractor = build_extractor(config)?;
    Ok(extractor.extract(text))
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Extract candidates from `text` and probe them one by one.
/// Configuration problems surface here, before any request is sent.
pub async fn execute_scan(
    text: &str,
    options: ScanOptions,
    progress_callback: Option<ScanProgressCallback>,
) -> Result<ScanOutcome> {
    let ScanOptions {
        config,
        show_progress,
    } = options;

    let probe_options = config.probe_options()?;
    let extractor = build_extractor(&config)?;
    let started_at = Utc::now();

    let candidates = extractor.extract(text);
    if let Some(ref callback) = progress_callback {
        callback(format!("Found {} API candidates", candidates.len()));
    }

    if candidates.is_empty() {
        info!("No API candidates found, nothing to probe");
        return Ok(ScanOutcome {
            candidates,
            results: Vec::new(),
            started_at,
            finished_at: Utc::now(),
        });
    }

    let mut prober = Prober::new(probe_options)?;

    let progress_bar = if show_progress {
        let pb = spinner();
        pb.set_message("Starting scan...");
        Some(pb)
    } else {
        None
    };

    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        let callback: ProbeCallback = Arc::new(move |event: &ProbeEvent| match event {
            ProbeEvent::Probing { index, total, url } => {
                pb_clone.set_message(format!("Testing API {}/{}: {}", index + 1, total, url));
            }
            ProbeEvent::Finished(result) => {
                let mark = if result.success { "✓" } else { "✗" };
                pb_clone.println(format!(
                    "  {} {} {} [{}]",
                    mark, result.method, result.url, result.status_code
                ));
            }
            ProbeEvent::Pausing(delay) => {
                pb_clone.set_message(format!("Waiting {:.1}s...", delay.as_secs_f64()));
            }
        });
        prober = prober.with_progress_callback(callback);
    }

    let results = prober.probe_all(&candidates).await;

    if let Some(ref pb) = progress_bar {
        let successful = results.iter().filter(|r| r.success).count();
        pb.finish_with_message(format!(
            "Scan complete! {}/{} APIs responded successfully",
            successful,
            results.len()
        ));
    }

    Ok(ScanOutcome {
        candidates,
        results,
        started_at,
        finished_at: Utc::now(),
    })
}
