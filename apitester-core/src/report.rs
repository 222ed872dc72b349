// Report generation from scan outcomes

use crate::scan::ScanOutcome;
use apitester_scanner::{Candidate, ProbeResult};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const URL_DISPLAY_WIDTH: usize = 60;
const SUMMARY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
            ReportFormat::Markdown => "md",
        }
    }
}

pub fn generate_report(
    format: ReportFormat,
    outcome: &ScanOutcome,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(outcome)),
        ReportFormat::Json => generate_json_report(outcome),
        ReportFormat::Csv => Ok(generate_csv_report(&outcome.results)),
        ReportFormat::Markdown => Ok(generate_markdown_report(outcome)),
    }
}

pub fn generate_text_report(outcome: &ScanOutcome) -> String {
    let stats = outcome.statistics();
    let mut report = String::new();

    report.push_str(DIVIDER);
    report.push('\n');
    report.push_str("                           API SCAN RESULTS\n");
    report.push_str(DIVIDER);
    report.push_str("\n\n");

    report.push_str(&format!(
        "Scan Date:    {}\n",
        outcome.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!(
        "Duration:     {:.1} seconds\n",
        outcome.duration().num_milliseconds() as f64 / 1000.0
    ));
    report.push_str(&format!("Candidates:   {}\n", outcome.candidates.len()));
    report.push_str(&format!("Tested:       {}\n\n", stats.total));

    if outcome.results.is_empty() {
        report.push_str("No APIs were tested.\n");
        return report;
    }

    for result in &outcome.results {
        let mark = if result.success {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };

        report.push_str(&format!(
            "{} {:<7} {:<8} {} {}\n",
            mark,
            result.method.as_str().bold(),
            result.api_type.as_str(),
            colorize_status(result.status_code),
            shorten_url(&result.url, URL_DISPLAY_WIDTH)
        ));

        if let Some(ref error) = result.error {
            report.push_str(&format!("    {}\n", error.dimmed()));
        } else if result.success {
            let preview = preview(&result.response_summary, SUMMARY_PREVIEW_CHARS);
            for line in preview.lines() {
                report.push_str(&format!("    {}\n", line.dimmed()));
            }
        }
    }

    report.push('\n');
    report.push_str(DIVIDER);
    report.push_str("\n\n");
    report.push_str(&format!(
        "{} | {} | Success rate: {:.1}%\n",
        format!("✓ Successful: {}", stats.successful).green(),
        format!("✗ Failed: {}", stats.failed).red(),
        stats.success_rate
    ));

    if !stats.type_distribution.is_empty() {
        report.push_str("\nBy type:\n");
        for (api_type, count) in &stats.type_distribution {
            report.push_str(&format!("  {:<8} {}\n", api_type.as_str(), count));
        }
    }

    report
}

pub fn generate_json_report(outcome: &ScanOutcome) -> Result<String, serde_json::Error> {
    let stats = outcome.statistics();

    let results: Vec<serde_json::Value> = outcome.results.iter().map(result_to_json).collect();

    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "apitester",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "scan": {
                "started_at": outcome.started_at.to_rfc3339(),
                "finished_at": outcome.finished_at.to_rfc3339(),
                "duration_ms": outcome.duration().num_milliseconds(),
                "candidates_found": outcome.candidates.len()
            },
            "summary": stats,
            "results": results
        }
    });

    serde_json::to_string_pretty(&json_report)
}

fn result_to_json(result: &ProbeResult) -> serde_json::Value {
    serde_json::json!({
        "url": result.url,
        "method": result.method,
        "type": result.api_type,
        "success": result.success,
        "status_code": result.status_code,
        "size": result.size,
        "content_type": result.content_type,
        "response_time_ms": result.response_time.as_millis() as u64,
        "response_summary": result.response_summary,
        "error": result.error
    })
}

pub fn generate_csv_report(results: &[ProbeResult]) -> String {
    let mut csv = String::from(
        "url,method,type,success,status_code,size,content_type,response_time_ms,error\n",
    );

    for result in results {
        let row = [
            escape_csv(&result.url),
            result.method.to_string(),
            result.api_type.to_string(),
            result.success.to_string(),
            result.status_code.to_string(),
            result.size.to_string(),
            escape_csv(result.content_type.as_deref().unwrap_or("")),
            result.response_time.as_millis().to_string(),
            escape_csv(result.error.as_deref().unwrap_or("")),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

pub fn generate_markdown_report(outcome: &ScanOutcome) -> String {
    let stats = outcome.statistics();
    let mut md = String::new();

    md.push_str("# API Scan Report\n\n");
    md.push_str(&format!(
        "- **Scan date:** {}\n",
        outcome.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("- **Candidates found:** {}\n", outcome.candidates.len()));
    md.push_str(&format!("- **Tested:** {}\n", stats.total));
    md.push_str(&format!("- **Successful:** {}\n", stats.successful));
    md.push_str(&format!("- **Failed:** {}\n", stats.failed));
    md.push_str(&format!("- **Success rate:** {:.1}%\n\n", stats.success_rate));

    md.push_str("## Results\n\n");
    if outcome.results.is_empty() {
        md.push_str("_No APIs were tested._\n");
        return md;
    }

    md.push_str("| Status | Method | Type | Code | URL |\n");
    md.push_str("|--------|--------|------|------|-----|\n");
    for result in &outcome.results {
        md.push_str(&format!(
            "| {} | {} | {} | {} | `{}` |\n",
            if result.success { "✅" } else { "❌" },
            result.method,
            result.api_type,
            result.status_code,
            result.url.replace('|', "\\|")
        ));
    }

    let successful: Vec<&ProbeResult> = outcome.results.iter().filter(|r| r.success).collect();
    if !successful.is_empty() {
        md.push_str("\n## Responses\n");
        for result in successful {
            md.push_str(&format!("\n### {} {}\n\n", result.method, result.url));
            md.push_str("```\n");
            md.push_str(&result.response_summary);
            md.push_str("\n```\n");
        }
    }

    md
}

/// Candidate listing for extraction-only runs
pub fn generate_candidate_report(
    format: ReportFormat,
    candidates: &[Candidate],
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(candidates),
        ReportFormat::Csv => {
            let mut csv = String::from("url,method,type,priority,domain\n");
            for candidate in candidates {
                csv.push_str(&format!(
                    "{},{},{},{},{}\n",
                    escape_csv(&candidate.url),
                    candidate.method,
                    candidate.api_type,
                    candidate.priority,
                    escape_csv(&candidate.domain)
                ));
            }
            Ok(csv)
        }
        ReportFormat::Markdown => {
            let mut md = String::from("# API Candidates\n\n");
            md.push_str("| Priority | Method | Type | URL |\n");
            md.push_str("|----------|--------|------|-----|\n");
            for candidate in candidates {
                md.push_str(&format!(
                    "| {} | {} | {} | `{}` |\n",
                    candidate.priority,
                    candidate.method,
                    candidate.api_type,
                    candidate.url.replace('|', "\\|")
                ));
            }
            Ok(md)
        }
        ReportFormat::Text => {
            let mut report = format!("Found {} API candidates\n\n", candidates.len());
            for candidate in candidates {
                report.push_str(&format!(
                    "  [{}] {:<7} {:<8} {}\n",
                    candidate.priority,
                    candidate.method.as_str().bold(),
                    candidate.api_type.as_str(),
                    candidate.url
                ));
            }
            Ok(report)
        }
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn colorize_status(status_code: u16) -> String {
    let code = format!("{:>3}", status_code);
    match status_code {
        200..=299 => code.green().to_string(),
        300..=399 => code.cyan().to_string(),
        400..=499 => code.yellow().to_string(),
        500..=599 => code.red().to_string(),
        _ => code.dimmed().to_string(),
    }
}

fn shorten_url(url: &str, width: usize) -> String {
    if url.chars().count() <= width {
        return url.to_string();
    }
    let head: String = url.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", head)
}

fn preview(summary: &str, max_chars: usize) -> String {
    if summary.chars().count() <= max_chars {
        return summary.to_string();
    }
    let head: String = summary.chars().take(max_chars).collect();
    format!("{}...", head)
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_csv_plain() {
        assert_eq!(escape_csv("https://example.com/api"), "https://example.com/api");
    }

    #[test]
    fn test_escape_csv_quotes_and_commas() {
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_shorten_url() {
        let long = format!("https://example.com/{}", "a".repeat(100));
        let short = shorten_url(&long, 20);
        assert_eq!(short.chars().count(), 20);
        assert!(short.ends_with("..."));
        assert_eq!(shorten_url("https://x.io", 20), "https://x.io");
    }
}
