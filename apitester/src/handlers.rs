use apitester_core::config::{AppConfig, ConfigOverrides};
use apitester_core::report::{
    ReportFormat, generate_candidate_report, generate_report, save_report,
};
use apitester_core::scan::{ScanOptions, ScanProgressCallback, execute_scan, extract_candidates};
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

/// Install the stderr log subscriber. Stdout is kept for reports.
pub fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "✗".red().bold(), msg);
    std::process::exit(1);
}

/// Read the DevTools blob from a file
pub fn read_input_file(path: &Path) -> Result<String, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read input file {}: {}", path.display(), e))?;
    non_empty_input(content)
}

fn non_empty_input(content: String) -> Result<String, String> {
    if content.trim().is_empty() {
        return Err("No input data provided".to_string());
    }
    Ok(content)
}

/// Read the DevTools blob from `--input` or stdin
pub fn load_input(input: Option<&PathBuf>) -> Result<String, String> {
    if let Some(path) = input {
        return read_input_file(path);
    }

    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        eprintln!(
            "{} Paste the copied DevTools data, then press Ctrl-D",
            "→".blue()
        );
    }

    let mut content = String::new();
    stdin
        .read_to_string(&mut content)
        .map_err(|e| format!("Failed to read stdin: {}", e))?;
    non_empty_input(content)
}

pub fn resolve_config_path(config: Option<&PathBuf>) -> PathBuf {
    match config {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref()),
        None => AppConfig::default_path(),
    }
}

/// Collect the command-line values that take precedence over the config file
pub fn overrides_from_args(args: &ArgMatches) -> ConfigOverrides {
    let flag = |id: &str| {
        args.try_get_one::<bool>(id)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false)
    };

    ConfigOverrides {
        timeout: args.try_get_one::<f64>("timeout").ok().flatten().copied(),
        max_apis: args.try_get_one::<usize>("max-apis").ok().flatten().copied(),
        delay: args.try_get_one::<f64>("delay").ok().flatten().copied(),
        blacklist: args
            .try_get_many::<String>("blacklist")
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        verify_tls: flag("verify-tls"),
        no_redirects: flag("no-redirects"),
        user_agent: args.try_get_one::<String>("user-agent").ok().flatten().cloned(),
    }
}

/// Load the config file, apply overrides and validate the result
pub fn load_config(
    config_path: Option<&PathBuf>,
    overrides: ConfigOverrides,
) -> Result<AppConfig, String> {
    let path = resolve_config_path(config_path);
    let mut config = AppConfig::load(&path).map_err(|e| e.to_string())?;
    config.apply_overrides(overrides);
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Write a default config file. Refuses to overwrite unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<(), String> {
    if path.exists() && !force {
        return Err(format!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }

    AppConfig::default().save(path).map_err(|e| e.to_string())
}

fn report_format(args: &ArgMatches) -> ReportFormat {
    args.get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text)
}

/// Print the report, or save it when `--output` was given
pub fn emit_report(content: &str, output: Option<&PathBuf>) -> Result<(), String> {
    match output {
        Some(path) => {
            let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
            save_report(content, &expanded)
                .map_err(|e| format!("Failed to save report to {}: {}", expanded.display(), e))?;
            eprintln!(
                "{} Report saved to {}",
                "✓".green().bold(),
                expanded.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn handle_init(args: &ArgMatches) {
    let path_arg = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or("~/.config/apitester/config.json");
    let force = args.get_flag("force");
    let expanded = shellexpand::tilde(path_arg);
    let config_path = Path::new(expanded.as_ref());

    println!(
        "{} Target: {}",
        "→".blue(),
        config_path.display().to_string().bright_white()
    );

    if let Err(e) = write_default_config(config_path, force) {
        fail(e);
    }

    println!("{} Default configuration written", "✓".green().bold());
    println!(
        "{} Edit {} to change timeouts, delays and the domain blacklist",
        "→".blue(),
        config_path.display()
    );
}

pub fn handle_extract(args: &ArgMatches) {
    let config = load_config(args.get_one::<PathBuf>("config"), overrides_from_args(args))
        .unwrap_or_else(|e| fail(e));
    let input = load_input(args.get_one::<PathBuf>("input")).unwrap_or_else(|e| fail(e));

    let candidates = extract_candidates(&input, &config).unwrap_or_else(|e| fail(e));

    let output = args.get_one::<PathBuf>("output");
    if output.is_some() {
        colored::control::set_override(false);
    }

    let report = generate_candidate_report(report_format(args), &candidates)
        .unwrap_or_else(|e| fail(format!("Failed to render report: {}", e)));
    if let Err(e) = emit_report(&report, output) {
        fail(e);
    }
}

pub async fn handle_scan(args: &ArgMatches, quiet: bool) {
    let config = load_config(args.get_one::<PathBuf>("config"), overrides_from_args(args))
        .unwrap_or_else(|e| fail(e));
    let input = load_input(args.get_one::<PathBuf>("input")).unwrap_or_else(|e| fail(e));

    if !quiet {
        eprintln!(
            "\n{} Scanning {} bytes of input",
            "→".blue(),
            input.len()
        );
        eprintln!(
            "Timeout: {}s | Max APIs: {} | Delay: {}s\n",
            config.api_detection.timeout,
            config.api_detection.max_apis_per_scan,
            config.advanced.delay_between_requests
        );
    }

    let options = ScanOptions {
        config,
        show_progress: !quiet,
    };

    let progress_callback: ScanProgressCallback = Arc::new(move |msg: String| {
        if !quiet {
            eprintln!("{} {}", "→".blue(), msg);
        }
    });

    let outcome = match execute_scan(&input, options, Some(progress_callback)).await {
        Ok(outcome) => outcome,
        Err(e) => fail(format!("Scan failed: {}", e)),
    };

    if outcome.candidates.is_empty() {
        eprintln!(
            "{} No APIs found. Copy the Network tab or request lines from DevTools and try again.",
            "⚠".yellow().bold()
        );
        return;
    }

    let output = args.get_one::<PathBuf>("output");
    if output.is_some() {
        colored::control::set_override(false);
    }

    let report = generate_report(report_format(args), &outcome)
        .unwrap_or_else(|e| fail(format!("Failed to render report: {}", e)));
    if let Err(e) = emit_report(&report, output) {
        fail(e);
    }
}
