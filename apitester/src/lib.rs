// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    emit_report, load_config, load_input, overrides_from_args, read_input_file,
    resolve_config_path, write_default_config,
};

// Re-export scan functionality from apitester-core
pub use apitester_core::scan::{
    ScanOptions, ScanOutcome, ScanProgressCallback, execute_scan, extract_candidates,
};
