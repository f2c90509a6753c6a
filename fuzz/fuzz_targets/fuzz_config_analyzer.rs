//! Fuzz target for analyzer.json configuration parsing.
//!
//! Parsing and validation should never panic, only return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use nm_config::{validate_analyzer, AnalyzerConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<AnalyzerConfig>(data) {
        let _ = validate_analyzer(&config);
    }
});
