//! Fuzz target for analysis.json parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tc_config::{validate_analysis, AnalysisConfig};

fuzz_target!(|data: &str| {
    if let Ok(config) = AnalysisConfig::from_json(data) {
        let _ = validate_analysis(&config);
    }
});
