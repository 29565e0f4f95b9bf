//! Fuzz target for report template documents received as JSON.

#![no_main]

use libfuzzer_sys::fuzz_target;
use opm_report::ReportTemplate;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = ReportTemplate::from_value(value);
    }
});
