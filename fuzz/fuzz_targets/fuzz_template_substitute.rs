//! Fuzz target for `{{ name }}` substitution.
//!
//! Unterminated or malformed placeholders must surface as render errors.

#![no_main]

use libfuzzer_sys::fuzz_target;
use opm_report::template::render::{default_variables, substitute};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = substitute(text, &default_variables());
    }
});
