//! Fuzz target for config.toml parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use opm_config::ServerConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = ServerConfig::from_toml_str(text);
    }
});
