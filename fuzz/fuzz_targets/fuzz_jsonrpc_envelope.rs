//! Fuzz target for JSON-RPC envelope validation.
//!
//! Any byte sequence that parses as JSON must be accepted or rejected with an
//! error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use opm_core::mcp::protocol::JsonRpcRequest;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = JsonRpcRequest::from_value(value);
    }
});
