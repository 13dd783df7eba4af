//! Shared helpers for the WASM API
//!
//! Console logging, JS serialization and conversion of [`ScoreError`]
//! into JavaScript `Error` objects.

use crate::error::ScoreError;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ============================================================================
// Console Logging
// ============================================================================

/// Log a debug message with [WASM] prefix
#[macro_export]
macro_rules! wasm_log {
    ($($arg:tt)*) => {
        $crate::api::helpers::log_debug(&format!($($arg)*))
    };
}

pub fn log_debug(msg: &str) {
    web_sys::console::log_1(&format!("[WASM] {}", msg).into());
}

pub fn log_error(msg: &str) {
    web_sys::console::error_1(&format!("[WASM] ❌ {}", msg).into());
}

// ============================================================================
// Serialization
// ============================================================================

/// Serialize to plain JS objects (maps become objects, not `Map`)
pub fn serialize<T: Serialize>(value: &T, error_context: &str) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        log_error(&msg);
        JsValue::from_str(&msg)
    })
}

// ============================================================================
// Error Conversion
// ============================================================================

/// JS `Error` whose `name` is the error kind, e.g. `"InvalidIRError"`
pub fn to_js_error(error: ScoreError) -> JsValue {
    log_error(&error.to_string());
    let js_error = js_sys::Error::new(error.message());
    js_error.set_name(error.kind());
    js_error.into()
}
