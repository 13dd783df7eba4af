//! Liquid Score WASM Module
//!
//! Music notation documents (IR JSON or MusicXML) laid out into fixed-width
//! blocks by the Liquid formatter.
//!
//! ```text
//! text / JSON / XML ─→ Document (backend + measure cache)
//!                        ↓ measure(i) → ir::Measure
//!                      LiquidFormatter → blocks, stave geometry, drawing lists
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod formatter;
pub mod ir;

// Re-export commonly used types
pub use backend::{Backend, BackendRegistry, Source};
pub use config::FormatterConfig;
pub use document::Document;
pub use error::{Result, ScoreError};
pub use formatter::{BlockDimensions, BlockLayout, LiquidFormatter, RenderMetrics, StandardMetrics};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "console_log")]
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&"[WASM] Logger already initialized".into());
    }

    log::info!("Liquid Score WASM module initialized");
}
