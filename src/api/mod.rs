//! JavaScript-facing API
//!
//! - `helpers`: console logging, serialization and error conversion
//! - `score`: the `LiquidScore` class

pub mod helpers;
pub mod score;

pub use score::LiquidScore;
