//! Layout of IR measures into fixed-width blocks
//!
//! [`LiquidFormatter`] decides which measures share a block (a system line),
//! their widths and x offsets, and where each stave sits vertically. Sizes
//! of drawn content come from a [`RenderMetrics`] implementation.

pub mod connectors;
pub mod layout;
pub mod liquid;
pub mod metrics;
pub mod voices;

pub use layout::{
    BeamGroup, BlockDimensions, BlockLayout, ConnectorPlacement, ConnectorPosition, MeasureLayout,
    StaveGeometry, TieLayout, Tickable, TupletGroup, VoiceLayout,
};
pub use liquid::LiquidFormatter;
pub use metrics::{BoundingBox, RenderMetrics, StandardMetrics};
