//! Geometry and drawing-list types handed to the renderer

use crate::backend::ConnectorKind;
use crate::ir::{Modifier, StemDirection, Ticks, TimeSignature};
use serde::{Deserialize, Serialize};

/// `[width, height]` of a block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockDimensions {
    pub width: f64,
    pub height: f64,
}

/// Placed stave of one measure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaveGeometry {
    pub measure: usize,
    /// Global stave index within the measure
    pub stave: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub clef: Option<String>,
    pub modifiers: Vec<Modifier>,
}

/// One timed event ready to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tickable {
    pub keys: Vec<String>,
    pub duration: String,
    pub ticks: Ticks,
    /// Offset from the start of the voice
    pub start: Ticks,
    /// Parallel to `keys`
    pub accidentals: Vec<Option<String>>,
    pub dots: u32,
    pub rest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stem_direction: Option<StemDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyric: Option<String>,
}

/// Tickable indices joined by one beam
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeamGroup {
    pub notes: Vec<usize>,
}

/// Tie between two tickables, with the chord members it joins
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TieLayout {
    pub first_note: usize,
    pub last_note: usize,
    /// `(key index in first, key index in last)`
    pub key_pairs: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TupletGroup {
    pub notes: Vec<usize>,
    pub num_notes: u32,
    pub beats_occupied: u32,
}

/// Voice converted for drawing and measuring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceLayout {
    /// Global stave index within the measure
    pub stave: usize,
    pub time: TimeSignature,
    /// Not held to the time signature's tick budget
    pub soft: bool,
    pub clef: String,
    pub tickables: Vec<Tickable>,
    pub beams: Vec<BeamGroup>,
    pub ties: Vec<TieLayout>,
    pub tuplets: Vec<TupletGroup>,
}

/// Where a connector is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorPosition {
    SystemStart,
    MeasureStart,
    SystemEnd,
}

/// Connector resolved to staves and an x position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorPlacement {
    pub kind: ConnectorKind,
    pub position: ConnectorPosition,
    pub first_stave: usize,
    pub last_stave: usize,
    pub x: f64,
    /// Top line of the first stave
    pub top_y: f64,
    /// Bottom line of the last stave
    pub bottom_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureLayout {
    pub index: usize,
    pub x: f64,
    pub width: f64,
    pub staves: Vec<StaveGeometry>,
    pub voices: Vec<VoiceLayout>,
    pub connectors: Vec<ConnectorPlacement>,
}

/// Everything needed to draw one block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockLayout {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub measures: Vec<MeasureLayout>,
}
