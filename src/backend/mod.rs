//! Backends produce IR measures from a source format
//!
//! ```text
//! Source (JSON text | JSON value | MusicXML text | parsed XML)
//!   ↓ [BackendRegistry probes appears_valid in priority order]
//! Backend::parse
//!   ↓
//! Backend::measure(i) → ir::Measure
//! ```
//!
//! The first backend whose probe accepts the source is adopted. There is no
//! fallback to a later candidate once one is chosen.

pub mod ir_json;
pub mod musicxml;

use crate::error::{Result, ScoreError};
use crate::ir::Measure;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use ir_json::IrBackend;
pub use musicxml::MusicXmlBackend;

/// Raw document input
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// JSON or XML text
    Text(&'a str),
    /// Already-deserialized JSON
    Json(&'a Value),
    /// Already-parsed XML tree
    #[cfg(feature = "musicxml")]
    Xml(&'a roxmltree::Document<'a>),
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(text: &'a str) -> Self {
        Source::Text(text)
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(text: &'a String) -> Self {
        Source::Text(text.as_str())
    }
}

impl<'a> From<&'a Value> for Source<'a> {
    fn from(value: &'a Value) -> Self {
        Source::Json(value)
    }
}

#[cfg(feature = "musicxml")]
impl<'a> From<&'a roxmltree::Document<'a>> for Source<'a> {
    fn from(document: &'a roxmltree::Document<'a>) -> Self {
        Source::Xml(document)
    }
}

/// Stave connector glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Brace,
    Bracket,
    Single,
}

/// Connector spanning a range of parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaveConnector {
    pub kind: ConnectorKind,
    /// First and last part index, inclusive
    pub parts: (usize, usize),
    #[serde(default)]
    pub system_start: bool,
    #[serde(default)]
    pub system_end: bool,
    #[serde(default)]
    pub measure_start: bool,
}

impl StaveConnector {
    pub fn system_start(kind: ConnectorKind, first: usize, last: usize) -> Self {
        StaveConnector {
            kind,
            parts: (first, last),
            system_start: true,
            system_end: false,
            measure_start: false,
        }
    }

    /// Barline drawn through every measure of a group
    pub fn group_barline(first: usize, last: usize) -> Self {
        StaveConnector {
            kind: ConnectorKind::Single,
            parts: (first, last),
            system_start: false,
            system_end: true,
            measure_start: true,
        }
    }
}

/// A source format that yields IR measures
pub trait Backend {
    /// Short identifier for logging
    fn name(&self) -> &'static str;

    /// Cheap static sniff used for backend selection
    fn appears_valid(source: &Source<'_>) -> bool
    where
        Self: Sized;

    fn parse(&mut self, source: &Source<'_>) -> Result<()>;

    fn is_valid(&self) -> bool;

    fn number_of_measures(&self) -> usize;

    /// Build measure `index`; indices past the end are an ArgumentError
    fn measure(&self, index: usize) -> Result<Measure>;

    fn stave_connectors(&self) -> Vec<StaveConnector> {
        Vec::new()
    }
}

pub(crate) fn measure_index_error(index: usize, count: usize) -> ScoreError {
    ScoreError::argument(format!(
        "Measure index {} out of range for document with {} measures",
        index, count
    ))
}

type Probe = fn(&Source<'_>) -> bool;
type Factory = fn() -> Box<dyn Backend>;

struct BackendEntry {
    name: &'static str,
    appears_valid: Probe,
    create: Factory,
}

fn create<B: Backend + Default + 'static>() -> Box<dyn Backend> {
    Box::new(B::default())
}

/// Ordered set of candidate backends
pub struct BackendRegistry {
    entries: Vec<BackendEntry>,
}

impl BackendRegistry {
    /// Registry with no candidates
    pub fn empty() -> Self {
        BackendRegistry { entries: Vec::new() }
    }

    /// Append a backend; earlier registrations take priority
    pub fn register<B: Backend + Default + 'static>(&mut self, name: &'static str) {
        self.entries.push(BackendEntry {
            name,
            appears_valid: B::appears_valid,
            create: create::<B>,
        });
    }

    /// Registered names in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Select and parse with the first backend that accepts `source`
    pub fn open(&self, source: &Source<'_>) -> Result<Box<dyn Backend>> {
        let entry = self
            .entries
            .iter()
            .find(|entry| (entry.appears_valid)(source))
            .ok_or_else(|| ScoreError::parse("Data in document appears to be unsupported"))?;

        log::debug!("Selected {} backend", entry.name);
        let mut backend = (entry.create)();
        backend.parse(source)?;
        if !backend.is_valid() {
            return Err(ScoreError::parse("Could not parse document data"));
        }
        Ok(backend)
    }
}

impl Default for BackendRegistry {
    /// IR first, then MusicXML
    fn default() -> Self {
        let mut registry = BackendRegistry::empty();
        registry.register::<IrBackend>("ir");
        registry.register::<MusicXmlBackend>("musicxml");
        registry
    }
}
