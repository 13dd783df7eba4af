//! MusicXML backend
//!
//! ```text
//! MusicXML string / parsed tree
//!   ↓ [reader: extract with roxmltree]
//! RawScore (part → measure)
//!   ↓ [timewise matrix + attribute fold, once]
//! measure(i)
//!   ↓ [notes: durations, chords, ties, beams, tuplets, voices]
//! ir::Measure
//! ```
//!
//! Only `score-partwise` documents are supported. Parsing needs the
//! `musicxml` feature; without it `parse` fails with a
//! PlatformCapabilityError.

mod attributes;
mod notes;
mod part_groups;
#[cfg(feature = "musicxml")]
mod reader;

use super::{measure_index_error, Backend, Source, StaveConnector};
use crate::error::{Result, ScoreError};
use crate::ir::{Measure, MeasureObject, PartObject, StaveObject};
use attributes::{AttributeDelta, Attributes};
use notes::RawNote;
use part_groups::PartListEntry;
use serde_json::{Map, Value};

/// One `<measure>` of one part
#[derive(Debug, Clone, Default)]
pub(crate) struct RawMeasure {
    pub number: Option<String>,
    pub attributes: AttributeDelta,
    pub notes: Vec<RawNote>,
}

/// Owned extraction of a partwise score
#[derive(Debug, Clone, Default)]
pub(crate) struct RawScore {
    pub part_list: Vec<PartListEntry>,
    /// part → measures
    pub parts: Vec<Vec<RawMeasure>>,
}

/// Cell of the timewise matrix
#[derive(Debug, Clone)]
struct PartMeasure {
    raw: RawMeasure,
    attributes: Attributes,
}

#[derive(Debug, Default)]
pub struct MusicXmlBackend {
    /// measure → part
    measures: Vec<Vec<PartMeasure>>,
    connectors: Vec<StaveConnector>,
    valid: bool,
}

impl MusicXmlBackend {
    fn sniff_text(text: &str) -> bool {
        text.to_ascii_lowercase().contains("<score-partwise")
    }

    #[cfg(feature = "musicxml")]
    fn read(source: &Source<'_>) -> Result<RawScore> {
        match source {
            Source::Text(text) => reader::read_text(text),
            Source::Xml(doc) => reader::read_document(doc),
            Source::Json(_) => Err(ScoreError::argument("MusicXML requires XML string or parsed XML document")),
        }
    }

    #[cfg(not(feature = "musicxml"))]
    fn read(source: &Source<'_>) -> Result<RawScore> {
        match source {
            Source::Json(_) => Err(ScoreError::argument("MusicXML requires XML string or parsed XML document")),
            Source::Text(_) => Err(ScoreError::platform_capability("No XML parser available in this build")),
        }
    }

    /// Build the timewise matrix; `false` when parts disagree on measure count
    fn load(&mut self, score: RawScore) -> bool {
        let number_of_parts = score.parts.len();
        let measure_count = score.parts.first().map_or(0, Vec::len);
        if score.parts.iter().any(|part| part.len() != measure_count) {
            log::warn!("MusicXML parts have differing measure counts");
            return false;
        }

        let mut measures: Vec<Vec<PartMeasure>> = (0..measure_count).map(|_| Vec::with_capacity(number_of_parts)).collect();
        for part in score.parts {
            let snapshots = Attributes::fold(part.iter().map(|m| &m.attributes));
            for (index, (raw, attributes)) in part.into_iter().zip(snapshots).enumerate() {
                measures[index].push(PartMeasure { raw, attributes });
            }
        }

        self.connectors = part_groups::stave_connectors(&score.part_list, number_of_parts);
        self.measures = measures;
        true
    }

    fn part_object(cell: &PartMeasure) -> Result<PartObject> {
        let attributes = &cell.attributes;
        let voices = notes::build_voices(&cell.raw.notes, attributes)?;
        let referenced = voices.iter().filter_map(|v| v.stave).max().map_or(0, |s| s + 1);
        let number_of_staves = attributes.staves.max(referenced).max(1);

        let staves = (0..number_of_staves)
            .map(|staff| StaveObject {
                clef: Some(attributes.clef(staff).to_string()),
                ..Default::default()
            })
            .collect();

        Ok(PartObject {
            time: Some(attributes.time.into()),
            clef: Some(attributes.clef(0).to_string()),
            key: attributes.key.clone(),
            time_signature: attributes.time_label.clone(),
            staves: Some(staves),
            voices: Some(voices),
            ..Default::default()
        })
    }
}

impl Backend for MusicXmlBackend {
    fn name(&self) -> &'static str {
        "musicxml"
    }

    fn appears_valid(source: &Source<'_>) -> bool {
        match source {
            Source::Text(text) => Self::sniff_text(text),
            Source::Json(_) => false,
            #[cfg(feature = "musicxml")]
            Source::Xml(doc) => doc.root_element().tag_name().name() == "score-partwise",
        }
    }

    fn parse(&mut self, source: &Source<'_>) -> Result<()> {
        self.valid = false;
        let score = Self::read(source)?;
        self.valid = self.load(score);
        log::debug!(
            "MusicXML document: {} measures, valid = {}",
            self.measures.len(),
            self.valid
        );
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn number_of_measures(&self) -> usize {
        self.measures.len()
    }

    fn measure(&self, index: usize) -> Result<Measure> {
        let cells = self
            .measures
            .get(index)
            .ok_or_else(|| measure_index_error(index, self.measures.len()))?;

        let time = cells
            .first()
            .map(|cell| cell.attributes.time)
            .unwrap_or_else(crate::ir::TimeSignature::soft_common);

        let mut attributes = Map::new();
        if let Some(number) = cells.first().and_then(|c| c.raw.number.clone()) {
            attributes.insert("number".to_string(), Value::String(number));
        }

        let parts = cells.iter().map(Self::part_object).collect::<Result<Vec<_>>>()?;
        Measure::new(MeasureObject { time: Some(time.into()), attributes, parts: Some(parts) })
    }

    fn stave_connectors(&self) -> Vec<StaveConnector> {
        self.connectors.clone()
    }
}

#[cfg(all(test, feature = "musicxml"))]
#[path = "tests.rs"]
mod tests;
