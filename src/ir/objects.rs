//! Loose input objects for building IR
//!
//! These mirror the JSON document format field for field. Every field is
//! optional so that partial objects (a part that only names its clef, a
//! voice that only lists notes) deserialize; the validated IR types in
//! [`super::types`] apply defaults and report schema violations.

use super::duration::Ticks;
use super::types::{NoteState, StemDirection, TimeSignature, Tuplet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{num_beats, beat_value, soft?}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeObject {
    pub num_beats: Option<i64>,
    pub beat_value: Option<i64>,
    pub soft: bool,
}

impl From<TimeSignature> for TimeObject {
    fn from(time: TimeSignature) -> Self {
        TimeObject {
            num_beats: Some(time.num_beats as i64),
            beat_value: Some(time.beat_value as i64),
            soft: time.soft,
        }
    }
}

/// Top-level `{type: "document", measures: [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentObject {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub measures: Vec<MeasureObject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureObject {
    pub time: Option<TimeObject>,
    pub attributes: Map<String, Value>,
    /// `None` gives one default part
    pub parts: Option<Vec<PartObject>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartObject {
    pub time: Option<TimeObject>,
    pub clef: Option<String>,
    pub key: Option<String>,
    pub time_signature: Option<String>,
    pub num_staves: Option<usize>,
    pub staves: Option<Vec<StaveObject>>,
    pub num_voices: Option<usize>,
    pub voices: Option<Vec<VoiceObject>>,
}

impl PartObject {
    /// Part carrying only a time signature
    pub fn with_time(time: TimeSignature) -> Self {
        PartObject { time: Some(time.into()), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaveObject {
    pub time: Option<TimeObject>,
    pub clef: Option<String>,
    pub key: Option<String>,
    pub time_signature: Option<String>,
    pub modifiers: Vec<ModifierObject>,
}

/// `{type: "clef"|"key"|"time", clef?, key?, time?, num_beats?, beat_value?, automatic?}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub clef: Option<String>,
    pub key: Option<String>,
    pub time: Option<String>,
    pub num_beats: Option<i64>,
    pub beat_value: Option<i64>,
    pub automatic: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceObject {
    pub time: Option<TimeObject>,
    pub stave: Option<usize>,
    pub key: Option<String>,
    pub notes: Vec<NoteObject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteObject {
    pub keys: Vec<String>,
    pub accidentals: Option<Vec<Option<String>>>,
    pub duration: String,
    pub rest: Option<bool>,
    pub stem_direction: Option<StemDirection>,
    pub beam: Option<NoteState>,
    pub tie: Option<NoteState>,
    pub tuplet: Option<Tuplet>,
    pub intrinsic_ticks: Option<Ticks>,
    pub tick_multiplier: Option<Ticks>,
    pub lyric: Option<String>,
}

impl NoteObject {
    /// Note with keys and a duration code, everything else defaulted
    pub fn new<S: Into<String>>(keys: Vec<S>, duration: impl Into<String>) -> Self {
        NoteObject {
            keys: keys.into_iter().map(Into::into).collect(),
            duration: duration.into(),
            ..Default::default()
        }
    }
}
