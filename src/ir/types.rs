//! Shared IR value types
//!
//! Time signatures, note state tags, stem direction, tuplet descriptors and
//! stave modifiers.

use super::objects::{ModifierObject, TimeObject};
use crate::error::{Result, ScoreError};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Time signature with positive fields
///
/// A soft time does not bind the voice's tick budget (free meter, or a
/// MusicXML part that never declared a time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub num_beats: u32,
    pub beat_value: u32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub soft: bool,
}

impl TimeSignature {
    pub fn new(num_beats: u32, beat_value: u32) -> Result<Self> {
        if num_beats == 0 || beat_value == 0 {
            return Err(ScoreError::invalid_ir(format!(
                "Time signature {}/{} must have positive num_beats and beat_value",
                num_beats, beat_value
            )));
        }
        Ok(TimeSignature { num_beats, beat_value, soft: false })
    }

    /// Default 4/4 for content that never declared a time
    pub fn soft_common() -> Self {
        TimeSignature { num_beats: 4, beat_value: 4, soft: true }
    }

    pub fn from_object(object: &TimeObject) -> Result<Self> {
        let positive = |value: Option<i64>, field: &str| -> Result<u32> {
            match value {
                Some(v) if v > 0 && v <= u32::MAX as i64 => Ok(v as u32),
                _ => Err(ScoreError::invalid_ir(format!(
                    "Time signature requires a positive {}",
                    field
                ))),
            }
        };
        Ok(TimeSignature {
            num_beats: positive(object.num_beats, "num_beats")?,
            beat_value: positive(object.beat_value, "beat_value")?,
            soft: object.soft,
        })
    }

    /// `"3/4"`
    pub fn label(&self) -> String {
        format!("{}/{}", self.num_beats, self.beat_value)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature { num_beats: 4, beat_value: 4, soft: false }
    }
}

/// Required time from an optional object
pub(crate) fn require_time(time: Option<&TimeObject>, owner: &str) -> Result<TimeSignature> {
    match time {
        Some(object) => TimeSignature::from_object(object),
        None => Err(ScoreError::invalid_ir(format!(
            "{} must be initialized with nonzero num_beats and beat_value",
            owner
        ))),
    }
}

/// Tie and beam position tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteState {
    Begin,
    Continue,
    End,
}

/// Stem direction, encoded as 1 / -1 in documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i8)]
pub enum StemDirection {
    Up = 1,
    Down = -1,
}

/// Tuplet bracket descriptor: `num_notes` played in the time of `beats_occupied`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tuplet {
    pub num_notes: u32,
    pub beats_occupied: u32,
}

/// Modifier kinds a stave can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKind {
    Clef,
    Key,
    Time,
}

/// Modifier payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModifierValue {
    Clef { clef: String },
    Key { key: String },
    /// Label such as `"3/4"` or `"C"`
    Time { time: String },
}

impl ModifierValue {
    pub fn kind(&self) -> ModifierKind {
        match self {
            ModifierValue::Clef { .. } => ModifierKind::Clef,
            ModifierValue::Key { .. } => ModifierKind::Key,
            ModifierValue::Time { .. } => ModifierKind::Time,
        }
    }
}

/// Clef, key or time annotation at the start of a stave
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    #[serde(flatten)]
    pub value: ModifierValue,
    /// Injected by the formatter rather than the source document
    #[serde(default)]
    pub automatic: bool,
}

impl Modifier {
    pub fn clef(clef: impl Into<String>, automatic: bool) -> Self {
        Modifier { value: ModifierValue::Clef { clef: clef.into() }, automatic }
    }

    pub fn key(key: impl Into<String>, automatic: bool) -> Self {
        Modifier { value: ModifierValue::Key { key: key.into() }, automatic }
    }

    pub fn time(time: impl Into<String>, automatic: bool) -> Self {
        Modifier { value: ModifierValue::Time { time: time.into() }, automatic }
    }

    pub fn kind(&self) -> ModifierKind {
        self.value.kind()
    }
}

impl TryFrom<&ModifierObject> for Modifier {
    type Error = ScoreError;

    fn try_from(object: &ModifierObject) -> Result<Self> {
        let value = match object.kind.as_str() {
            "clef" => ModifierValue::Clef {
                clef: object
                    .clef
                    .clone()
                    .ok_or_else(|| ScoreError::invalid_ir("Clef modifier requires clef string"))?,
            },
            "key" => ModifierValue::Key {
                key: object
                    .key
                    .clone()
                    .ok_or_else(|| ScoreError::invalid_ir("Key modifier requires key string"))?,
            },
            "time" => {
                let time = match (&object.time, object.num_beats, object.beat_value) {
                    (Some(label), _, _) => label.clone(),
                    (None, Some(num_beats), Some(beat_value)) if num_beats > 0 && beat_value > 0 => {
                        format!("{}/{}", num_beats, beat_value)
                    }
                    _ => {
                        return Err(ScoreError::invalid_ir(
                            "Time modifier requires time string or positive num_beats and beat_value",
                        ))
                    }
                };
                ModifierValue::Time { time }
            }
            other => {
                return Err(ScoreError::invalid_ir(format!("Modifier type '{}' not recognized", other)))
            }
        };
        Ok(Modifier { value, automatic: object.automatic })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_signature_validation() {
        assert!(TimeSignature::new(3, 4).is_ok());
        assert!(TimeSignature::new(0, 4).is_err());

        let object = TimeObject { num_beats: Some(-2), beat_value: Some(4), soft: false };
        assert!(matches!(TimeSignature::from_object(&object), Err(ScoreError::InvalidIr(_))));
        assert!(require_time(None, "Measure").is_err());
    }

    #[test]
    fn test_modifier_from_object() {
        let object = ModifierObject { kind: "time".into(), num_beats: Some(6), beat_value: Some(8), ..Default::default() };
        let modifier = Modifier::try_from(&object).unwrap();
        assert_eq!(modifier.value, ModifierValue::Time { time: "6/8".into() });
        assert!(!modifier.automatic);

        let object = ModifierObject { kind: "clef".into(), ..Default::default() };
        assert!(Modifier::try_from(&object).is_err());

        let object = ModifierObject { kind: "dynamics".into(), ..Default::default() };
        assert!(matches!(Modifier::try_from(&object), Err(ScoreError::InvalidIr(_))));
    }

    #[test]
    fn test_modifier_serialization() {
        let json = serde_json::to_value(Modifier::clef("bass", true)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "clef", "clef": "bass", "automatic": true}));
    }

    #[test]
    fn test_stem_direction_repr() {
        assert_eq!(serde_json::to_string(&StemDirection::Down).unwrap(), "-1");
        let up: StemDirection = serde_json::from_str("1").unwrap();
        assert_eq!(up, StemDirection::Up);
    }
}
