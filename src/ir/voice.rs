//! Voice and Note

use super::accidentals::AccidentalTracker;
use super::duration::{checked_product, DurationCode, Ticks, MAX_NOTE_TICKS};
use super::objects::{NoteObject, VoiceObject};
use super::pitch::Pitch;
use super::types::{require_time, NoteState, StemDirection, TimeSignature, Tuplet};
use crate::error::{Result, ScoreError};
use serde::Serialize;

/// Rest position when a rest names no key
const DEFAULT_REST_KEY: &str = "b/4";

/// A timed event: chord, single note or rest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub keys: Vec<String>,
    /// Parallel to `keys`; `None` means "derive automatically"
    pub accidentals: Option<Vec<Option<String>>>,
    pub duration: String,
    pub rest: bool,
    pub dots: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stem_direction: Option<StemDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beam: Option<NoteState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tie: Option<NoteState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuplet: Option<Tuplet>,
    pub intrinsic_ticks: Ticks,
    pub tick_multiplier: Ticks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyric: Option<String>,
}

impl Note {
    pub fn new(object: NoteObject) -> Result<Self> {
        let code = DurationCode::parse(&object.duration)?;
        let rest = object.rest.unwrap_or(code.rest);

        let mut keys = object.keys;
        if keys.is_empty() {
            if !rest {
                return Err(ScoreError::invalid_ir("Note requires at least one key"));
            }
            keys.push(DEFAULT_REST_KEY.to_string());
        }
        for key in &keys {
            Pitch::parse(key)?;
        }

        if let Some(accidentals) = &object.accidentals {
            if accidentals.len() != keys.len() {
                return Err(ScoreError::invalid_ir(format!(
                    "Note has {} accidentals for {} keys",
                    accidentals.len(),
                    keys.len()
                )));
            }
        }

        if let Some(tuplet) = &object.tuplet {
            if tuplet.num_notes == 0 || tuplet.beats_occupied == 0 {
                return Err(ScoreError::invalid_ir("Tuplet requires positive num_notes and beats_occupied"));
            }
        }

        let intrinsic_ticks = object.intrinsic_ticks.unwrap_or_else(|| code.ticks());
        // A tuplet without an explicit multiplier scales by beats_occupied / num_notes
        let tick_multiplier = match (object.tick_multiplier, &object.tuplet) {
            (Some(multiplier), _) => multiplier,
            (None, Some(tuplet)) => Ticks::new(tuplet.beats_occupied as u64, tuplet.num_notes as u64),
            (None, None) => Ticks::from_integer(1),
        };
        if *tick_multiplier.numer() == 0 {
            return Err(ScoreError::invalid_ir("Tick multiplier must be positive"));
        }
        match checked_product(intrinsic_ticks, tick_multiplier) {
            Some(ticks) if ticks <= Ticks::from_integer(MAX_NOTE_TICKS) => {}
            _ => {
                return Err(ScoreError::invalid_ir(format!(
                    "Note duration {} x {} is out of range",
                    intrinsic_ticks, tick_multiplier
                )))
            }
        }

        Ok(Note {
            keys,
            accidentals: object.accidentals,
            duration: object.duration,
            rest,
            dots: code.dots,
            stem_direction: object.stem_direction,
            beam: object.beam,
            tie: object.tie,
            tuplet: object.tuplet,
            intrinsic_ticks,
            tick_multiplier,
            lyric: object.lyric,
        })
    }

    /// Ticks consumed in the voice
    pub fn ticks(&self) -> Ticks {
        self.intrinsic_ticks * self.tick_multiplier
    }
}

/// Ordered notes on one stave of a part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Voice {
    pub time: TimeSignature,
    /// Index of the owning part's stave
    pub stave: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    notes: Vec<Note>,
    #[serde(skip)]
    accidentals: Option<AccidentalTracker>,
}

impl Voice {
    pub fn new(object: VoiceObject) -> Result<Self> {
        let time = require_time(object.time.as_ref(), "Measure.Voice")?;
        let mut voice = Voice {
            time,
            stave: object.stave.unwrap_or(0),
            key: object.key,
            notes: Vec::new(),
            accidentals: None,
        };
        for note in object.notes {
            voice.add_note(note)?;
        }
        Ok(voice)
    }

    /// Empty voice on stave 0
    pub fn empty(time: TimeSignature, key: Option<String>) -> Self {
        Voice { time, stave: 0, key, notes: Vec::new(), accidentals: None }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Append a note, deriving accidentals from the voice key when the note
    /// leaves them unspecified
    pub fn add_note(&mut self, object: NoteObject) -> Result<()> {
        let mut note = Note::new(object)?;
        if note.accidentals.is_none() && !note.rest {
            if let Some(key) = &self.key {
                if self.accidentals.is_none() {
                    self.accidentals = Some(AccidentalTracker::for_key(key)?);
                }
                if let Some(tracker) = self.accidentals.as_mut() {
                    note.accidentals = Some(tracker.marks_for_keys(&note.keys)?);
                }
            }
        }
        self.notes.push(note);
        Ok(())
    }

    /// Total ticks of all notes
    pub fn ticks(&self) -> Ticks {
        self.notes.iter().fold(Ticks::from_integer(0), |sum, note| sum + note.ticks())
    }
}
