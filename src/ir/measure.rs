//! Measure and Part
//!
//! A measure holds one entry per instrument part; each part owns its staves
//! and the voices written on them. Part-level `clef`, `key` and
//! `time_signature` fill in whatever a stave or voice leaves out.

use super::objects::{MeasureObject, NoteObject, PartObject, StaveObject, VoiceObject};
use super::stave::Stave;
use super::types::{require_time, TimeSignature};
use super::voice::Voice;
use crate::error::{Result, ScoreError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Clef used when neither the part nor the stave names one
pub const DEFAULT_CLEF: &str = "treble";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub time: TimeSignature,
    pub clef: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<String>,
    staves: Vec<Stave>,
    voices: Vec<Voice>,
}

impl Part {
    pub fn new(object: PartObject) -> Result<Self> {
        let time = require_time(object.time.as_ref(), "Measure.Part")?;
        let mut part = Part {
            time,
            clef: object.clef.unwrap_or_else(|| DEFAULT_CLEF.to_string()),
            key: object.key,
            time_signature: object.time_signature,
            staves: Vec::new(),
            voices: Vec::new(),
        };

        match object.staves {
            Some(staves) => {
                for stave in staves {
                    let stave = part.inherit_stave(stave);
                    part.staves.push(Stave::new(stave)?);
                }
            }
            None => part.set_number_of_staves(object.num_staves.unwrap_or(1).max(1)),
        }

        match object.voices {
            Some(voices) => {
                for voice in voices {
                    let voice = part.inherit_voice(voice);
                    part.push_voice(Voice::new(voice)?)?;
                }
            }
            None => part.set_number_of_voices(object.num_voices.unwrap_or(1).max(1)),
        }

        Ok(part)
    }

    /// Default part for a measure time
    pub fn with_time(time: TimeSignature) -> Self {
        let mut part = Part {
            time,
            clef: DEFAULT_CLEF.to_string(),
            key: None,
            time_signature: None,
            staves: Vec::new(),
            voices: Vec::new(),
        };
        part.set_number_of_staves(1);
        part.set_number_of_voices(1);
        part
    }

    fn inherit_stave(&self, mut stave: StaveObject) -> StaveObject {
        stave.time.get_or_insert_with(|| self.time.into());
        stave.clef.get_or_insert_with(|| self.clef.clone());
        if stave.key.is_none() {
            stave.key = self.key.clone();
        }
        if stave.time_signature.is_none() {
            stave.time_signature = self.time_signature.clone();
        }
        stave
    }

    fn inherit_voice(&self, mut voice: VoiceObject) -> VoiceObject {
        voice.time.get_or_insert_with(|| self.time.into());
        if voice.key.is_none() {
            let stave_key = voice
                .stave
                .and_then(|index| self.staves.get(index))
                .or_else(|| self.staves.first())
                .and_then(|stave| stave.key.clone());
            voice.key = stave_key.or_else(|| self.key.clone());
        }
        voice
    }

    pub fn number_of_staves(&self) -> usize {
        self.staves.len()
    }

    /// Grow with default staves or truncate
    pub fn set_number_of_staves(&mut self, count: usize) {
        while self.staves.len() < count {
            self.staves.push(Stave::with_defaults(
                self.time,
                Some(self.clef.clone()),
                self.key.clone(),
                self.time_signature.clone(),
            ));
        }
        self.staves.truncate(count);
    }

    pub fn stave(&self, index: usize) -> Option<&Stave> {
        self.staves.get(index)
    }

    pub fn stave_mut(&mut self, index: usize) -> Option<&mut Stave> {
        self.staves.get_mut(index)
    }

    pub fn staves(&self) -> &[Stave] {
        &self.staves
    }

    pub fn staves_mut(&mut self) -> &mut [Stave] {
        &mut self.staves
    }

    pub fn number_of_voices(&self) -> usize {
        self.voices.len()
    }

    /// Grow with empty voices on the first stave or truncate
    pub fn set_number_of_voices(&mut self, count: usize) {
        while self.voices.len() < count {
            let key = self.staves.first().and_then(|s| s.key.clone()).or_else(|| self.key.clone());
            self.voices.push(Voice::empty(self.time, key));
        }
        self.voices.truncate(count);
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn voice_mut(&mut self, index: usize) -> Option<&mut Voice> {
        self.voices.get_mut(index)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Replace voice `index`; the voice must name one of this part's staves
    pub fn set_voice(&mut self, index: usize, voice: Voice) -> Result<()> {
        self.check_voice_stave(&voice)?;
        match self.voices.get_mut(index) {
            Some(slot) => {
                *slot = voice;
                Ok(())
            }
            None => Err(ScoreError::argument(format!(
                "Voice index {} out of range for part with {} voices",
                index,
                self.voices.len()
            ))),
        }
    }

    pub fn push_voice(&mut self, voice: Voice) -> Result<()> {
        self.check_voice_stave(&voice)?;
        self.voices.push(voice);
        Ok(())
    }

    fn check_voice_stave(&self, voice: &Voice) -> Result<()> {
        if voice.stave >= self.staves.len() {
            return Err(ScoreError::invalid_ir(format!(
                "Voice references stave {} but part has {} staves",
                voice.stave,
                self.staves.len()
            )));
        }
        Ok(())
    }

    /// Append to the only voice
    pub fn add_note(&mut self, note: NoteObject) -> Result<()> {
        match self.voices.as_mut_slice() {
            [voice] => voice.add_note(note),
            voices => Err(ScoreError::argument(format!(
                "Part.add_note requires exactly one voice, part has {}",
                voices.len()
            ))),
        }
    }

    /// Multi-stave parts are joined by a brace
    pub fn shows_brace(&self) -> bool {
        self.staves.len() > 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    pub time: TimeSignature,
    pub attributes: Map<String, Value>,
    parts: Vec<Part>,
}

impl Measure {
    pub fn new(object: MeasureObject) -> Result<Self> {
        let time = require_time(object.time.as_ref(), "Measure")?;
        let parts = match object.parts {
            Some(parts) => parts
                .into_iter()
                .map(|part| Part::new(Self::inherit_part(time, part)))
                .collect::<Result<Vec<_>>>()?,
            None => vec![Part::with_time(time)],
        };
        Ok(Measure { time, attributes: object.attributes, parts })
    }

    fn inherit_part(time: TimeSignature, mut part: PartObject) -> PartObject {
        part.time.get_or_insert_with(|| time.into());
        part
    }

    /// Merge keys into the attribute bag
    pub fn set_attributes(&mut self, attributes: Map<String, Value>) {
        self.attributes.extend(attributes);
    }

    pub fn number_of_parts(&self) -> usize {
        self.parts.len()
    }

    /// Grow with default parts or truncate
    pub fn set_number_of_parts(&mut self, count: usize) {
        while self.parts.len() < count {
            self.parts.push(Part::with_time(self.time));
        }
        self.parts.truncate(count);
    }

    pub fn part(&self, index: usize) -> Option<&Part> {
        self.parts.get(index)
    }

    pub fn part_mut(&mut self, index: usize) -> Option<&mut Part> {
        self.parts.get_mut(index)
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn set_part(&mut self, index: usize, object: PartObject) -> Result<()> {
        if index >= self.parts.len() {
            return Err(ScoreError::argument(format!(
                "Part index {} beyond part count {}",
                index,
                self.parts.len()
            )));
        }
        self.parts[index] = Part::new(Self::inherit_part(self.time, object))?;
        Ok(())
    }

    /// Staves summed over parts
    pub fn number_of_staves(&self) -> usize {
        self.parts.iter().map(Part::number_of_staves).sum()
    }

    /// Stave by global index across parts
    pub fn stave(&self, index: usize) -> Option<&Stave> {
        self.staves().nth(index)
    }

    pub fn stave_mut(&mut self, index: usize) -> Option<&mut Stave> {
        self.parts.iter_mut().flat_map(|p| p.staves.iter_mut()).nth(index)
    }

    pub fn staves(&self) -> impl Iterator<Item = &Stave> {
        self.parts.iter().flat_map(|p| p.staves.iter())
    }

    pub fn staves_mut(&mut self) -> impl Iterator<Item = &mut Stave> {
        self.parts.iter_mut().flat_map(|p| p.staves.iter_mut())
    }

    /// Global index of a part's first stave
    pub fn first_stave_of_part(&self, part: usize) -> usize {
        self.parts.iter().take(part).map(Part::number_of_staves).sum()
    }

    /// Append to the only part's only voice
    pub fn add_note(&mut self, note: NoteObject) -> Result<()> {
        match self.parts.as_mut_slice() {
            [part] => part.add_note(note),
            parts => Err(ScoreError::argument(format!(
                "Measure.add_note requires exactly one part, measure has {}",
                parts.len()
            ))),
        }
    }

    /// Any part joined by a brace
    pub fn shows_brace(&self) -> bool {
        self.parts.iter().any(Part::shows_brace)
    }
}
