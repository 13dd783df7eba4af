//! Automatic accidental derivation
//!
//! A voice with a key tracks, per letter, the accidental currently sounding.
//! The table starts from the key signature and is updated note by note, so a
//! repeated alteration is not marked twice and a natural cancels it.

use super::pitch::{key_signature_table, Accidental, Pitch};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccidentalTracker {
    sounding: [Option<Accidental>; 7],
}

impl AccidentalTracker {
    /// Seed the table from a key signature name
    pub fn for_key(key: &str) -> Result<Self> {
        Ok(AccidentalTracker { sounding: key_signature_table(key)? })
    }

    /// Visible accidental for `pitch`, updating the table
    pub fn mark(&mut self, pitch: &Pitch) -> Option<Accidental> {
        let slot = &mut self.sounding[pitch.letter_index()];
        let written = pitch.accidental.filter(|a| *a != Accidental::Natural);

        if written == *slot {
            return None;
        }
        *slot = written;
        Some(written.unwrap_or(Accidental::Natural))
    }

    /// Marks for every key of a chord, in key order
    pub fn marks_for_keys(&mut self, keys: &[String]) -> Result<Vec<Option<String>>> {
        keys.iter()
            .map(|key| {
                let pitch = Pitch::parse(key)?;
                Ok(self.mark(&pitch).map(|a| a.symbol().to_string()))
            })
            .collect()
    }

    /// Accidental currently sounding on a letter
    pub fn sounding(&self, letter: char) -> Option<Accidental> {
        let probe = Pitch::new(letter, None, 4);
        self.sounding[probe.letter_index()]
    }
}
