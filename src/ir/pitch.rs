//! Pitch keys, accidentals and key signatures
//!
//! Pitches use the canonical `Letter[Accidental]/Octave` form (`"C#/4"`,
//! `"bb/3"`). Letters are case-insensitive on input.

use crate::error::{Result, ScoreError};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Letters in table order (A = 0 ... G = 6)
pub const LETTERS: [char; 7] = ['A', 'B', 'C', 'D', 'E', 'F', 'G'];

/// Written accidental
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "bb" => Some(Accidental::DoubleFlat),
            "b" => Some(Accidental::Flat),
            "n" => Some(Accidental::Natural),
            "#" => Some(Accidental::Sharp),
            "##" => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Natural => "n",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "##",
        }
    }

    /// Semitone offset
    pub fn alteration(&self) -> i8 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    /// Accidental for a MusicXML `<alter>` value; 0 maps to no accidental
    pub fn from_alteration(alter: i8) -> Option<Self> {
        match alter {
            -2 => Some(Accidental::DoubleFlat),
            -1 => Some(Accidental::Flat),
            1 => Some(Accidental::Sharp),
            2 => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }
}

/// A parsed pitch key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pitch {
    /// Uppercase letter A-G
    pub letter: char,
    /// Written accidental; `None` is a plain letter
    pub accidental: Option<Accidental>,
    pub octave: i8,
}

impl Pitch {
    pub fn new(letter: char, accidental: Option<Accidental>, octave: i8) -> Self {
        Pitch { letter: letter.to_ascii_uppercase(), accidental, octave }
    }

    /// Parse `"c#/4"`; a trailing notehead segment (`"c/4/x2"`) is ignored
    pub fn parse(key: &str) -> Result<Self> {
        let invalid = || ScoreError::invalid_ir(format!("Invalid pitch key '{}'", key));

        let mut segments = key.split('/');
        let name = segments.next().ok_or_else(invalid)?;
        let octave_text = segments.next().ok_or_else(invalid)?;

        let mut chars = name.chars();
        let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        if !LETTERS.contains(&letter) {
            return Err(invalid());
        }
        let accidental_text = chars.as_str();
        let accidental = if accidental_text.is_empty() {
            None
        } else {
            Some(Accidental::from_symbol(&accidental_text.to_ascii_lowercase()).ok_or_else(invalid)?)
        };

        let octave = octave_text.trim().parse::<i8>().map_err(|_| invalid())?;
        Ok(Pitch { letter, accidental, octave })
    }

    /// Index into a per-letter table
    pub fn letter_index(&self) -> usize {
        letter_index(self.letter)
    }

    /// Semitone alteration (a plain letter and an explicit natural are both 0)
    pub fn alteration(&self) -> i8 {
        self.accidental.map(|a| a.alteration()).unwrap_or(0)
    }

    /// Diatonic step count from C0
    pub fn diatonic_step(&self) -> i32 {
        let within_octave = match self.letter {
            'C' => 0,
            'D' => 1,
            'E' => 2,
            'F' => 3,
            'G' => 4,
            'A' => 5,
            _ => 6,
        };
        self.octave as i32 * 7 + within_octave
    }

    /// Staff line position under a clef (bottom line = 1, top line = 5,
    /// half steps for spaces), matching the renderer's note-line convention
    pub fn staff_line(&self, clef: &str) -> f64 {
        let step = self.diatonic_step() + clef_step_shift(clef);
        // E4 sits on the bottom treble line
        (step - 30) as f64 / 2.0 + 1.0
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accidental = self.accidental.map(|a| a.symbol()).unwrap_or("");
        write!(f, "{}{}/{}", self.letter, accidental, self.octave)
    }
}

fn letter_index(letter: char) -> usize {
    LETTERS.iter().position(|&l| l == letter).unwrap_or(0)
}

/// Diatonic shift that places a clef's bottom line where treble's E4 is
pub fn clef_step_shift(clef: &str) -> i32 {
    match clef {
        "bass" => 12,
        "baritone-f" | "baritone-c" => 10,
        "subbass" => 14,
        "alto" => 6,
        "tenor" => 8,
        "soprano" => 2,
        "mezzo-soprano" => 4,
        "french" => -2,
        _ => 0,
    }
}

static KEY_FIFTHS: Lazy<HashMap<&'static str, i8>> = Lazy::new(|| {
    let majors = ["Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#"];
    let minors = [
        "Abm", "Ebm", "Bbm", "Fm", "Cm", "Gm", "Dm", "Am", "Em", "Bm", "F#m", "C#m", "G#m", "D#m", "A#m",
    ];
    let mut table = HashMap::new();
    for (i, name) in majors.iter().enumerate() {
        table.insert(*name, i as i8 - 7);
    }
    for (i, name) in minors.iter().enumerate() {
        table.insert(*name, i as i8 - 7);
    }
    table
});

const SHARP_ORDER: [char; 7] = ['F', 'C', 'G', 'D', 'A', 'E', 'B'];
const FLAT_ORDER: [char; 7] = ['B', 'E', 'A', 'D', 'G', 'C', 'F'];

/// Circle-of-fifths position of a key name (`"D"`, `"Bb"`, `"F#m"`)
pub fn key_fifths(key: &str) -> Result<i8> {
    KEY_FIFTHS
        .get(key)
        .copied()
        .ok_or_else(|| ScoreError::invalid_ir(format!("Unknown key signature '{}'", key)))
}

/// Per-letter accidentals implied by a key signature
pub fn key_signature_table(key: &str) -> Result<[Option<Accidental>; 7]> {
    let fifths = key_fifths(key)?;
    let mut table = [None; 7];
    if fifths > 0 {
        for letter in SHARP_ORDER.iter().take(fifths as usize) {
            table[letter_index(*letter)] = Some(Accidental::Sharp);
        }
    } else {
        for letter in FLAT_ORDER.iter().take((-fifths) as usize) {
            table[letter_index(*letter)] = Some(Accidental::Flat);
        }
    }
    Ok(table)
}

/// Key name for a MusicXML `<fifths>` value
pub fn fifths_to_key(fifths: i32, minor: bool) -> Option<&'static str> {
    const MAJOR: [&str; 15] = ["Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#"];
    const MINOR: [&str; 15] = [
        "Abm", "Ebm", "Bbm", "Fm", "Cm", "Gm", "Dm", "Am", "Em", "Bm", "F#m", "C#m", "G#m", "D#m", "A#m",
    ];
    if !(-7..=7).contains(&fifths) {
        return None;
    }
    let index = (fifths + 7) as usize;
    Some(if minor { MINOR[index] } else { MAJOR[index] })
}

/// Number of accidentals drawn for a key signature
pub fn key_accidental_count(key: &str) -> Result<usize> {
    Ok(key_fifths(key)?.unsigned_abs() as usize)
}
