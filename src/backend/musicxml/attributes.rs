//! `<attributes>` deltas and the per-part fold that turns them into snapshots
//!
//! A delta holds only what one measure declared. The snapshot for measure *m*
//! of a part is every delta of measures `0..=m` applied in order: scalars
//! overwrite, clefs merge per staff so an undeclared staff keeps its clef.

use crate::error::{Result, ScoreError};
use crate::ir::pitch::fifths_to_key;
use crate::ir::TimeSignature;

/// Highest staff number accepted from `<staves>`, `<clef number>` and `<staff>`
pub const MAX_STAVES: usize = 16;

/// Attribute values declared inside one measure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDelta {
    /// Raw `<divisions>` text, validated when durations are computed
    pub divisions: Option<String>,
    pub key: Option<String>,
    pub time: Option<TimeSignature>,
    /// `"C"` / `"C|"` for symbol times
    pub time_label: Option<String>,
    /// Clef per staff (index 0 = staff 1); `None` leaves a staff unchanged
    pub clefs: Vec<Option<String>>,
    pub staves: Option<usize>,
}

impl AttributeDelta {
    pub fn is_empty(&self) -> bool {
        *self == AttributeDelta::default()
    }

    pub fn set_clef(&mut self, staff: usize, clef: String) {
        if staff > MAX_STAVES {
            log::warn!("Ignoring clef on staff {}", staff);
            return;
        }
        let index = staff.saturating_sub(1);
        if self.clefs.len() <= index {
            self.clefs.resize(index + 1, None);
        }
        self.clefs[index] = Some(clef);
    }

    /// Later declarations in the same measure win
    pub fn merge(&mut self, later: AttributeDelta) {
        if later.divisions.is_some() {
            self.divisions = later.divisions;
        }
        if later.key.is_some() {
            self.key = later.key;
        }
        if later.time.is_some() {
            self.time = later.time;
            self.time_label = later.time_label;
        }
        if later.staves.is_some() {
            self.staves = later.staves;
        }
        for (index, clef) in later.clefs.into_iter().enumerate() {
            if let Some(clef) = clef {
                self.set_clef(index + 1, clef);
            }
        }
    }
}

/// Effective attributes of one part at one measure
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    pub divisions: Option<String>,
    pub key: Option<String>,
    pub time: TimeSignature,
    pub time_label: Option<String>,
    pub clefs: Vec<Option<String>>,
    pub staves: usize,
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes {
            divisions: None,
            key: None,
            time: TimeSignature::soft_common(),
            time_label: None,
            clefs: Vec::new(),
            staves: 1,
        }
    }
}

impl Attributes {
    /// Snapshot after applying `delta`
    pub fn apply(&self, delta: &AttributeDelta) -> Attributes {
        let mut next = self.clone();
        if let Some(divisions) = &delta.divisions {
            next.divisions = Some(divisions.clone());
        }
        if let Some(key) = &delta.key {
            next.key = Some(key.clone());
        }
        if let Some(time) = delta.time {
            next.time = time;
            next.time_label = delta.time_label.clone();
        }
        if let Some(staves) = delta.staves {
            next.staves = staves.max(1);
        }
        if next.clefs.len() < delta.clefs.len() {
            next.clefs.resize(delta.clefs.len(), None);
        }
        for (slot, clef) in next.clefs.iter_mut().zip(&delta.clefs) {
            if let Some(clef) = clef {
                *slot = Some(clef.clone());
            }
        }
        next
    }

    /// One snapshot per delta, in order
    pub fn fold<'a>(deltas: impl IntoIterator<Item = &'a AttributeDelta>) -> Vec<Attributes> {
        let mut current = Attributes::default();
        deltas
            .into_iter()
            .map(|delta| {
                current = current.apply(delta);
                current.clone()
            })
            .collect()
    }

    /// Clef of a staff (0-based), falling back to staff 1 then treble
    pub fn clef(&self, staff: usize) -> &str {
        self.clefs
            .get(staff)
            .and_then(|c| c.as_deref())
            .or_else(|| self.clefs.first().and_then(|c| c.as_deref()))
            .unwrap_or(crate::ir::measure::DEFAULT_CLEF)
    }

    /// Divisions per quarter note
    pub fn divisions(&self) -> Result<u64> {
        let text = self
            .divisions
            .as_deref()
            .ok_or_else(|| ScoreError::invalid_musicxml("Note duration requires <divisions>"))?;
        match text.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ScoreError::invalid_musicxml(format!(
                "Invalid <divisions> value '{}'",
                text
            ))),
            Ok(divisions) => Ok(divisions),
        }
    }
}

/// Clef name for a `<sign>`/`<line>` pair
pub fn decode_clef(sign: &str, line: Option<u32>) -> &'static str {
    match (sign.trim(), line) {
        ("G", Some(1)) => "french",
        ("G", _) => "treble",
        ("F", Some(3)) => "baritone-f",
        ("F", Some(5)) => "subbass",
        ("F", _) => "bass",
        ("C", Some(1)) => "soprano",
        ("C", Some(2)) => "mezzo-soprano",
        ("C", Some(4)) => "tenor",
        ("C", Some(5)) => "baritone-c",
        ("C", _) => "alto",
        ("percussion", _) => "percussion",
        (other, _) => {
            log::warn!("Unknown clef sign '{}', using treble", other);
            "treble"
        }
    }
}

/// Key name for `<fifths>` and `<mode>`
pub fn decode_key(fifths: &str, mode: Option<&str>) -> Option<String> {
    let fifths = fifths.trim().parse::<i32>().ok()?;
    let minor = mode.map(str::trim) == Some("minor");
    fifths_to_key(fifths, minor).map(String::from)
}

/// Time signature and optional symbol label for a `<time>` element
pub fn decode_time(
    beats: Option<&str>,
    beat_type: Option<&str>,
    symbol: Option<&str>,
) -> Option<(TimeSignature, Option<String>)> {
    match symbol {
        Some("common") => return Some((TimeSignature::default(), Some("C".to_string()))),
        Some("cut") => return TimeSignature::new(2, 2).ok().map(|t| (t, Some("C|".to_string()))),
        _ => {}
    }
    // Compound numerators like "3+2" add up
    let num_beats = beats?
        .split('+')
        .map(|part| part.trim().parse::<u32>().ok())
        .sum::<Option<u32>>()?;
    let beat_value = beat_type?.trim().parse::<u32>().ok()?;
    TimeSignature::new(num_beats, beat_value).ok().map(|t| (t, None))
}
