//! Rendering oracle
//!
//! The formatter never measures glyphs itself. Everything it needs to know
//! about drawn sizes comes through [`RenderMetrics`]; a canvas-backed
//! renderer can supply exact values, and [`StandardMetrics`] gives a
//! deterministic approximation from configured glyph widths.

use super::layout::VoiceLayout;
use crate::config::GlyphWidths;
use crate::ir::pitch::{key_accidental_count, Pitch};
use crate::ir::{DurationCode, ModifierValue, Stave, StemDirection, Ticks};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Distance between two staff lines
pub const LINE_SPACING: f64 = 10.0;

/// Blank lines reserved above the top staff line inside a stave
pub const SPACE_ABOVE_LINES: f64 = 4.0;

pub const STEM_LENGTH: f64 = 35.0;

/// Lyric baseline below the bottom staff line
const LYRIC_OFFSET: f64 = 30.0;

/// Y of a staff line (0 = top line) for a stave whose top is at 0
pub fn y_for_line(line: f64) -> f64 {
    (SPACE_ABOVE_LINES + line) * LINE_SPACING
}

/// Whole notes carry no stem
fn has_stem(duration: &str) -> bool {
    DurationCode::parse(duration).map_or(true, |code| code.value > 1)
}

/// Axis-aligned box; `y` grows downwards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        BoundingBox { x, y, w, h }
    }

    /// Smallest box containing both
    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.w).max(other.x + other.w);
        let bottom = (self.y + self.h).max(other.y + other.h);
        BoundingBox { x, y, w: right - x, h: bottom - y }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// Size queries answered by the renderer
pub trait RenderMetrics {
    /// Width taken by clef, key and time modifiers plus stave padding
    fn furniture_width(&self, stave: &Stave) -> f64;

    /// Narrowest width all voices of a measure fit into when justified together
    fn min_total_width(&self, voices: &[VoiceLayout]) -> f64;

    /// Box of a voice relative to a stave at y = 0; `None` for an empty voice
    fn voice_bounding_box(&self, voice: &VoiceLayout) -> Option<BoundingBox>;

    /// Box of the five staff lines of a stave at y = 0
    fn stave_bounding_box(&self) -> BoundingBox {
        BoundingBox::new(0.0, y_for_line(0.0), 0.0, y_for_line(4.0) - y_for_line(0.0))
    }
}

/// Glyph-width approximation
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMetrics {
    glyphs: GlyphWidths,
}

impl StandardMetrics {
    pub fn new(glyphs: GlyphWidths) -> Self {
        StandardMetrics { glyphs }
    }

    fn tickable_width(&self, accidentals: usize, dots: u32) -> f64 {
        self.glyphs.notehead + accidentals as f64 * self.glyphs.accidental + dots as f64 * self.glyphs.dot
    }
}

impl Default for StandardMetrics {
    fn default() -> Self {
        StandardMetrics::new(GlyphWidths::default())
    }
}

impl RenderMetrics for StandardMetrics {
    fn furniture_width(&self, stave: &Stave) -> f64 {
        stave.modifiers().iter().fold(self.glyphs.stave_padding, |width, modifier| {
            width
                + match &modifier.value {
                    ModifierValue::Clef { .. } => self.glyphs.clef,
                    ModifierValue::Key { key } => {
                        key_accidental_count(key).unwrap_or(0) as f64 * self.glyphs.key_accidental
                    }
                    ModifierValue::Time { .. } => self.glyphs.time_signature,
                }
        })
    }

    /// Tickables starting at the same tick share a column; the widest wins
    fn min_total_width(&self, voices: &[VoiceLayout]) -> f64 {
        let mut columns: BTreeMap<Ticks, f64> = BTreeMap::new();
        for voice in voices {
            for tickable in &voice.tickables {
                let marks = tickable.accidentals.iter().filter(|a| a.is_some()).count();
                let width = self.tickable_width(marks, tickable.dots);
                let column = columns.entry(tickable.start).or_insert(0.0);
                *column = column.max(width);
            }
        }
        columns.values().sum()
    }

    fn voice_bounding_box(&self, voice: &VoiceLayout) -> Option<BoundingBox> {
        let mut bounds: Option<(f64, f64)> = None;
        let mut extend = |top: f64, bottom: f64| {
            bounds = Some(match bounds {
                Some((t, b)) => (t.min(top), b.max(bottom)),
                None => (top, bottom),
            });
        };

        for tickable in &voice.tickables {
            if tickable.rest {
                extend(y_for_line(1.0), y_for_line(3.0));
                continue;
            }
            let lines: Vec<f64> = tickable
                .keys
                .iter()
                .filter_map(|key| Pitch::parse(key).ok())
                .map(|pitch| pitch.staff_line(&voice.clef))
                .collect();
            if lines.is_empty() {
                continue;
            }
            let highest = lines.iter().cloned().fold(f64::MIN, f64::max);
            let lowest = lines.iter().cloned().fold(f64::MAX, f64::min);
            let top = y_for_line(5.0 - highest) - LINE_SPACING / 2.0;
            let bottom = y_for_line(5.0 - lowest) + LINE_SPACING / 2.0;

            let average = lines.iter().sum::<f64>() / lines.len() as f64;
            let stem = tickable.stem_direction.unwrap_or(if average < 3.0 {
                StemDirection::Up
            } else {
                StemDirection::Down
            });
            let stemmed = has_stem(&tickable.duration);
            match stem {
                StemDirection::Up if stemmed => extend(top - STEM_LENGTH + LINE_SPACING / 2.0, bottom),
                StemDirection::Down if stemmed => extend(top, bottom + STEM_LENGTH - LINE_SPACING / 2.0),
                _ => extend(top, bottom),
            }

            if tickable.lyric.is_some() {
                extend(top, y_for_line(4.0) + LYRIC_OFFSET);
            }
        }

        let (top, bottom) = bounds?;
        Some(BoundingBox::new(0.0, top, self.min_total_width(std::slice::from_ref(voice)), bottom - top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::layout::Tickable;
    use crate::ir::{Modifier, TimeSignature};

    fn tickable(keys: &[&str], duration: &str, start: i64) -> Tickable {
        Tickable {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            duration: duration.into(),
            ticks: Ticks::from_integer(4096),
            start: Ticks::from_integer(start as u64),
            accidentals: vec![None; keys.len()],
            dots: 0,
            rest: false,
            stem_direction: None,
            lyric: None,
        }
    }

    fn voice(tickables: Vec<Tickable>) -> VoiceLayout {
        VoiceLayout {
            stave: 0,
            time: TimeSignature::default(),
            soft: false,
            clef: "treble".into(),
            tickables,
            beams: Vec::new(),
            ties: Vec::new(),
            tuplets: Vec::new(),
        }
    }

    #[test]
    fn test_merge() {
        let a = BoundingBox::new(0.0, 40.0, 100.0, 40.0);
        let b = BoundingBox::new(10.0, 20.0, 20.0, 90.0);
        assert_eq!(a.merge(&b), BoundingBox::new(0.0, 20.0, 100.0, 90.0));
        assert_eq!(a.merge(&b).bottom(), 110.0);
    }

    #[test]
    fn test_furniture_width() {
        let metrics = StandardMetrics::default();
        let mut stave = Stave::with_defaults(TimeSignature::default(), Some("treble".into()), None, None);
        assert_eq!(metrics.furniture_width(&stave), 10.0);
        stave.push_modifier(Modifier::clef("treble", true));
        stave.push_modifier(Modifier::key("D", true));
        stave.push_modifier(Modifier::time("4/4", true));
        assert_eq!(metrics.furniture_width(&stave), 10.0 + 30.0 + 20.0 + 20.0);
    }

    #[test]
    fn test_min_total_width_shares_columns() {
        let metrics = StandardMetrics::default();
        let mut sharp = tickable(&["c/4"], "4", 0);
        sharp.accidentals = vec![Some("#".into())];
        let upper = voice(vec![sharp, tickable(&["d/4"], "4", 4096)]);
        let lower = voice(vec![tickable(&["c/3"], "2", 0)]);
        assert_eq!(metrics.min_total_width(&[upper, lower]), 18.0 + 10.0);
    }

    #[test]
    fn test_voice_bounding_box() {
        let metrics = StandardMetrics::default();
        assert!(metrics.voice_bounding_box(&voice(Vec::new())).is_none());

        // B4 sits on the middle line: stem goes down
        let bbox = metrics.voice_bounding_box(&voice(vec![tickable(&["b/4"], "4", 0)])).unwrap();
        assert_eq!(bbox.y, 55.0);
        assert_eq!(bbox.bottom(), 60.0 + 35.0);

        // C6 sits two lines above the staff
        let mut high = tickable(&["c/6"], "4", 0);
        high.stem_direction = Some(StemDirection::Up);
        let bbox = metrics.voice_bounding_box(&voice(vec![high.clone()])).unwrap();
        assert_eq!(bbox.y, 15.0 - 30.0);

        high.duration = "1".into();
        let bbox = metrics.voice_bounding_box(&voice(vec![high])).unwrap();
        assert_eq!((bbox.y, bbox.h), (15.0, 10.0));
    }
}
