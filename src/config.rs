//! Formatter configuration
//!
//! Layout constants for the Liquid formatter and the glyph widths used by
//! [`crate::formatter::StandardMetrics`]. Hosts can override any subset from
//! JSON; missing fields keep their defaults.

use crate::error::{Result, ScoreError};
use serde::{Deserialize, Serialize};

/// Block width when none is given
pub const DEFAULT_WIDTH: f64 = 500.0;

/// Left margin of a block
pub const DEFAULT_LEFT_MARGIN: f64 = 10.0;

/// Left margin when the first measure of a block draws a brace
pub const DEFAULT_BRACE_LEFT_MARGIN: f64 = 15.0;

pub const DEFAULT_RIGHT_MARGIN: f64 = 10.0;

/// Floor for any measure's minimum width
pub const DEFAULT_MIN_MEASURE_WIDTH: f64 = 50.0;

/// Extra width per tickable in the busiest voice
pub const DEFAULT_TICKABLE_SPACING: f64 = 10.0;

pub const DEFAULT_MEASURE_PADDING: f64 = 10.0;

/// Vertical distance reserved per stave
pub const DEFAULT_STAVE_HEIGHT: f64 = 90.0;

/// Minimum space above the first stave
pub const DEFAULT_MIN_SPACE_ABOVE: f64 = 10.0;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FormatterConfig {
    /// Target block width in pixels
    pub width: f64,
    pub left_margin: f64,
    pub brace_left_margin: f64,
    pub right_margin: f64,
    pub min_measure_width: f64,
    pub tickable_spacing: f64,
    pub measure_padding: f64,
    pub stave_height: f64,
    pub min_space_above: f64,

    /// Glyph widths for the built-in metrics
    pub glyphs: GlyphWidths,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GlyphWidths {
    /// Space before the first glyph of every stave
    pub stave_padding: f64,
    pub clef: f64,
    /// Per accidental of a key signature
    pub key_accidental: f64,
    pub time_signature: f64,
    pub notehead: f64,
    pub accidental: f64,
    pub dot: f64,
}

impl Default for GlyphWidths {
    fn default() -> Self {
        GlyphWidths {
            stave_padding: 10.0,
            clef: 30.0,
            key_accidental: 10.0,
            time_signature: 20.0,
            notehead: 10.0,
            accidental: 8.0,
            dot: 5.0,
        }
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        FormatterConfig {
            width: DEFAULT_WIDTH,
            left_margin: DEFAULT_LEFT_MARGIN,
            brace_left_margin: DEFAULT_BRACE_LEFT_MARGIN,
            right_margin: DEFAULT_RIGHT_MARGIN,
            min_measure_width: DEFAULT_MIN_MEASURE_WIDTH,
            tickable_spacing: DEFAULT_TICKABLE_SPACING,
            measure_padding: DEFAULT_MEASURE_PADDING,
            stave_height: DEFAULT_STAVE_HEIGHT,
            min_space_above: DEFAULT_MIN_SPACE_ABOVE,
            glyphs: GlyphWidths::default(),
        }
    }
}

impl FormatterConfig {
    /// Parse a (possibly partial) JSON settings object
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FormatterConfig = serde_json::from_str(json)
            .map_err(|e| ScoreError::argument(format!("Invalid formatter config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_width(self.width)
    }

    /// Left margin of a block, by whether its first measure shows a brace
    pub fn block_left_margin(&self, brace: bool) -> f64 {
        if brace {
            self.brace_left_margin
        } else {
            self.left_margin
        }
    }
}

/// Block widths must be positive and finite
pub fn check_width(width: f64) -> Result<()> {
    if !width.is_finite() || width <= 0.0 {
        return Err(ScoreError::argument(format!("Invalid block width {}", width)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = FormatterConfig::from_json(r#"{"width": 800, "glyphs": {"clef": 25}}"#).unwrap();
        assert_eq!(config.width, 800.0);
        assert_eq!(config.right_margin, DEFAULT_RIGHT_MARGIN);
        assert_eq!(config.glyphs.clef, 25.0);
        assert_eq!(config.glyphs.notehead, 10.0);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(FormatterConfig::from_json("[1,"), Err(ScoreError::Argument(_))));
        assert!(matches!(FormatterConfig::from_json(r#"{"width": -5}"#), Err(ScoreError::Argument(_))));
        assert!(matches!(FormatterConfig::from_json(r#"{"width": 0}"#), Err(ScoreError::Argument(_))));
    }

    #[test]
    fn test_block_left_margin() {
        let config = FormatterConfig::default();
        assert_eq!(config.block_left_margin(false), 10.0);
        assert_eq!(config.block_left_margin(true), 15.0);
    }
}
