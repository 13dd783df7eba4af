//! Duration codes and tick arithmetic
//!
//! Durations use the renderer vocabulary: a note value (`1`, `2`, `4` ...
//! `128`, or `w`/`h`/`q`), any number of `d` dots, and an optional type
//! suffix (`r` for rests, `n` for ordinary notes).

use crate::error::{Result, ScoreError};
use num_rational::Ratio;

/// Tick values are exact rationals
pub type Ticks = Ratio<u64>;

/// Ticks in a whole note
pub const RESOLUTION: u64 = 16384;

/// Longest duration one note may take: 64 whole notes
pub const MAX_NOTE_TICKS: u64 = RESOLUTION * 64;

/// Most dots a duration code may carry
const MAX_DOTS: usize = 8;

const NOTE_VALUES: [u32; 8] = [1, 2, 4, 8, 16, 32, 64, 128];

/// A parsed duration code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationCode {
    /// Note value (1 = whole, 4 = quarter, ...)
    pub value: u32,
    pub dots: u32,
    pub rest: bool,
}

impl DurationCode {
    /// Parse a code such as `"4"`, `"8d"`, `"2r"` or `"qdr"`
    pub fn parse(code: &str) -> Result<Self> {
        let invalid = || ScoreError::invalid_ir(format!("Invalid duration code '{}'", code));

        let digits_end = code
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(code.len());

        let (value, rest_of_code) = if digits_end > 0 {
            let value: u32 = code[..digits_end].parse().map_err(|_| invalid())?;
            (value, &code[digits_end..])
        } else {
            let mut chars = code.chars();
            let value = match chars.next() {
                Some('w') => 1,
                Some('h') => 2,
                Some('q') => 4,
                _ => return Err(invalid()),
            };
            (value, chars.as_str())
        };

        if !NOTE_VALUES.contains(&value) {
            return Err(invalid());
        }

        let dots = rest_of_code.chars().take_while(|&c| c == 'd').count();
        if dots > MAX_DOTS {
            return Err(invalid());
        }
        let suffix = &rest_of_code[dots..];
        let rest = match suffix {
            "" | "n" => false,
            "r" => true,
            _ => return Err(invalid()),
        };

        Ok(DurationCode { value, dots: dots as u32, rest })
    }

    /// Intrinsic ticks of the code, dots included
    pub fn ticks(&self) -> Ticks {
        let base = Ticks::new(RESOLUTION, self.value as u64);
        let mut total = base;
        let mut increment = base;
        for _ in 0..self.dots {
            increment /= 2;
            total += increment;
        }
        total
    }

    /// Render back to a code string
    pub fn to_code(&self) -> String {
        let mut code = self.value.to_string();
        for _ in 0..self.dots {
            code.push('d');
        }
        if self.rest {
            code.push('r');
        }
        code
    }
}

/// `a * b`, or `None` when a term overflows `u64`
pub fn checked_product(a: Ticks, b: Ticks) -> Option<Ticks> {
    let numer = a.numer().checked_mul(*b.numer())?;
    let denom = a.denom().checked_mul(*b.denom())?;
    Some(Ticks::new(numer, denom))
}

/// Find the duration code (value plus up to three dots) whose ticks equal `ticks`
pub fn ticks_to_duration(ticks: Ticks) -> Option<DurationCode> {
    for &value in NOTE_VALUES.iter() {
        for dots in 0..=3 {
            let candidate = DurationCode { value, dots, rest: false };
            if candidate.ticks() == ticks {
                return Some(candidate);
            }
        }
    }
    None
}

/// Closest code whose ticks do not exceed `ticks`, for durations no code spells exactly
pub fn nearest_duration(ticks: Ticks) -> DurationCode {
    ticks_to_duration(ticks).unwrap_or_else(|| {
        let value = NOTE_VALUES
            .iter()
            .copied()
            .find(|&v| Ticks::new(RESOLUTION, v as u64) <= ticks)
            .unwrap_or(128);
        DurationCode { value, dots: 0, rest: false }
    })
}

/// MusicXML `<type>` names to note values
pub fn note_value_from_type(type_name: &str) -> Option<u32> {
    match type_name {
        "whole" => Some(1),
        "half" => Some(2),
        "quarter" => Some(4),
        "eighth" => Some(8),
        "16th" => Some(16),
        "32nd" => Some(32),
        "64th" => Some(64),
        "128th" => Some(128),
        _ => None,
    }
}
