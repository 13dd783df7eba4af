//! `<note>` entries to IR voices
//!
//! Notes arrive in document order as plain extracted values. Durations are
//! only computed here, against the measure's attribute snapshot, so bad
//! arithmetic surfaces when a measure is requested.

use super::attributes::{Attributes, MAX_STAVES};
use crate::error::{Result, ScoreError};
use crate::ir::duration::{
    checked_product, nearest_duration, note_value_from_type, ticks_to_duration, MAX_NOTE_TICKS,
};
use crate::ir::pitch::{clef_step_shift, Accidental, Pitch};
use crate::ir::{NoteObject, NoteState, StemDirection, Ticks, TimeObject, Tuplet, VoiceObject, RESOLUTION};
use std::collections::BTreeMap;

/// Values pulled from one `<note>` element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNote {
    pub grace: bool,
    pub chord: bool,
    pub rest: bool,
    pub step: Option<String>,
    pub alter: Option<String>,
    pub octave: Option<String>,
    pub display_step: Option<String>,
    pub display_octave: Option<String>,
    pub duration: Option<String>,
    pub note_type: Option<String>,
    pub dots: u32,
    pub voice: Option<String>,
    pub staff: Option<String>,
    /// `type` of every `<tie>` and `<notations><tied>`, in order
    pub ties: Vec<String>,
    /// Text of every `<beam>`
    pub beams: Vec<String>,
    /// `<actual-notes>` and `<normal-notes>`
    pub time_modification: Option<(String, String)>,
    pub stem: Option<String>,
    pub lyric: Option<String>,
}

struct VoiceDraft {
    stave: usize,
    notes: Vec<NoteObject>,
}

/// Voices of one part in one measure, densely renumbered
pub fn build_voices(notes: &[RawNote], attributes: &Attributes) -> Result<Vec<VoiceObject>> {
    let mut drafts: BTreeMap<u32, VoiceDraft> = BTreeMap::new();
    let mut previous: Option<(u32, usize)> = None;

    for raw in notes {
        if raw.grace {
            log::warn!("Dropping grace note");
            continue;
        }

        if raw.chord {
            if raw.rest {
                log::warn!("Dropping rest marked as a chord member");
                continue;
            }
            if let Some((voice, index)) = previous {
                if let Some(note) = drafts.get_mut(&voice).and_then(|d| d.notes.get_mut(index)) {
                    note.keys.push(pitch_key(raw)?);
                    continue;
                }
            }
        }

        let number = raw
            .voice
            .as_deref()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(1);
        let staff = staff_index(raw);
        let note = build_note(raw, attributes, staff)?;

        let draft = drafts.entry(number).or_insert_with(|| VoiceDraft { stave: staff, notes: Vec::new() });
        draft.notes.push(note);
        previous = Some((number, draft.notes.len() - 1));
    }

    let time: TimeObject = attributes.time.into();
    Ok(drafts
        .into_values()
        .filter(|draft| !draft.notes.is_empty())
        .map(|draft| VoiceObject {
            time: Some(time.clone()),
            stave: Some(draft.stave),
            key: attributes.key.clone(),
            notes: draft.notes,
        })
        .collect())
}

/// 0-based stave of a note; out-of-range staff numbers fall back to staff 1
pub fn staff_index(raw: &RawNote) -> usize {
    let staff = raw.staff.as_deref().and_then(|s| s.trim().parse::<usize>().ok()).unwrap_or(1);
    if staff > MAX_STAVES {
        log::warn!("Placing note on staff 1 instead of staff {}", staff);
        return 0;
    }
    staff.saturating_sub(1)
}

fn build_note(raw: &RawNote, attributes: &Attributes, staff: usize) -> Result<NoteObject> {
    let ticks = duration_ticks(raw, attributes)?;

    let (tuplet, multiplier) = match &raw.time_modification {
        Some((actual, normal)) => {
            let actual = parse_count(actual, "actual-notes")?;
            let normal = parse_count(normal, "normal-notes")?;
            (
                Some(Tuplet { num_notes: actual, beats_occupied: normal }),
                Ticks::new(normal as u64, actual as u64),
            )
        }
        None => (None, Ticks::from_integer(1)),
    };
    // Written value before the tuplet scaling
    let intrinsic = checked_product(ticks, multiplier.recip())
        .ok_or_else(|| ScoreError::invalid_musicxml("Tuplet scaling overflows the note duration"))?;

    let mut duration = duration_code(raw, intrinsic);
    if raw.rest {
        duration.push('r');
    }

    let keys = if raw.rest {
        vec![rest_key(raw, attributes.clef(staff))]
    } else {
        vec![pitch_key(raw)?]
    };

    Ok(NoteObject {
        keys,
        accidentals: None,
        duration,
        rest: Some(raw.rest),
        stem_direction: match raw.stem.as_deref().map(str::trim) {
            Some("up") => Some(StemDirection::Up),
            Some("down") => Some(StemDirection::Down),
            _ => None,
        },
        beam: beam_state(&raw.beams),
        tie: tie_state(&raw.ties),
        tuplet,
        intrinsic_ticks: Some(intrinsic),
        tick_multiplier: tuplet.map(|_| multiplier),
        lyric: raw.lyric.clone(),
    })
}

/// `RESOLUTION / 4 * duration / divisions`
fn duration_ticks(raw: &RawNote, attributes: &Attributes) -> Result<Ticks> {
    let text = raw
        .duration
        .as_deref()
        .ok_or_else(|| ScoreError::invalid_musicxml("Note is missing <duration>"))?;
    let duration = text
        .trim()
        .parse::<u64>()
        .map_err(|_| ScoreError::invalid_musicxml(format!("Invalid <duration> value '{}'", text)))?;
    let divisions = attributes.divisions()?;
    let out_of_range = || {
        ScoreError::invalid_musicxml(format!(
            "<duration>{}</duration> is out of range at {} divisions",
            duration, divisions
        ))
    };
    let numer = RESOLUTION.checked_mul(duration).ok_or_else(out_of_range)?;
    let denom = divisions.checked_mul(4).ok_or_else(out_of_range)?;
    let ticks = Ticks::new(numer, denom);
    if ticks > Ticks::from_integer(MAX_NOTE_TICKS) {
        return Err(out_of_range());
    }
    Ok(ticks)
}

fn parse_count(text: &str, element: &str) -> Result<u32> {
    match text.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(ScoreError::invalid_musicxml(format!(
            "Invalid <{}> value '{}'",
            element, text
        ))),
        Ok(count) => Ok(count),
    }
}

fn duration_code(raw: &RawNote, intrinsic: Ticks) -> String {
    if let Some(value) = raw.note_type.as_deref().and_then(|t| note_value_from_type(t.trim())) {
        let mut code = value.to_string();
        for _ in 0..raw.dots {
            code.push('d');
        }
        return code;
    }
    match ticks_to_duration(intrinsic) {
        Some(code) => code.to_code(),
        None => {
            log::warn!("No duration code spells {} ticks exactly", intrinsic);
            nearest_duration(intrinsic).to_code()
        }
    }
}

fn pitch_key(raw: &RawNote) -> Result<String> {
    let step = raw
        .step
        .as_deref()
        .and_then(|s| s.trim().chars().next())
        .ok_or_else(|| ScoreError::invalid_musicxml("Pitched note is missing <step>"))?;
    let octave = raw
        .octave
        .as_deref()
        .and_then(|o| o.trim().parse::<i8>().ok())
        .ok_or_else(|| ScoreError::invalid_musicxml("Pitched note is missing <octave>"))?;
    // Microtonal alters round to the nearest semitone
    let alter = raw
        .alter
        .as_deref()
        .and_then(|a| a.trim().parse::<f64>().ok())
        .map(|a| a.round() as i8)
        .unwrap_or(0);
    let pitch = Pitch::new(step, Accidental::from_alteration(alter), octave);
    Pitch::parse(&pitch.to_string()).map_err(|_| {
        ScoreError::invalid_musicxml(format!("Invalid pitch step '{}'", step))
    })?;
    Ok(pitch.to_string())
}

/// Rest position: explicit display pitch, else the clef's middle line
fn rest_key(raw: &RawNote, clef: &str) -> String {
    if let (Some(step), Some(octave)) = (raw.display_step.as_deref(), raw.display_octave.as_deref()) {
        return format!("{}/{}", step.trim().to_ascii_lowercase(), octave.trim());
    }
    const STEP_LETTERS: [char; 7] = ['c', 'd', 'e', 'f', 'g', 'a', 'b'];
    // Middle line is staff line 3, four diatonic steps above the bottom line
    let step = 34 - clef_step_shift(clef);
    format!("{}/{}", STEP_LETTERS[step.rem_euclid(7) as usize], step.div_euclid(7))
}

/// `<tie>` start/stop markers folded into one state
pub fn tie_state(ties: &[String]) -> Option<NoteState> {
    ties.iter().fold(None, |state, tie| match (tie.trim(), state) {
        ("start", Some(NoteState::End)) | ("start", Some(NoteState::Continue)) => Some(NoteState::Continue),
        ("start", _) => Some(NoteState::Begin),
        ("stop", Some(NoteState::Begin)) | ("stop", Some(NoteState::Continue)) => Some(NoteState::Continue),
        ("stop", _) => Some(NoteState::End),
        ("continue", _) => Some(NoteState::Continue),
        _ => state,
    })
}

/// A `continue` on any beam level overrides begin/end
pub fn beam_state(beams: &[String]) -> Option<NoteState> {
    let mut state = None;
    for beam in beams {
        match beam.trim() {
            "continue" => return Some(NoteState::Continue),
            "begin" if state.is_none() => state = Some(NoteState::Begin),
            "end" if state.is_none() => state = Some(NoteState::End),
            _ => {}
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(divisions: &str) -> Attributes {
        Attributes { divisions: Some(divisions.into()), ..Default::default() }
    }

    fn note(step: &str, octave: &str, duration: &str) -> RawNote {
        RawNote {
            step: Some(step.into()),
            octave: Some(octave.into()),
            duration: Some(duration.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_tie_fold() {
        let s = |v: &[&str]| v.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        assert_eq!(tie_state(&s(&[])), None);
        assert_eq!(tie_state(&s(&["start", "start"])), Some(NoteState::Begin));
        assert_eq!(tie_state(&s(&["stop"])), Some(NoteState::End));
        assert_eq!(tie_state(&s(&["stop", "start"])), Some(NoteState::Continue));
        assert_eq!(tie_state(&s(&["start", "stop"])), Some(NoteState::Continue));
    }

    #[test]
    fn test_beam_continue_overrides() {
        let s = |v: &[&str]| v.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        assert_eq!(beam_state(&s(&["begin", "begin"])), Some(NoteState::Begin));
        assert_eq!(beam_state(&s(&["end", "continue"])), Some(NoteState::Continue));
        assert_eq!(beam_state(&s(&["forward hook"])), None);
    }

    #[test]
    fn test_durations_from_divisions() {
        let voices = build_voices(&[note("C", "4", "4"), note("D", "4", "2")], &attributes("2")).unwrap();
        let notes = &voices[0].notes;
        assert_eq!(notes[0].intrinsic_ticks, Some(Ticks::from_integer(RESOLUTION / 2)));
        assert_eq!(notes[0].duration, "2");
        assert_eq!(notes[1].duration, "4");
    }

    #[test]
    fn test_missing_divisions_is_invalid() {
        let result = build_voices(&[note("C", "4", "4")], &Attributes::default());
        assert!(matches!(result, Err(ScoreError::InvalidMusicXml(_))));
        let result = build_voices(&[note("C", "4", "x")], &attributes("1"));
        assert!(matches!(result, Err(ScoreError::InvalidMusicXml(_))));
    }

    #[test]
    fn test_chord_merges_into_previous_note() {
        let mut third = note("G", "4", "4");
        third.chord = true;
        let mut fifth = note("E", "4", "4");
        fifth.chord = true;
        let voices = build_voices(&[note("C", "4", "4"), fifth, third], &attributes("1")).unwrap();
        assert_eq!(voices[0].notes.len(), 1);
        assert_eq!(voices[0].notes[0].keys, vec!["C/4", "E/4", "G/4"]);
    }

    #[test]
    fn test_huge_duration_is_invalid() {
        let result = build_voices(&[note("C", "4", "2000000000000000")], &attributes("1"));
        assert!(matches!(result, Err(ScoreError::InvalidMusicXml(_))));
        // Fits in u64 but longer than any note
        let result = build_voices(&[note("C", "4", "1000")], &attributes("1"));
        assert!(matches!(result, Err(ScoreError::InvalidMusicXml(_))));
        let result = build_voices(&[note("C", "4", "1")], &attributes("18446744073709551615"));
        assert!(matches!(result, Err(ScoreError::InvalidMusicXml(_))));
    }

    #[test]
    fn test_chord_flagged_rest_is_dropped() {
        let mut rest = RawNote { rest: true, chord: true, duration: Some("1".into()), ..Default::default() };
        rest.voice = Some("1".into());
        let voices = build_voices(&[note("C", "4", "1"), rest], &attributes("1")).unwrap();
        assert_eq!(voices[0].notes.len(), 1);
        assert_eq!(voices[0].notes[0].keys, vec!["C/4"]);
    }

    #[test]
    fn test_tuplet_scaling() {
        let mut raw = note("C", "4", "2");
        raw.note_type = Some("eighth".into());
        raw.time_modification = Some(("3".into(), "2".into()));
        // divisions 6: an eighth triplet lasts 2 divisions
        let voices = build_voices(&[raw], &attributes("6")).unwrap();
        let note = &voices[0].notes[0];
        assert_eq!(note.tuplet, Some(Tuplet { num_notes: 3, beats_occupied: 2 }));
        assert_eq!(note.intrinsic_ticks, Some(Ticks::from_integer(RESOLUTION / 8)));
        assert_eq!(note.tick_multiplier, Some(Ticks::new(2, 3)));
        assert_eq!(note.duration, "8");
    }

    #[test]
    fn test_grace_notes_dropped_and_voices_renumbered() {
        let mut grace = note("B", "4", "0");
        grace.grace = true;
        let mut upper = note("E", "5", "4");
        upper.voice = Some("3".into());
        upper.staff = Some("2".into());
        let mut lower = note("C", "4", "4");
        lower.voice = Some("1".into());

        let voices = build_voices(&[grace, upper, lower], &attributes("1")).unwrap();
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].notes[0].keys, vec!["C/4"]);
        assert_eq!(voices[1].notes[0].keys, vec!["E/5"]);
        assert_eq!(voices[1].stave, Some(1));
    }

    #[test]
    fn test_rest_positions() {
        let rest = RawNote { rest: true, duration: Some("4".into()), ..Default::default() };
        let voices = build_voices(&[rest.clone()], &attributes("1")).unwrap();
        assert_eq!(voices[0].notes[0].keys, vec!["b/4"]);
        assert_eq!(voices[0].notes[0].duration, "1r");

        let mut bass = attributes("1");
        bass.clefs = vec![Some("bass".into())];
        let voices = build_voices(&[rest.clone()], &bass).unwrap();
        assert_eq!(voices[0].notes[0].keys, vec!["d/3"]);

        let mut displayed = rest;
        displayed.display_step = Some("E".into());
        displayed.display_octave = Some("5".into());
        let voices = build_voices(&[displayed], &attributes("1")).unwrap();
        assert_eq!(voices[0].notes[0].keys, vec!["e/5"]);
    }

    #[test]
    fn test_pitch_alteration_and_stem() {
        let mut raw = note("F", "4", "1");
        raw.alter = Some("1".into());
        raw.stem = Some("down".into());
        raw.lyric = Some("la".into());
        let voices = build_voices(&[raw], &attributes("1")).unwrap();
        let note = &voices[0].notes[0];
        assert_eq!(note.keys, vec!["F#/4"]);
        assert_eq!(note.stem_direction, Some(StemDirection::Down));
        assert_eq!(note.lyric.as_deref(), Some("la"));
    }
}
