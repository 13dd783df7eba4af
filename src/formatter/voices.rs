//! IR voices to drawable voice layouts
//!
//! Beams run from a `begin` note through `end`; a tie links the last note
//! that opened one to the note that closes it; consecutive tuplet notes are
//! bracketed once `num_notes` of them have been seen.

use super::layout::{BeamGroup, TieLayout, Tickable, TupletGroup, VoiceLayout};
use crate::error::{Result, ScoreError};
use crate::ir::pitch::Pitch;
use crate::ir::{Measure, Note, NoteState, Ticks, Voice};

/// Layouts for every voice of a measure, in part order
pub fn voice_layouts(measure: &Measure) -> Result<Vec<VoiceLayout>> {
    let mut layouts = Vec::new();
    for (part_index, part) in measure.parts().iter().enumerate() {
        let first_stave = measure.first_stave_of_part(part_index);
        for voice in part.voices() {
            let stave = part.stave(voice.stave).ok_or_else(|| {
                ScoreError::invalid_ir(format!(
                    "Voice should have a valid stave, part {} has no stave {}",
                    part_index, voice.stave
                ))
            })?;
            let clef = stave.clef.clone().ok_or_else(|| {
                ScoreError::invalid_ir(format!("Stave {} of part {} has no clef", voice.stave, part_index))
            })?;
            layouts.push(voice_layout(voice, first_stave + voice.stave, clef));
        }
    }
    Ok(layouts)
}

fn voice_layout(voice: &Voice, stave: usize, clef: String) -> VoiceLayout {
    let mut layout = VoiceLayout {
        stave,
        time: voice.time,
        soft: voice.time.soft,
        clef,
        tickables: Vec::with_capacity(voice.notes().len()),
        beams: Vec::new(),
        ties: Vec::new(),
        tuplets: Vec::new(),
    };

    let mut start = Ticks::from_integer(0);
    let mut beam: Option<Vec<usize>> = None;
    let mut tied_note: Option<usize> = None;
    let mut tuplet: Option<TupletGroup> = None;

    for (index, note) in voice.notes().iter().enumerate() {
        layout.tickables.push(tickable(note, start));
        start += note.ticks();

        match note.beam {
            Some(NoteState::Begin) => {
                if beam.is_some() {
                    log::warn!("Beam restarted before it ended");
                }
                beam = Some(vec![index]);
            }
            Some(state) => {
                if let Some(notes) = beam.as_mut() {
                    notes.push(index);
                    if state == NoteState::End {
                        layout.beams.push(BeamGroup { notes: beam.take().unwrap_or_default() });
                    }
                }
            }
            None => {}
        }

        if matches!(note.tie, Some(NoteState::End) | Some(NoteState::Continue)) {
            match tied_note {
                Some(first) => layout.ties.push(TieLayout {
                    first_note: first,
                    last_note: index,
                    key_pairs: tie_key_pairs(&voice.notes()[first], note),
                }),
                None => log::warn!("Tie ends on note {} without a start", index),
            }
        }
        if matches!(note.tie, Some(NoteState::Begin) | Some(NoteState::Continue)) {
            tied_note = Some(index);
        }

        match (note.tuplet, tuplet.as_mut()) {
            (Some(_), Some(group)) => group.notes.push(index),
            (Some(descriptor), None) => {
                tuplet = Some(TupletGroup {
                    notes: vec![index],
                    num_notes: descriptor.num_notes,
                    beats_occupied: descriptor.beats_occupied,
                })
            }
            (None, Some(group)) => {
                log::warn!("Tuplet interrupted after {} of {} notes", group.notes.len(), group.num_notes);
                tuplet = None;
            }
            (None, None) => {}
        }
        if tuplet.as_ref().map_or(false, |g| g.notes.len() == g.num_notes as usize) {
            layout.tuplets.extend(tuplet.take());
        }
    }

    if beam.is_some() {
        log::warn!("Dropping unterminated beam");
    }
    layout
}

fn tickable(note: &Note, start: Ticks) -> Tickable {
    Tickable {
        keys: note.keys.clone(),
        duration: note.duration.clone(),
        ticks: note.ticks(),
        start,
        accidentals: note.accidentals.clone().unwrap_or_else(|| vec![None; note.keys.len()]),
        dots: note.dots,
        rest: note.rest,
        stem_direction: note.stem_direction,
        lyric: note.lyric.clone(),
    }
}

/// Chord members tied by pitch; chords sharing no pitch pair up in order
fn tie_key_pairs(first: &Note, last: &Note) -> Vec<(usize, usize)> {
    let pitches = |note: &Note| -> Vec<Option<(char, i8, i8)>> {
        note.keys
            .iter()
            .map(|key| Pitch::parse(key).ok().map(|p| (p.letter, p.alteration(), p.octave)))
            .collect()
    };
    let (from, to) = (pitches(first), pitches(last));

    let matched: Vec<(usize, usize)> = from
        .iter()
        .enumerate()
        .filter_map(|(i, pitch)| {
            let pitch = (*pitch)?;
            to.iter().position(|other| *other == Some(pitch)).map(|j| (i, j))
        })
        .collect();
    if !matched.is_empty() {
        return matched;
    }
    (0..first.keys.len().min(last.keys.len())).map(|i| (i, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{MeasureObject, NoteObject, Tuplet};
    use serde_json::json;

    fn measure(value: serde_json::Value) -> Measure {
        let object: MeasureObject = serde_json::from_value(value).unwrap();
        Measure::new(object).unwrap()
    }

    fn note(keys: &[&str], duration: &str) -> serde_json::Value {
        json!({"keys": keys, "duration": duration})
    }

    #[test]
    fn test_global_stave_indices() {
        let measure = measure(json!({
            "time": {"num_beats": 4, "beat_value": 4},
            "parts": [
                {"num_staves": 2, "voices": [{"stave": 1, "notes": [note(&["c/3"], "1")]}]},
                {"clef": "alto", "voices": [{"notes": [note(&["c/4"], "1")]}]}
            ]
        }));
        let layouts = voice_layouts(&measure).unwrap();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].stave, 1);
        assert_eq!(layouts[1].stave, 2);
        assert_eq!(layouts[1].clef, "alto");
    }

    #[test]
    fn test_beams_ties_and_starts() {
        let measure = measure(json!({
            "time": {"num_beats": 4, "beat_value": 4},
            "parts": [{"voices": [{"notes": [
                {"keys": ["c/4"], "duration": "8", "beam": "begin", "tie": "begin"},
                {"keys": ["c/4"], "duration": "8", "beam": "continue", "tie": "continue"},
                {"keys": ["c/4", "e/4"], "duration": "8", "beam": "end", "tie": "end"},
                {"keys": ["g/4"], "duration": "8", "beam": "continue"},
                {"keys": ["g/4"], "duration": "2"}
            ]}]}]
        }));
        let layout = &voice_layouts(&measure).unwrap()[0];

        assert_eq!(layout.beams, vec![BeamGroup { notes: vec![0, 1, 2] }]);
        assert_eq!(
            layout.ties,
            vec![
                TieLayout { first_note: 0, last_note: 1, key_pairs: vec![(0, 0)] },
                TieLayout { first_note: 1, last_note: 2, key_pairs: vec![(0, 0)] },
            ]
        );
        assert_eq!(layout.tickables[3].start, Ticks::from_integer(3 * 2048));
        assert_eq!(layout.tickables[2].accidentals, vec![None, None]);
    }

    #[test]
    fn test_tuplet_grouping() {
        let mut measure = measure(json!({"time": {"num_beats": 2, "beat_value": 4}}));
        for _ in 0..4 {
            let mut object = NoteObject::new(vec!["a/4"], "8");
            object.tuplet = Some(Tuplet { num_notes: 3, beats_occupied: 2 });
            object.tick_multiplier = Some(Ticks::new(2, 3));
            measure.add_note(object).unwrap();
        }
        let layout = &voice_layouts(&measure).unwrap()[0];
        assert_eq!(layout.tickables.len(), 4);
        assert_eq!(layout.tuplets.len(), 1);
        assert_eq!(layout.tuplets[0].notes, vec![0, 1, 2]);
        assert_eq!(layout.tickables[3].start, Ticks::from_integer(4096));
    }

    #[test]
    fn test_tie_pairs_match_pitches() {
        let first = Note::new(NoteObject::new(vec!["c/4", "e/4", "g/4"], "4")).unwrap();
        let last = Note::new(NoteObject::new(vec!["e/4", "g/4"], "4")).unwrap();
        assert_eq!(tie_key_pairs(&first, &last), vec![(1, 0), (2, 1)]);

        let other = Note::new(NoteObject::new(vec!["d/4"], "4")).unwrap();
        assert_eq!(tie_key_pairs(&first, &other), vec![(0, 0)]);
    }

    #[test]
    fn test_stave_without_clef_is_invalid() {
        let mut measure = measure(json!({"time": {"num_beats": 4, "beat_value": 4}}));
        measure.stave_mut(0).unwrap().clef = None;
        assert!(matches!(voice_layouts(&measure), Err(ScoreError::InvalidIr(_))));
    }
}
