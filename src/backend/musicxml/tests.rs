//! Unit tests for the MusicXML backend

use super::*;
use crate::backend::ConnectorKind;
use crate::ir::{ModifierKind, NoteState, StemDirection, Ticks, Tuplet, RESOLUTION};

fn parse(xml: &str) -> MusicXmlBackend {
    let mut backend = MusicXmlBackend::default();
    backend.parse(&Source::Text(xml)).expect("MusicXML should parse");
    backend
}

fn score(part_list: &str, parts: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>{}</part-list>
  {}
</score-partwise>"#,
        part_list, parts
    )
}

#[test]
fn test_single_whole_note() {
    let musicxml = score(
        r#"<score-part id="P1"><part-name>Music</part-name></score-part>"#,
        r#"<part id="P1">
    <measure number="1">
      <attributes>
        <divisions>1</divisions>
        <key><fifths>0</fifths></key>
        <time><beats>4</beats><beat-type>4</beat-type></time>
        <clef><sign>G</sign><line>2</line></clef>
      </attributes>
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>4</duration>
        <type>whole</type>
      </note>
    </measure>
  </part>"#,
    );

    let backend = parse(&musicxml);
    assert!(backend.is_valid());
    assert_eq!(backend.number_of_measures(), 1);

    let measure = backend.measure(0).unwrap();
    assert_eq!(measure.time.num_beats, 4);
    assert!(!measure.time.soft);
    assert_eq!(measure.attributes["number"], "1");

    let part = measure.part(0).unwrap();
    assert_eq!(part.stave(0).unwrap().clef.as_deref(), Some("treble"));
    let note = &part.voice(0).unwrap().notes()[0];
    assert_eq!(note.keys, vec!["C/4"]);
    assert_eq!(note.duration, "1");
    assert_eq!(note.ticks(), Ticks::from_integer(RESOLUTION));
}

#[test]
fn test_attributes_inherit_across_measures() {
    let musicxml = score(
        r#"<score-part id="P1"/>"#,
        r#"<part id="P1">
    <measure number="1">
      <attributes>
        <divisions>2</divisions>
        <key><fifths>2</fifths></key>
        <time><beats>3</beats><beat-type>4</beat-type></time>
        <staves>2</staves>
        <clef number="1"><sign>G</sign><line>2</line></clef>
        <clef number="2"><sign>F</sign><line>4</line></clef>
      </attributes>
      <note><pitch><step>F</step><alter>1</alter><octave>4</octave></pitch><duration>6</duration><staff>1</staff></note>
    </measure>
    <measure number="2">
      <attributes>
        <clef number="2"><sign>C</sign><line>4</line></clef>
      </attributes>
      <note><pitch><step>F</step><octave>4</octave></pitch><duration>6</duration><staff>1</staff></note>
    </measure>
  </part>"#,
    );

    let backend = parse(&musicxml);
    let first = backend.measure(0).unwrap();
    let second = backend.measure(1).unwrap();

    assert_eq!(second.time.num_beats, 3);
    let part = second.part(0).unwrap();
    assert_eq!(part.number_of_staves(), 2);
    assert_eq!(part.stave(0).unwrap().clef.as_deref(), Some("treble"));
    assert_eq!(part.stave(1).unwrap().clef.as_deref(), Some("tenor"));
    assert_eq!(part.stave(1).unwrap().key.as_deref(), Some("D"));
    assert!(first.shows_brace());

    // F# is in the key of D; a plain F needs a natural
    let first_note = &first.part(0).unwrap().voice(0).unwrap().notes()[0];
    assert_eq!(first_note.accidentals, Some(vec![None]));
    assert_eq!(first_note.duration, "2d");
    let second_note = &part.voice(0).unwrap().notes()[0];
    assert_eq!(second_note.accidentals, Some(vec![Some("n".to_string())]));
}

#[test]
fn test_missing_time_defaults_to_soft_common() {
    let musicxml = score(
        r#"<score-part id="P1"/>"#,
        r#"<part id="P1"><measure><attributes><divisions>1</divisions></attributes>
      <note><rest/><duration>1</duration></note></measure></part>"#,
    );
    let measure = parse(&musicxml).measure(0).unwrap();
    assert!(measure.time.soft);
    let note = &measure.part(0).unwrap().voice(0).unwrap().notes()[0];
    assert!(note.rest);
    assert_eq!(note.duration, "4r");
    assert_eq!(note.keys, vec!["b/4"]);
}

#[test]
fn test_chords_ties_beams_and_stems() {
    let musicxml = score(
        r#"<score-part id="P1"/>"#,
        r#"<part id="P1"><measure number="1">
      <attributes><divisions>2</divisions></attributes>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>1</duration>
        <type>eighth</type><stem>up</stem><beam number="1">begin</beam>
        <tie type="start"/><notations><tied type="start"/></notations></note>
      <note><chord/><pitch><step>E</step><octave>4</octave></pitch><duration>1</duration><type>eighth</type></note>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>1</duration>
        <type>eighth</type><beam number="1">end</beam>
        <tie type="stop"/><tie type="start"/></note>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>2</duration>
        <type>quarter</type><stem>down</stem><tie type="stop"/></note>
    </measure></part>"#,
    );
    let measure = parse(&musicxml).measure(0).unwrap();
    let notes = measure.part(0).unwrap().voice(0).unwrap().notes();

    assert_eq!(notes.len(), 3);
    assert_eq!(notes[0].keys, vec!["C/4", "E/4"]);
    assert_eq!(notes[0].stem_direction, Some(StemDirection::Up));
    assert_eq!(notes[0].beam, Some(NoteState::Begin));
    assert_eq!(notes[0].tie, Some(NoteState::Begin));
    assert_eq!(notes[1].beam, Some(NoteState::End));
    assert_eq!(notes[1].tie, Some(NoteState::Continue));
    assert_eq!(notes[2].tie, Some(NoteState::End));
    assert_eq!(notes[2].stem_direction, Some(StemDirection::Down));
}

#[test]
fn test_triplets() {
    let triplet = r#"<note><pitch><step>G</step><octave>4</octave></pitch><duration>1</duration>
        <type>eighth</type><time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes></time-modification></note>"#;
    let musicxml = score(
        r#"<score-part id="P1"/>"#,
        &format!(
            r#"<part id="P1"><measure><attributes><divisions>3</divisions>
            <time><beats>1</beats><beat-type>4</beat-type></time></attributes>{0}{0}{0}</measure></part>"#,
            triplet
        ),
    );
    let measure = parse(&musicxml).measure(0).unwrap();
    let voice = measure.part(0).unwrap().voice(0).unwrap();
    assert_eq!(voice.notes().len(), 3);
    assert_eq!(voice.notes()[0].tuplet, Some(Tuplet { num_notes: 3, beats_occupied: 2 }));
    assert_eq!(voice.notes()[0].duration, "8");
    assert_eq!(voice.ticks(), Ticks::from_integer(RESOLUTION / 4));
}

#[test]
fn test_multiple_voices_are_renumbered() {
    let musicxml = score(
        r#"<score-part id="P1"/>"#,
        r#"<part id="P1"><measure><attributes><divisions>1</divisions></attributes>
      <note><pitch><step>E</step><octave>5</octave></pitch><duration>4</duration><voice>2</voice></note>
      <backup><duration>4</duration></backup>
      <note><grace/><pitch><step>D</step><octave>4</octave></pitch><voice>5</voice></note>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration><voice>4</voice></note>
    </measure></part>"#,
    );
    let measure = parse(&musicxml).measure(0).unwrap();
    let part = measure.part(0).unwrap();
    assert_eq!(part.number_of_voices(), 2);
    assert_eq!(part.voice(0).unwrap().notes()[0].keys, vec!["E/5"]);
    assert_eq!(part.voice(1).unwrap().notes()[0].keys, vec!["C/4"]);
}

#[test]
fn test_measure_count_mismatch_is_invalid() {
    let musicxml = score(
        r#"<score-part id="P1"/><score-part id="P2"/>"#,
        r#"<part id="P1"><measure/><measure/></part><part id="P2"><measure/></part>"#,
    );
    let backend = parse(&musicxml);
    assert!(!backend.is_valid());
}

#[test]
fn test_part_groups() {
    let musicxml = score(
        r#"<part-group type="start" number="1"><group-symbol>bracket</group-symbol><group-barline>yes</group-barline></part-group>
      <score-part id="P1"/><score-part id="P2"/>
      <part-group type="stop" number="1"/>"#,
        r#"<part id="P1"><measure/></part><part id="P2"><measure/></part>"#,
    );
    let connectors = parse(&musicxml).stave_connectors();
    assert_eq!(
        connectors,
        vec![
            StaveConnector::system_start(ConnectorKind::Bracket, 0, 1),
            StaveConnector::group_barline(0, 1),
            StaveConnector::system_start(ConnectorKind::Single, 0, 1),
        ]
    );
}

#[test]
fn test_common_time_label() {
    let musicxml = score(
        r#"<score-part id="P1"/>"#,
        r#"<part id="P1"><measure><attributes><time symbol="common"><beats>4</beats><beat-type>4</beat-type></time></attributes></measure></part>"#,
    );
    let measure = parse(&musicxml).measure(0).unwrap();
    let stave = measure.stave(0).unwrap();
    assert_eq!(stave.time_label(), "C");
    assert!(stave.modifier(ModifierKind::Time).is_none());
}

#[test]
fn test_failure_policy() {
    let mut backend = MusicXmlBackend::default();
    let timewise = "<score-timewise></score-timewise>";
    assert!(matches!(backend.parse(&Source::Text(timewise)), Err(ScoreError::Argument(_))));
    assert!(matches!(backend.parse(&Source::Text("<score-partwise><part>")), Err(ScoreError::Argument(_))));

    let json = serde_json::json!({"type": "document"});
    assert!(matches!(backend.parse(&Source::Json(&json)), Err(ScoreError::Argument(_))));

    let musicxml = score(
        r#"<score-part id="P1"/>"#,
        r#"<part id="P1"><measure><note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note></measure></part>"#,
    );
    let backend = parse(&musicxml);
    assert!(matches!(backend.measure(0), Err(ScoreError::InvalidMusicXml(_))));
    assert!(matches!(backend.measure(1), Err(ScoreError::Argument(_))));
}

#[test]
fn test_overflowing_duration_is_invalid() {
    let musicxml = score(
        r#"<score-part id="P1"/>"#,
        r#"<part id="P1"><measure><attributes><divisions>1</divisions></attributes>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>2000000000000000</duration></note>
    </measure></part>"#,
    );
    assert!(matches!(parse(&musicxml).measure(0), Err(ScoreError::InvalidMusicXml(_))));
}

#[test]
fn test_staff_numbers_are_bounded() {
    let musicxml = score(
        r#"<score-part id="P1"/>"#,
        r#"<part id="P1"><measure><attributes><divisions>1</divisions><staves>1000000000</staves>
        <clef number="1000000000"><sign>F</sign><line>4</line></clef></attributes>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration><staff>999999999</staff></note>
    </measure></part>"#,
    );
    let measure = parse(&musicxml).measure(0).unwrap();
    let part = measure.part(0).unwrap();
    assert_eq!(part.number_of_staves(), 1);
    assert_eq!(part.stave(0).unwrap().clef.as_deref(), Some("treble"));
}

#[test]
fn test_chord_flagged_rest_is_dropped() {
    let musicxml = score(
        r#"<score-part id="P1"/>"#,
        r#"<part id="P1"><measure><attributes><divisions>1</divisions></attributes>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
      <note><chord/><rest/><duration>4</duration></note>
    </measure></part>"#,
    );
    let measure = parse(&musicxml).measure(0).unwrap();
    let notes = measure.part(0).unwrap().voice(0).unwrap().notes().to_vec();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].keys, vec!["C/4"]);
}

#[test]
fn test_appears_valid() {
    assert!(MusicXmlBackend::appears_valid(&Source::Text("<?xml?><SCORE-PARTWISE>")));
    assert!(!MusicXmlBackend::appears_valid(&Source::Text("{\"type\": \"document\"}")));

    let text = "<score-partwise/>";
    let doc = roxmltree::Document::parse(text).unwrap();
    assert!(MusicXmlBackend::appears_valid(&Source::Xml(&doc)));
    let mut backend = MusicXmlBackend::default();
    backend.parse(&Source::Xml(&doc)).unwrap();
    assert!(backend.is_valid());
    assert_eq!(backend.number_of_measures(), 0);
}
