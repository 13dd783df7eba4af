//! Extract owned values from a `<score-partwise>` tree using roxmltree

use super::attributes::{decode_clef, decode_key, decode_time, AttributeDelta, MAX_STAVES};
use super::notes::RawNote;
use super::part_groups::PartListEntry;
use super::{RawMeasure, RawScore};
use crate::error::{Result, ScoreError};
use roxmltree::{Document as XmlDocument, Node};

fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.tag_name().name() == name)
}

fn child_text(node: &Node, name: &str) -> Option<String> {
    child(node, name).and_then(|n| n.text()).map(|t| t.trim().to_string())
}

/// Parse XML text
pub fn read_text(xml_string: &str) -> Result<RawScore> {
    let doc = XmlDocument::parse(xml_string)
        .map_err(|e| ScoreError::argument(format!("Malformed MusicXML: {}", e)))?;
    read_document(&doc)
}

/// Walk an already-parsed tree
pub fn read_document(doc: &XmlDocument) -> Result<RawScore> {
    let root = doc.root_element();
    if root.tag_name().name() != "score-partwise" {
        return Err(ScoreError::argument(format!(
            "Only partwise scores are supported, found <{}>",
            root.tag_name().name()
        )));
    }

    let part_list = child(&root, "part-list").map(|list| read_part_list(&list)).unwrap_or_default();

    let parts = root
        .children()
        .filter(|n| n.tag_name().name() == "part")
        .map(|part| {
            part.children()
                .filter(|n| n.tag_name().name() == "measure")
                .map(|measure| read_measure(&measure))
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(RawScore { part_list, parts })
}

fn read_part_list(list: &Node) -> Vec<PartListEntry> {
    list.children()
        .filter(|n| n.is_element())
        .filter_map(|n| match n.tag_name().name() {
            "score-part" => Some(PartListEntry::ScorePart),
            "part-group" => {
                let number = n.attribute("number").unwrap_or("1").to_string();
                match n.attribute("type") {
                    Some("start") => Some(PartListEntry::GroupStart {
                        number,
                        symbol: child_text(&n, "group-symbol"),
                        barline: child_text(&n, "group-barline"),
                    }),
                    Some("stop") => Some(PartListEntry::GroupStop { number }),
                    _ => None,
                }
            }
            _ => None,
        })
        .collect()
}

fn read_measure(measure: &Node) -> RawMeasure {
    let mut raw = RawMeasure {
        number: measure.attribute("number").map(String::from),
        attributes: AttributeDelta::default(),
        notes: Vec::new(),
    };

    for node in measure.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "attributes" => raw.attributes.merge(read_attributes(&node)),
            "note" => raw.notes.push(read_note(&node)),
            // Voices are separated by <voice>, so position moves are not needed
            _ => {}
        }
    }
    raw
}

fn read_attributes(node: &Node) -> AttributeDelta {
    let mut delta = AttributeDelta {
        divisions: child_text(node, "divisions"),
        staves: child_text(node, "staves").and_then(|s| s.trim().parse::<usize>().ok()).and_then(|n| {
            if n > MAX_STAVES {
                log::warn!("Ignoring <staves>{}</staves>", n);
                None
            } else {
                Some(n)
            }
        }),
        ..Default::default()
    };

    if let Some(key) = child(node, "key") {
        if let Some(fifths) = child_text(&key, "fifths") {
            delta.key = decode_key(&fifths, child_text(&key, "mode").as_deref());
            if delta.key.is_none() {
                log::warn!("Ignoring key with <fifths>{}</fifths>", fifths);
            }
        }
    }

    if let Some(time) = child(node, "time") {
        let beats = child_text(&time, "beats");
        let beat_type = child_text(&time, "beat-type");
        if let Some((signature, label)) =
            decode_time(beats.as_deref(), beat_type.as_deref(), time.attribute("symbol"))
        {
            delta.time = Some(signature);
            delta.time_label = label;
        }
    }

    for clef in node.children().filter(|n| n.tag_name().name() == "clef") {
        let staff = clef.attribute("number").and_then(|n| n.parse().ok()).unwrap_or(1);
        if let Some(sign) = child_text(&clef, "sign") {
            let line = child_text(&clef, "line").and_then(|l| l.parse().ok());
            delta.set_clef(staff, decode_clef(&sign, line).to_string());
        }
    }

    delta
}

fn read_note(node: &Node) -> RawNote {
    let has = |name: &str| child(node, name).is_some();
    let pitch = child(node, "pitch");
    let rest = child(node, "rest");
    let notations = child(node, "notations");

    let mut ties: Vec<String> = node
        .children()
        .filter(|n| n.tag_name().name() == "tie")
        .filter_map(|n| n.attribute("type").map(String::from))
        .collect();
    if let Some(notations) = &notations {
        ties.extend(
            notations
                .children()
                .filter(|n| n.tag_name().name() == "tied")
                .filter_map(|n| n.attribute("type").map(String::from)),
        );
    }

    RawNote {
        grace: has("grace"),
        chord: has("chord"),
        rest: rest.is_some(),
        step: pitch.as_ref().and_then(|p| child_text(p, "step")),
        alter: pitch.as_ref().and_then(|p| child_text(p, "alter")),
        octave: pitch.as_ref().and_then(|p| child_text(p, "octave")),
        display_step: rest.as_ref().and_then(|r| child_text(r, "display-step")),
        display_octave: rest.as_ref().and_then(|r| child_text(r, "display-octave")),
        duration: child_text(node, "duration"),
        note_type: child_text(node, "type"),
        dots: node.children().filter(|n| n.tag_name().name() == "dot").count() as u32,
        voice: child_text(node, "voice"),
        staff: child_text(node, "staff"),
        ties,
        beams: node
            .children()
            .filter(|n| n.tag_name().name() == "beam")
            .filter_map(|n| n.text().map(|t| t.trim().to_string()))
            .collect(),
        time_modification: child(node, "time-modification").and_then(|tm| {
            Some((child_text(&tm, "actual-notes")?, child_text(&tm, "normal-notes")?))
        }),
        stem: child_text(node, "stem"),
        lyric: child(node, "lyric").and_then(|l| child_text(&l, "text")),
    }
}
