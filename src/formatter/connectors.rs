//! Stave connector placement for one measure of a block

use super::layout::{ConnectorPlacement, ConnectorPosition};
use super::metrics::y_for_line;
use crate::backend::{ConnectorKind, StaveConnector};
use crate::ir::Measure;
use std::ops::RangeInclusive;

/// Where a measure sits inside its block
#[derive(Debug, Clone, Copy)]
pub struct MeasureFrame<'a> {
    pub x: f64,
    pub width: f64,
    /// Top of each stave in the block
    pub stave_y: &'a [f64],
    pub first_in_block: bool,
    pub last_in_block: bool,
}

/// Global stave range covered by an inclusive part span
fn stave_span(measure: &Measure, (first, last): (usize, usize)) -> Option<RangeInclusive<usize>> {
    if first > last || last >= measure.number_of_parts() {
        return None;
    }
    let start = measure.first_stave_of_part(first);
    let end = measure.first_stave_of_part(last + 1);
    (end > start).then(|| start..=end - 1)
}

/// Descriptors from the backend plus the built-in connectors
///
/// Every block starts with a single line through all staves when there is
/// more than one; a part with several staves gets a brace at system start
/// and barlines through its staves at each measure start and at system end.
fn built_in(measure: &Measure) -> Vec<StaveConnector> {
    let mut connectors = Vec::new();
    if measure.number_of_staves() > 1 && measure.number_of_parts() > 0 {
        connectors.push(StaveConnector::system_start(
            ConnectorKind::Single,
            0,
            measure.number_of_parts() - 1,
        ));
    }
    for (index, part) in measure.parts().iter().enumerate() {
        if part.shows_brace() {
            connectors.push(StaveConnector::system_start(ConnectorKind::Brace, index, index));
            connectors.push(StaveConnector::group_barline(index, index));
        }
    }
    connectors
}

pub fn place_connectors(
    measure: &Measure,
    descriptors: &[StaveConnector],
    frame: &MeasureFrame<'_>,
) -> Vec<ConnectorPlacement> {
    let mut placements: Vec<ConnectorPlacement> = Vec::new();
    let built_in = built_in(measure);

    for connector in descriptors.iter().chain(built_in.iter()) {
        let span = match stave_span(measure, connector.parts) {
            Some(span) => span,
            None => {
                log::warn!(
                    "Skipping {:?} connector over parts {:?} in a measure with {} parts",
                    connector.kind,
                    connector.parts,
                    measure.number_of_parts()
                );
                continue;
            }
        };
        let (top, bottom) = match (frame.stave_y.get(*span.start()), frame.stave_y.get(*span.end())) {
            (Some(top), Some(bottom)) => (*top, *bottom),
            _ => continue,
        };

        let mut positions = Vec::new();
        if connector.system_start && frame.first_in_block {
            positions.push((ConnectorPosition::SystemStart, frame.x));
        }
        if connector.measure_start {
            positions.push((ConnectorPosition::MeasureStart, frame.x));
        }
        if connector.system_end && frame.last_in_block {
            positions.push((ConnectorPosition::SystemEnd, frame.x + frame.width));
        }

        for (position, x) in positions {
            let placement = ConnectorPlacement {
                kind: connector.kind,
                position,
                first_stave: *span.start(),
                last_stave: *span.end(),
                x,
                top_y: top + y_for_line(0.0),
                bottom_y: bottom + y_for_line(4.0),
            };
            let duplicate = placements.iter().any(|p| {
                p.kind == placement.kind
                    && p.position == placement.position
                    && p.first_stave == placement.first_stave
                    && p.last_stave == placement.last_stave
            });
            if !duplicate {
                placements.push(placement);
            }
        }
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::MeasureObject;
    use serde_json::json;

    fn piano_and_violin() -> Measure {
        let object: MeasureObject = serde_json::from_value(json!({
            "time": {"num_beats": 4, "beat_value": 4},
            "parts": [{"num_staves": 2}, {}]
        }))
        .unwrap();
        Measure::new(object).unwrap()
    }

    fn frame(stave_y: &[f64], first: bool, last: bool) -> MeasureFrame<'_> {
        MeasureFrame { x: 15.0, width: 200.0, stave_y, first_in_block: first, last_in_block: last }
    }

    fn find(
        placements: &[ConnectorPlacement],
        kind: ConnectorKind,
        position: ConnectorPosition,
    ) -> Vec<(usize, usize)> {
        placements
            .iter()
            .filter(|p| p.kind == kind && p.position == position)
            .map(|p| (p.first_stave, p.last_stave))
            .collect()
    }

    #[test]
    fn test_built_in_connectors_at_system_start() {
        let measure = piano_and_violin();
        let ys = [10.0, 100.0, 190.0];
        let placements = place_connectors(&measure, &[], &frame(&ys, true, false));

        assert_eq!(find(&placements, ConnectorKind::Single, ConnectorPosition::SystemStart), vec![(0, 2)]);
        assert_eq!(find(&placements, ConnectorKind::Brace, ConnectorPosition::SystemStart), vec![(0, 1)]);
        assert_eq!(find(&placements, ConnectorKind::Single, ConnectorPosition::MeasureStart), vec![(0, 1)]);
        assert!(find(&placements, ConnectorKind::Single, ConnectorPosition::SystemEnd).is_empty());

        let brace = placements.iter().find(|p| p.kind == ConnectorKind::Brace).unwrap();
        assert_eq!((brace.x, brace.top_y, brace.bottom_y), (15.0, 50.0, 180.0));
    }

    #[test]
    fn test_system_end_uses_right_edge() {
        let measure = piano_and_violin();
        let ys = [10.0, 100.0, 190.0];
        let placements = place_connectors(&measure, &[], &frame(&ys, false, true));

        assert!(find(&placements, ConnectorKind::Brace, ConnectorPosition::SystemStart).is_empty());
        let end: Vec<_> = placements.iter().filter(|p| p.position == ConnectorPosition::SystemEnd).collect();
        assert_eq!(end.len(), 1);
        assert_eq!(end[0].x, 215.0);
    }

    #[test]
    fn test_descriptors_are_deduplicated_and_checked() {
        let measure = piano_and_violin();
        let ys = [10.0, 100.0, 190.0];
        let descriptors = [
            StaveConnector::system_start(ConnectorKind::Single, 0, 1),
            StaveConnector::system_start(ConnectorKind::Bracket, 1, 1),
            StaveConnector::system_start(ConnectorKind::Bracket, 0, 5),
        ];
        let placements = place_connectors(&measure, &descriptors, &frame(&ys, true, true));

        assert_eq!(find(&placements, ConnectorKind::Single, ConnectorPosition::SystemStart), vec![(0, 2)]);
        assert_eq!(find(&placements, ConnectorKind::Bracket, ConnectorPosition::SystemStart), vec![(2, 2)]);
    }
}
