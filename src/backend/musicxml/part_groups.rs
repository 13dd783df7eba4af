//! `<part-list>` groups to stave connectors

use crate::backend::{ConnectorKind, StaveConnector};
use std::collections::HashMap;

/// `<part-list>` children in document order
#[derive(Debug, Clone, PartialEq)]
pub enum PartListEntry {
    GroupStart {
        number: String,
        symbol: Option<String>,
        barline: Option<String>,
    },
    GroupStop {
        number: String,
    },
    ScorePart,
}

struct OpenGroup {
    first: usize,
    symbol: Option<String>,
    barline: Option<String>,
}

/// Connectors for nested groups, plus a system line across all parts
pub fn stave_connectors(entries: &[PartListEntry], number_of_parts: usize) -> Vec<StaveConnector> {
    let mut connectors = Vec::new();
    let mut open: HashMap<String, OpenGroup> = HashMap::new();
    let mut parts_seen = 0;

    for entry in entries {
        match entry {
            PartListEntry::ScorePart => parts_seen += 1,
            PartListEntry::GroupStart { number, symbol, barline } => {
                open.insert(
                    number.clone(),
                    OpenGroup { first: parts_seen, symbol: symbol.clone(), barline: barline.clone() },
                );
            }
            PartListEntry::GroupStop { number } => {
                let Some(group) = open.remove(number) else {
                    log::warn!("part-group {} stopped without a start", number);
                    continue;
                };
                if parts_seen == 0 || group.first >= parts_seen {
                    continue;
                }
                let last = parts_seen - 1;
                match group.symbol.as_deref().map(str::trim) {
                    Some("brace") => {
                        connectors.push(StaveConnector::system_start(ConnectorKind::Brace, group.first, last))
                    }
                    Some("bracket") | Some("square") => {
                        connectors.push(StaveConnector::system_start(ConnectorKind::Bracket, group.first, last))
                    }
                    Some("line") => {
                        connectors.push(StaveConnector::system_start(ConnectorKind::Single, group.first, last))
                    }
                    _ => {}
                }
                if group.barline.as_deref().map(str::trim) == Some("yes") {
                    connectors.push(StaveConnector::group_barline(group.first, last));
                }
            }
        }
    }

    if number_of_parts > 1 {
        connectors.push(StaveConnector::system_start(ConnectorKind::Single, 0, number_of_parts - 1));
    }
    connectors
}
