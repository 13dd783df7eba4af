//! Stave: clef, key, time and the modifier list

use super::objects::{ModifierObject, StaveObject};
use super::types::{require_time, Modifier, ModifierKind, TimeSignature};
use crate::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stave {
    pub time: TimeSignature,
    pub clef: Option<String>,
    pub key: Option<String>,
    /// Time label override, e.g. `"C"` for common time
    pub time_signature: Option<String>,
    modifiers: Vec<Modifier>,
}

impl Stave {
    pub fn new(object: StaveObject) -> Result<Self> {
        let time = require_time(object.time.as_ref(), "Measure.Stave")?;
        let mut stave = Stave {
            time,
            clef: object.clef,
            key: object.key,
            time_signature: object.time_signature,
            modifiers: Vec::new(),
        };
        for modifier in &object.modifiers {
            stave.add_modifier(modifier)?;
        }
        Ok(stave)
    }

    /// Validate and append a modifier from its document form
    pub fn add_modifier(&mut self, object: &ModifierObject) -> Result<()> {
        self.push_modifier(Modifier::try_from(object)?);
        Ok(())
    }

    /// Stave with only a time and optional part-level defaults
    pub fn with_defaults(
        time: TimeSignature,
        clef: Option<String>,
        key: Option<String>,
        time_signature: Option<String>,
    ) -> Self {
        Stave { time, clef, key, time_signature, modifiers: Vec::new() }
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn push_modifier(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }

    /// First modifier of a kind, explicit or automatic
    pub fn modifier(&self, kind: ModifierKind) -> Option<&Modifier> {
        self.modifiers.iter().find(|m| m.kind() == kind)
    }

    /// Remove every automatic modifier, reporting whether any existed
    pub fn delete_automatic_modifiers(&mut self) -> bool {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| !m.automatic);
        self.modifiers.len() != before
    }

    /// Label to draw for this stave's time signature
    pub fn time_label(&self) -> String {
        self.time_signature.clone().unwrap_or_else(|| self.time.label())
    }
}
