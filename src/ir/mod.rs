//! Intermediate Representation (IR) Module
//!
//! Format-agnostic model of a score, organised measure-first:
//!
//! ```text
//! Document
//!     ↓ measure(i)
//! Measure (time, attributes)
//!     ↓ parts
//! Part (clef/key defaults) ── Staves (modifiers)
//!                          └─ Voices ── Notes
//! ```
//!
//! Backends produce measures from their source format; the Liquid formatter
//! consumes them. Input objects in [`objects`] deserialize from the JSON
//! document format and are validated by the constructors here.

pub mod accidentals;
pub mod duration;
pub mod measure;
pub mod objects;
pub mod pitch;
pub mod stave;
pub mod types;
pub mod voice;

pub use accidentals::AccidentalTracker;
pub use duration::{DurationCode, Ticks, RESOLUTION};
pub use measure::{Measure, Part};
pub use objects::{
    DocumentObject, MeasureObject, ModifierObject, NoteObject, PartObject, StaveObject, TimeObject,
    VoiceObject,
};
pub use pitch::{Accidental, Pitch};
pub use stave::Stave;
pub use types::{
    Modifier, ModifierKind, ModifierValue, NoteState, StemDirection, TimeSignature, Tuplet,
};
pub use voice::{Note, Voice};
