//! Error types for document construction and layout
//!
//! Every failure is fatal to the call that triggered it. Each variant carries
//! a stable kind name so hosts (notably JavaScript through the WASM API) can
//! branch on the category without parsing messages.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, ScoreError>;

/// Top-level error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// Malformed constructor input or an out-of-range request
    #[error("ArgumentError: {0}")]
    Argument(String),

    /// No backend accepted the input, or the adopted backend reported it invalid
    #[error("ParseError: {0}")]
    Parse(String),

    /// IR object violates the schema (missing clef, mismatched accidentals, ...)
    #[error("InvalidIRError: {0}")]
    InvalidIr(String),

    /// MusicXML content that cannot be turned into durations
    #[error("InvalidMusicXML: {0}")]
    InvalidMusicXml(String),

    /// Geometry requested for a measure that does not belong to a resolved block
    #[error("FormattingError: {0}")]
    Formatting(String),

    /// The build lacks a capability the input needs (e.g. XML parsing)
    #[error("PlatformCapabilityError: {0}")]
    PlatformCapability(String),
}

impl ScoreError {
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid_ir(msg: impl Into<String>) -> Self {
        Self::InvalidIr(msg.into())
    }

    pub fn invalid_musicxml(msg: impl Into<String>) -> Self {
        Self::InvalidMusicXml(msg.into())
    }

    pub fn formatting(msg: impl Into<String>) -> Self {
        Self::Formatting(msg.into())
    }

    pub fn platform_capability(msg: impl Into<String>) -> Self {
        Self::PlatformCapability(msg.into())
    }

    /// Stable category name, used as the JavaScript error `name`
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreError::Argument(_) => "ArgumentError",
            ScoreError::Parse(_) => "ParseError",
            ScoreError::InvalidIr(_) => "InvalidIRError",
            ScoreError::InvalidMusicXml(_) => "InvalidMusicXML",
            ScoreError::Formatting(_) => "FormattingError",
            ScoreError::PlatformCapability(_) => "PlatformCapabilityError",
        }
    }

    /// Message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            ScoreError::Argument(msg)
            | ScoreError::Parse(msg)
            | ScoreError::InvalidIr(msg)
            | ScoreError::InvalidMusicXml(msg)
            | ScoreError::Formatting(msg)
            | ScoreError::PlatformCapability(msg) => msg,
        }
    }
}
