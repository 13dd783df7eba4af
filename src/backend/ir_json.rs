//! IR backend: measures straight from a `{type: "document"}` JSON object

use super::{measure_index_error, Backend, Source};
use crate::error::{Result, ScoreError};
use crate::ir::{DocumentObject, Measure};
use serde_json::Value;

const DOCUMENT_TYPE: &str = "document";

#[derive(Debug, Default)]
pub struct IrBackend {
    document: Option<DocumentObject>,
}

impl IrBackend {
    fn looks_like_document(value: &Value) -> bool {
        value.get("type").and_then(Value::as_str) == Some(DOCUMENT_TYPE)
    }

    fn json_of(source: &Source<'_>) -> Option<Value> {
        match source {
            Source::Json(value) => Some((*value).clone()),
            Source::Text(text) => {
                let trimmed = text.trim_start();
                if !trimmed.starts_with('{') {
                    return None;
                }
                serde_json::from_str(trimmed).ok()
            }
            #[cfg(feature = "musicxml")]
            Source::Xml(_) => None,
        }
    }
}

impl Backend for IrBackend {
    fn name(&self) -> &'static str {
        "ir"
    }

    fn appears_valid(source: &Source<'_>) -> bool {
        match source {
            Source::Json(value) => Self::looks_like_document(value),
            _ => Self::json_of(source).map_or(false, |value| Self::looks_like_document(&value)),
        }
    }

    fn parse(&mut self, source: &Source<'_>) -> Result<()> {
        let value = Self::json_of(source)
            .filter(Self::looks_like_document)
            .ok_or_else(|| ScoreError::argument("IR object must be a valid document"))?;

        let document: DocumentObject = serde_json::from_value(value)
            .map_err(|e| ScoreError::invalid_ir(format!("Malformed IR document: {}", e)))?;
        log::debug!("IR document with {} measures", document.measures.len());
        self.document = Some(document);
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.document.is_some()
    }

    fn number_of_measures(&self) -> usize {
        self.document.as_ref().map_or(0, |d| d.measures.len())
    }

    fn measure(&self, index: usize) -> Result<Measure> {
        let object = self
            .document
            .as_ref()
            .and_then(|d| d.measures.get(index))
            .ok_or_else(|| measure_index_error(index, self.number_of_measures()))?;
        Measure::new(object.clone())
    }
}
