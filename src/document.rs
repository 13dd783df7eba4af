//! Document: backend selection plus lazily built, memoized measures

use crate::backend::{Backend, BackendRegistry, Source, StaveConnector};
use crate::config::FormatterConfig;
use crate::error::Result;
use crate::formatter::{LiquidFormatter, StandardMetrics};
use crate::ir::Measure;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

pub struct Document {
    backend: Box<dyn Backend>,
    measures: HashMap<usize, Measure>,
}

impl Document {
    /// Open with the default backends (IR, then MusicXML)
    pub fn new<'a>(source: impl Into<Source<'a>>) -> Result<Self> {
        Self::with_registry(&BackendRegistry::default(), source)
    }

    pub fn with_registry<'a>(registry: &BackendRegistry, source: impl Into<Source<'a>>) -> Result<Self> {
        let backend = registry.open(&source.into())?;
        Ok(Document { backend, measures: HashMap::new() })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn number_of_measures(&self) -> usize {
        self.backend.number_of_measures()
    }

    /// Measure `index`, built on first access
    pub fn measure(&mut self, index: usize) -> Result<&Measure> {
        self.measure_mut(index).map(|m| &*m)
    }

    pub fn measure_mut(&mut self, index: usize) -> Result<&mut Measure> {
        match self.measures.entry(index) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let measure = self.backend.measure(index)?;
                Ok(entry.insert(measure))
            }
        }
    }

    /// Measures materialized so far
    pub fn cached_measures(&self) -> usize {
        self.measures.len()
    }

    pub fn stave_connectors(&self) -> Vec<StaveConnector> {
        self.backend.stave_connectors()
    }

    /// Liquid formatter with default configuration and built-in metrics
    pub fn formatter(self) -> Result<LiquidFormatter<StandardMetrics>> {
        self.formatter_with(FormatterConfig::default())
    }

    pub fn formatter_with(self, config: FormatterConfig) -> Result<LiquidFormatter<StandardMetrics>> {
        let metrics = StandardMetrics::new(config.glyphs.clone());
        LiquidFormatter::new(self, config, metrics)
    }
}
