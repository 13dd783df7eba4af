//! `LiquidScore`: a document plus its formatter, exposed to JavaScript

use super::helpers::{serialize, to_js_error};
use crate::config::FormatterConfig;
use crate::document::Document;
use crate::formatter::{LiquidFormatter, StandardMetrics};
use crate::wasm_log;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct LiquidScore {
    formatter: LiquidFormatter<StandardMetrics>,
}

#[wasm_bindgen]
impl LiquidScore {
    /// Open IR JSON or MusicXML text, with optional formatter settings JSON
    #[wasm_bindgen(constructor)]
    pub fn new(text: &str, config_json: Option<String>) -> Result<LiquidScore, JsValue> {
        let config = match config_json {
            Some(json) => FormatterConfig::from_json(&json).map_err(to_js_error)?,
            None => FormatterConfig::default(),
        };
        let document = Document::new(text).map_err(to_js_error)?;
        wasm_log!(
            "Opened {} document with {} measures",
            document.backend_name(),
            document.number_of_measures()
        );
        let formatter = document.formatter_with(config).map_err(to_js_error)?;
        Ok(LiquidScore { formatter })
    }

    #[wasm_bindgen(js_name = numberOfMeasures)]
    pub fn number_of_measures(&self) -> usize {
        self.formatter.document().number_of_measures()
    }

    /// Measure `index` as a plain IR object
    pub fn measure(&mut self, index: usize) -> Result<JsValue, JsValue> {
        let measure = self.formatter.document_mut().measure(index).map_err(to_js_error)?;
        serialize(measure, "Failed to serialize measure")
    }

    #[wasm_bindgen(js_name = setWidth)]
    pub fn set_width(&mut self, width: f64) -> Result<(), JsValue> {
        self.formatter.set_width(width).map_err(to_js_error)
    }

    /// `[width, height]` of block `b`, or `null` past the end
    pub fn block(&mut self, b: usize) -> Result<JsValue, JsValue> {
        match self.formatter.block(b).map_err(to_js_error)? {
            Some(dimensions) => serialize(&[dimensions.width, dimensions.height], "Failed to serialize block"),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = numberOfBlocks)]
    pub fn number_of_blocks(&mut self) -> Result<usize, JsValue> {
        self.formatter.number_of_blocks().map_err(to_js_error)
    }

    /// Complete drawing list for block `b`, or `null` past the end
    #[wasm_bindgen(js_name = blockLayout)]
    pub fn block_layout(&mut self, b: usize) -> Result<JsValue, JsValue> {
        match self.formatter.block_layout(b).map_err(to_js_error)? {
            Some(layout) => serialize(&layout, "Failed to serialize block layout"),
            None => Ok(JsValue::NULL),
        }
    }

    /// Geometry of stave `s` in measure `m`
    pub fn stave(&mut self, m: usize, s: usize) -> Result<JsValue, JsValue> {
        let stave = self.formatter.stave(m, s).map_err(to_js_error)?;
        serialize(&stave, "Failed to serialize stave")
    }
}
