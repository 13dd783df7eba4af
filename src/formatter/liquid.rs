//! Liquid formatter: greedy line breaking of measures into blocks
//!
//! ```text
//! block b ── start measure s = end of block b-1
//!   ↓ inject clef/key (and time when s == 0) into s
//!   ↓ strip automatic modifiers from each following measure, then take it
//!     while margins + Σ min widths ≤ width
//!   ↓ spread the slack, lay out x offsets and stave tops
//! ```
//!
//! Blocks resolve strictly in order. Minimum widths and stave boxes are
//! cached per measure and only dropped when the measure's modifiers change;
//! block geometry is dropped whenever the width changes.

use super::connectors::{place_connectors, MeasureFrame};
use super::layout::{BlockDimensions, BlockLayout, MeasureLayout, StaveGeometry, VoiceLayout};
use super::metrics::{BoundingBox, RenderMetrics};
use super::voices::voice_layouts;
use crate::backend::StaveConnector;
use crate::config::{check_width, FormatterConfig};
use crate::document::Document;
use crate::error::{Result, ScoreError};
use crate::ir::{Measure, Modifier, ModifierKind};
use std::collections::HashMap;
use std::ops::Range;

/// Size facts of one measure, independent of the block width
#[derive(Debug, Clone, PartialEq)]
struct MeasureMetrics {
    min_width: f64,
    /// Union of the stave lines and its voices, relative to the stave top
    stave_boxes: Vec<BoundingBox>,
}

#[derive(Debug, Clone, PartialEq)]
struct ResolvedBlock {
    measures: Range<usize>,
    width: f64,
    height: f64,
    stave_y: Vec<f64>,
}

pub struct LiquidFormatter<M: RenderMetrics> {
    document: Document,
    config: FormatterConfig,
    metrics: M,
    connectors: Vec<StaveConnector>,
    width: f64,
    blocks: Vec<ResolvedBlock>,
    measure_block: HashMap<usize, usize>,
    measure_x: HashMap<usize, f64>,
    measure_width: HashMap<usize, f64>,
    measure_metrics: HashMap<usize, MeasureMetrics>,
}

impl<M: RenderMetrics> LiquidFormatter<M> {
    pub fn new(document: Document, config: FormatterConfig, metrics: M) -> Result<Self> {
        config.validate()?;
        let connectors = document.stave_connectors();
        Ok(LiquidFormatter {
            width: config.width,
            document,
            config,
            metrics,
            connectors,
            blocks: Vec::new(),
            measure_block: HashMap::new(),
            measure_x: HashMap::new(),
            measure_width: HashMap::new(),
            measure_metrics: HashMap::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Editing measures through this handle does not drop cached layout
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Change the target width; resolved blocks are discarded when it differs
    pub fn set_width(&mut self, width: f64) -> Result<()> {
        check_width(width)?;
        if width != self.width {
            log::debug!("Width {} -> {}, dropping {} resolved blocks", self.width, width, self.blocks.len());
            self.width = width;
            self.blocks.clear();
            self.measure_block.clear();
            self.measure_x.clear();
            self.measure_width.clear();
        }
        Ok(())
    }

    /// `[width, height]` of block `b`, or `None` past the last measure
    pub fn block(&mut self, b: usize) -> Result<Option<BlockDimensions>> {
        Ok(self
            .resolve_through(b)?
            .map(|block| BlockDimensions { width: block.width, height: block.height }))
    }

    /// Measure indices of block `b`
    pub fn measures_in_block(&mut self, b: usize) -> Result<Option<Range<usize>>> {
        Ok(self.resolve_through(b)?.map(|block| block.measures.clone()))
    }

    /// Resolves every block
    pub fn number_of_blocks(&mut self) -> Result<usize> {
        let mut count = self.blocks.len();
        while self.resolve_through(count)?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Block containing measure `m`, if already resolved
    pub fn block_of_measure(&self, m: usize) -> Option<usize> {
        self.measure_block.get(&m).copied()
    }

    pub fn stave_x(&self, m: usize) -> Result<f64> {
        self.measure_x.get(&m).copied().ok_or_else(|| unresolved(m))
    }

    pub fn stave_width(&self, m: usize) -> Result<f64> {
        self.measure_width.get(&m).copied().ok_or_else(|| unresolved(m))
    }

    /// Placed stave `s` (global index) of measure `m`
    pub fn stave(&mut self, m: usize, s: usize) -> Result<StaveGeometry> {
        let block = self.measure_block.get(&m).copied().ok_or_else(|| unresolved(m))?;
        let x = self.stave_x(m)?;
        let width = self.stave_width(m)?;
        let y = self.blocks[block].stave_y.get(s).copied();

        let measure = self.document.measure(m)?;
        let stave = measure.stave(s).ok_or_else(|| {
            ScoreError::argument(format!("Measure {} has no stave {}", m, s))
        })?;
        let y = y.ok_or_else(|| ScoreError::argument(format!("Measure {} has no stave {}", m, s)))?;
        Ok(StaveGeometry {
            measure: m,
            stave: s,
            x,
            y,
            width,
            clef: stave.clef.clone(),
            modifiers: stave.modifiers().to_vec(),
        })
    }

    pub fn voice_layouts(&mut self, m: usize) -> Result<Vec<VoiceLayout>> {
        voice_layouts(self.document.measure(m)?)
    }

    /// Drawing list for block `b`
    pub fn block_layout(&mut self, b: usize) -> Result<Option<BlockLayout>> {
        let block = match self.resolve_through(b)? {
            Some(block) => block.clone(),
            None => return Ok(None),
        };

        let mut measures = Vec::with_capacity(block.measures.len());
        for m in block.measures.clone() {
            let x = self.stave_x(m)?;
            let width = self.stave_width(m)?;
            let staves = (0..self.document.measure(m)?.number_of_staves())
                .map(|s| self.stave(m, s))
                .collect::<Result<Vec<_>>>()?;

            let measure = self.document.measure(m)?;
            let frame = MeasureFrame {
                x,
                width,
                stave_y: &block.stave_y,
                first_in_block: m == block.measures.start,
                last_in_block: m + 1 == block.measures.end,
            };
            measures.push(MeasureLayout {
                index: m,
                x,
                width,
                staves,
                voices: voice_layouts(measure)?,
                connectors: place_connectors(measure, &self.connectors, &frame),
            });
        }

        Ok(Some(BlockLayout { index: b, width: block.width, height: block.height, measures }))
    }

    fn resolve_through(&mut self, b: usize) -> Result<Option<&ResolvedBlock>> {
        while self.blocks.len() <= b {
            let start = self.blocks.last().map_or(0, |block| block.measures.end);
            if start >= self.document.number_of_measures() {
                return Ok(None);
            }
            let block = self.resolve_block(start)?;
            let index = self.blocks.len();
            for m in block.measures.clone() {
                self.measure_block.insert(m, index);
            }
            self.blocks.push(block);
        }
        Ok(self.blocks.get(b))
    }

    fn resolve_block(&mut self, start: usize) -> Result<ResolvedBlock> {
        self.inject_modifiers(start)?;

        let brace = self.document.measure(start)?.shows_brace();
        let left = self.config.block_left_margin(brace);
        let margins = left + self.config.right_margin;
        let total_measures = self.document.number_of_measures();

        let first = self.min_width(start)?.ceil();
        let mut widths = vec![first];
        let width = if first + margins >= self.width {
            log::debug!("Measure {} overflows width {}, placing it alone", start, self.width);
            first + margins
        } else {
            let mut used = first;
            for m in start + 1..total_measures {
                self.retract_modifiers(m)?;
                let min = self.min_width(m)?.ceil();
                if margins + used + min > self.width {
                    break;
                }
                used += min;
                widths.push(min);
            }

            let slack = self.width - margins - used;
            let share = (slack / widths.len() as f64).floor();
            let remainder = slack - share * widths.len() as f64;
            for width in widths.iter_mut() {
                *width += share;
            }
            widths[0] += remainder;
            self.width
        };

        let measures = start..start + widths.len();
        let mut x = left;
        for (m, w) in measures.clone().zip(&widths) {
            self.measure_x.insert(m, x);
            self.measure_width.insert(m, *w);
            x += w;
        }

        let (stave_y, height) = self.stave_positions(measures.clone())?;
        log::debug!(
            "Block of measures {:?}: width {}, height {}, staves at {:?}",
            measures,
            width,
            height,
            stave_y
        );
        Ok(ResolvedBlock { measures, width, height, stave_y })
    }

    /// Stave tops and the block height from every measure's stave boxes
    fn stave_positions(&mut self, measures: Range<usize>) -> Result<(Vec<f64>, f64)> {
        let mut boxes = Vec::new();
        for m in measures {
            boxes.push(self.measure_metrics(m)?.stave_boxes);
        }
        let staves = boxes.iter().map(Vec::len).max().unwrap_or(0);

        let mut stave_y = Vec::with_capacity(staves);
        let above = max_over(&boxes, |b| b.first().map(|first| -first.y));
        stave_y.push(self.config.min_space_above.max(above));
        for s in 1..staves {
            let gap = max_over(&boxes, |b| match (b.get(s - 1), b.get(s)) {
                (Some(prev), Some(this)) => Some(prev.bottom() - this.y),
                _ => None,
            });
            let y = stave_y[s - 1] + self.config.stave_height.max(gap);
            stave_y.push(y);
        }

        let last_y = stave_y.last().copied().unwrap_or(self.config.min_space_above);
        let extent = max_over(&boxes, |b| if b.len() == staves { b.last().map(BoundingBox::bottom) } else { None });
        Ok((stave_y, last_y + self.config.stave_height.max(extent)))
    }

    fn min_width(&mut self, m: usize) -> Result<f64> {
        Ok(self.measure_metrics(m)?.min_width)
    }

    fn measure_metrics(&mut self, m: usize) -> Result<MeasureMetrics> {
        if let Some(cached) = self.measure_metrics.get(&m) {
            return Ok(cached.clone());
        }
        let measure = self.document.measure(m)?;
        let computed = compute_metrics(measure, &self.metrics, &self.config)?;
        self.measure_metrics.insert(m, computed.clone());
        Ok(computed)
    }

    /// Automatic clef and key on a block-initial measure; time only on the first measure
    fn inject_modifiers(&mut self, m: usize) -> Result<()> {
        let measure = self.document.measure_mut(m)?;
        let mut changed = false;
        for stave in measure.staves_mut() {
            let mut pending = Vec::new();
            if stave.modifier(ModifierKind::Clef).is_none() {
                if let Some(clef) = &stave.clef {
                    pending.push(Modifier::clef(clef.clone(), true));
                }
            }
            if stave.modifier(ModifierKind::Key).is_none() {
                if let Some(key) = &stave.key {
                    pending.push(Modifier::key(key.clone(), true));
                }
            }
            if m == 0 && !stave.time.soft && stave.modifier(ModifierKind::Time).is_none() {
                pending.push(Modifier::time(stave.time_label(), true));
            }
            changed |= !pending.is_empty();
            for modifier in pending {
                stave.push_modifier(modifier);
            }
        }
        if changed {
            log::debug!("Injected modifiers into measure {}", m);
            self.measure_metrics.remove(&m);
        }
        Ok(())
    }

    fn retract_modifiers(&mut self, m: usize) -> Result<()> {
        let measure = self.document.measure_mut(m)?;
        let removed = measure
            .staves_mut()
            .fold(false, |removed, stave| stave.delete_automatic_modifiers() | removed);
        if removed {
            log::debug!("Retracted automatic modifiers from measure {}", m);
            self.measure_metrics.remove(&m);
        }
        Ok(())
    }
}

/// Largest value over the block's measures; `f64::MIN` when none applies
fn max_over(boxes: &[Vec<BoundingBox>], f: impl Fn(&[BoundingBox]) -> Option<f64>) -> f64 {
    boxes.iter().filter_map(|b| f(b.as_slice())).fold(f64::MIN, f64::max)
}

fn unresolved(m: usize) -> ScoreError {
    ScoreError::formatting(format!("Measure {} is not in a resolved block", m))
}

fn compute_metrics<M: RenderMetrics>(
    measure: &Measure,
    metrics: &M,
    config: &FormatterConfig,
) -> Result<MeasureMetrics> {
    let voices = voice_layouts(measure)?;

    let furniture = measure.staves().map(|stave| metrics.furniture_width(stave)).fold(0.0, f64::max);
    let busiest = voices.iter().map(|v| v.tickables.len()).max().unwrap_or(0);
    let min_width = (furniture
        + metrics.min_total_width(&voices)
        + busiest as f64 * config.tickable_spacing
        + config.measure_padding)
        .max(config.min_measure_width);

    let mut stave_boxes = vec![metrics.stave_bounding_box(); measure.number_of_staves()];
    for voice in &voices {
        if let (Some(slot), Some(bbox)) = (stave_boxes.get_mut(voice.stave), metrics.voice_bounding_box(voice)) {
            *slot = slot.merge(&bbox);
        }
    }

    Ok(MeasureMetrics { min_width, stave_boxes })
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
