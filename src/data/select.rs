use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::model::{AcousticFeature, FacetTuple, KinematicFeature, SignalTable};

/// Value the pitch tracker writes for unvoiced frames.
pub const PITCH_SENTINEL: f64 = 0.0;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// One request from the viewer: which session and which two features.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Selection {
    pub facets: FacetTuple,
    pub acoustic: AcousticFeature,
    pub kinematic: KinematicFeature,
}

/// The filtered, sanitized series pair on a shared time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    pub acoustic: AcousticFeature,
    pub kinematic: KinematicFeature,
    pub x_ms: Vec<f64>,
    pub y_acoustic: Vec<Option<f64>>,
    pub y_kinematic: Vec<Option<f64>>,
}

impl SelectionResult {
    pub fn len(&self) -> usize {
        self.x_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_ms.is_empty()
    }

    pub fn acoustic_points(&self) -> Vec<Vec<[f64; 2]>> {
        segments(&self.x_ms, &self.y_acoustic)
    }

    pub fn kinematic_points(&self) -> Vec<Vec<[f64; 2]>> {
        segments(&self.x_ms, &self.y_kinematic)
    }
}

/// Split a series into runs of present values, so a missing sample shows up
/// as a gap instead of being interpolated over.
pub fn segments(x: &[f64], y: &[Option<f64>]) -> Vec<Vec<[f64; 2]>> {
    let mut out = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for (&xi, yi) in x.iter().zip(y) {
        match yi {
            Some(v) => current.push([xi, *v]),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

// ---------------------------------------------------------------------------
// Selection engine
// ---------------------------------------------------------------------------

/// Extract the rows of one session and the two requested channels.
///
/// No match yields three empty sequences. When the acoustic feature is
/// `f0`, unvoiced frames (exactly [`PITCH_SENTINEL`]) become `None`.
pub fn select(table: &SignalTable, selection: &Selection) -> SelectionResult {
    let rows: &[usize] = table
        .session(&selection.facets)
        .map(|s| s.rows.as_slice())
        .unwrap_or(&[]);

    let time = table.time_ms();
    let acoustic = table.column(selection.acoustic.channel());
    let kinematic = table.column(selection.kinematic.channel());

    let x_ms: Vec<f64> = rows.iter().map(|&r| time[r]).collect();
    let mut y_acoustic: Vec<Option<f64>> = rows.iter().map(|&r| acoustic[r]).collect();
    let y_kinematic: Vec<Option<f64>> = rows.iter().map(|&r| kinematic[r]).collect();

    if selection.acoustic == AcousticFeature::F0 {
        mask_sentinel(&mut y_acoustic, PITCH_SENTINEL);
    }

    log::debug!(
        "select {} {}/{}: {} rows",
        selection.facets,
        selection.acoustic,
        selection.kinematic,
        x_ms.len()
    );

    SelectionResult {
        acoustic: selection.acoustic,
        kinematic: selection.kinematic,
        x_ms,
        y_acoustic,
        y_kinematic,
    }
}

fn mask_sentinel(values: &mut [Option<f64>], sentinel: f64) {
    for v in values.iter_mut() {
        if *v == Some(sentinel) {
            *v = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Memoization
// ---------------------------------------------------------------------------

/// Remembers recent results for one table. Must be cleared when the table
/// changes.
#[derive(Debug)]
pub struct SelectionCache {
    capacity: usize,
    entries: HashMap<Selection, Arc<SelectionResult>>,
}

impl Default for SelectionCache {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl SelectionCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn get_or_select(&mut self, table: &SignalTable, selection: &Selection) -> Arc<SelectionResult> {
        if let Some(hit) = self.entries.get(selection) {
            return Arc::clone(hit);
        }
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        let result = Arc::new(select(table, selection));
        self.entries.insert(selection.clone(), Arc::clone(&result));
        result
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
