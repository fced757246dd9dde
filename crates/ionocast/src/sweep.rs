//! Parallel sweep over hours and frequencies.
//!
//! Each (hour, frequency) cell is an independent pure evaluation against the
//! shared immutable engine, so the grid fans out across the rayon pool with
//! no locking. A cancellation token is checked per cell: a cancelled cell
//! produces no record at all, never a partial one.

use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::info;

use crate::config::validate_frequency;
use crate::engine::{PredictionEngine, PredictionResult};
use crate::error::ConfigError;

/// The grid of hours and frequencies to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    hours: Vec<u32>,
    frequencies_mhz: Vec<f64>,
}

impl SweepPlan {
    pub fn new(hours: Vec<u32>, frequencies_mhz: Vec<f64>) -> Result<Self, ConfigError> {
        if hours.is_empty() || frequencies_mhz.is_empty() {
            return Err(ConfigError::EmptySweep);
        }
        for &hour in &hours {
            if hour >= 24 {
                return Err(ConfigError::InvalidHour(hour));
            }
        }
        for &f in &frequencies_mhz {
            validate_frequency(f)?;
        }
        Ok(Self {
            hours,
            frequencies_mhz,
        })
    }

    /// Every hour of the day against the given frequencies.
    pub fn around_the_clock(frequencies_mhz: Vec<f64>) -> Result<Self, ConfigError> {
        Self::new((0..24).collect(), frequencies_mhz)
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    pub fn frequencies_mhz(&self) -> &[f64] {
        &self.frequencies_mhz
    }

    pub fn cell_count(&self) -> usize {
        self.hours.len() * self.frequencies_mhz.len()
    }
}

/// Cooperative cancellation shared between the sweep and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(AtomicOrdering::Relaxed)
    }
}

/// Completed sweep cells plus a ranking by forecast quality.
#[derive(Debug, Clone)]
pub struct SweepResult {
    cells: Vec<PredictionResult>,
    ranked: Vec<usize>,
}

impl SweepResult {
    fn new(cells: Vec<PredictionResult>) -> Self {
        let mut ranked: Vec<usize> = (0..cells.len()).collect();
        ranked.sort_by(|&a, &b| rank_order(&cells[a], &cells[b]));
        Self { cells, ranked }
    }

    /// Cells in evaluation order.
    pub fn cells(&self) -> &[PredictionResult] {
        &self.cells
    }

    /// Cells from the most to the least promising (hour, frequency).
    pub fn ranked(&self) -> impl Iterator<Item = &PredictionResult> {
        self.ranked.iter().map(|&i| &self.cells[i])
    }

    pub fn best(&self) -> Option<&PredictionResult> {
        self.ranked.first().map(|&i| &self.cells[i])
    }

    pub fn is_complete(&self, plan: &SweepPlan) -> bool {
        self.cells.len() == plan.cell_count()
    }
}

// Higher reliability first; ties go to the stronger median SNR.
fn rank_order(a: &PredictionResult, b: &PredictionResult) -> Ordering {
    b.reliability
        .partial_cmp(&a.reliability)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.snr
                .median()
                .partial_cmp(&a.snr.median())
                .unwrap_or(Ordering::Equal)
        })
}

/// Evaluate the whole plan against one engine.
///
/// Hour contexts are built once up front and shared read-only by every
/// frequency of that hour. Cancelled cells are simply absent from the result.
pub fn run_sweep(
    engine: &PredictionEngine<'_>,
    plan: &SweepPlan,
    token: &CancellationToken,
) -> Result<SweepResult, ConfigError> {
    let contexts = plan
        .hours
        .iter()
        .map(|&hour| engine.hour_context(hour))
        .collect::<Result<Vec<_>, _>>()?;

    let cells = contexts
        .par_iter()
        .flat_map(|ctx| {
            plan.frequencies_mhz
                .par_iter()
                .map(move |&frequency| (ctx, frequency))
        })
        .map(|(ctx, frequency)| {
            if token.is_cancelled() {
                return Ok(None);
            }
            engine.evaluate(ctx, frequency).map(Some)
        })
        .collect::<Result<Vec<Option<PredictionResult>>, ConfigError>>()?;
    let cells: Vec<PredictionResult> = cells.into_iter().flatten().collect();

    info!(
        cells = cells.len(),
        planned = plan.cell_count(),
        cancelled = token.is_cancelled(),
        "sweep finished"
    );
    Ok(SweepResult::new(cells))
}
