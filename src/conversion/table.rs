//! Piecewise-linear CT → density conversion table

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Fraction of the end-point magnitude accepted outside the table range
pub const TOLERANCE_FRACTION: f64 = 0.1;

/// One (CT value, density) control point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub ct: f64,
    pub density: f64,
}

/// Linear piece `density = ct * slope + intercept` between two control points
#[derive(Clone, Copy, Debug, PartialEq)]
struct Interval {
    slope: f64,
    intercept: f64,
}

/// Ordered control points with precomputed per-interval slope and intercept.
///
/// Values in `[ct[0] - 0.1 * |ct[0]|, ct[0]]` clamp to the first density and
/// values in `[ct[N-1], ct[N-1] + 0.1 * |ct[N-1]|]` clamp to the last one.
/// Anything else outside the table is a [`Error::Range`].
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionTable {
    points: Vec<ControlPoint>,
    intervals: Vec<Interval>,
}

impl ConversionTable {
    /// Build a table from control points; CT values must be strictly increasing
    pub fn new(points: Vec<ControlPoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::Table(format!(
                "at least 2 control points are required, got {}",
                points.len()
            )));
        }
        if let Some(p) = points.iter().find(|p| !p.ct.is_finite() || !p.density.is_finite()) {
            return Err(Error::Table(format!("non-finite control point {:?}", p)));
        }
        if let Some(w) = points.windows(2).find(|w| w[0].ct >= w[1].ct) {
            return Err(Error::Table(format!(
                "CT values must be strictly increasing ({} is followed by {})",
                w[0].ct, w[1].ct
            )));
        }

        let intervals = points
            .windows(2)
            .map(|w| {
                let slope = (w[0].density - w[1].density) / (w[0].ct - w[1].ct);
                Interval { slope, intercept: w[0].density - w[0].ct * slope }
            })
            .collect();

        Ok(Self { points, intervals })
    }

    /// Build from parallel CT and density columns
    pub fn from_columns(ct_values: &[f64], densities: &[f64]) -> Result<Self> {
        if ct_values.len() != densities.len() {
            return Err(Error::Table(format!(
                "{} CT values but {} densities",
                ct_values.len(),
                densities.len()
            )));
        }
        Self::new(
            ct_values
                .iter()
                .zip(densities)
                .map(|(&ct, &density)| ControlPoint { ct, density })
                .collect(),
        )
    }

    /// Build from a row-major 2×N buffer: row 0 CT values, row 1 densities
    pub fn from_rows(shape: &[usize], data: &[f64]) -> Result<Self> {
        let n = match *shape {
            [2, n] => n,
            _ => {
                return Err(Error::Shape(format!(
                    "conversion table must have shape [2, N], got {:?}",
                    shape
                )));
            }
        };
        if data.len() != 2 * n {
            return Err(Error::Shape(format!(
                "conversion table buffer holds {} values, expected {}",
                data.len(),
                2 * n
            )));
        }
        Self::from_columns(&data[..n], &data[n..])
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn first(&self) -> ControlPoint {
        self.points[0]
    }

    fn last(&self) -> ControlPoint {
        self.points[self.points.len() - 1]
    }

    /// Smallest CT value accepted (bottom of the low tolerance band)
    pub fn lower_limit(&self) -> f64 {
        let lo = self.first().ct;
        lo - TOLERANCE_FRACTION * lo.abs()
    }

    /// Largest CT value accepted (top of the high tolerance band)
    pub fn upper_limit(&self) -> f64 {
        let hi = self.last().ct;
        hi + TOLERANCE_FRACTION * hi.abs()
    }

    /// Convert a single CT value to density
    pub fn convert(&self, value: f64) -> Result<f64> {
        let first = self.first();
        let last = self.last();

        if value <= first.ct && value >= self.lower_limit() {
            return Ok(first.density);
        }
        if value >= last.ct && value <= self.upper_limit() {
            return Ok(last.density);
        }
        if value > first.ct && value < last.ct {
            // ct[i] <= value < ct[i + 1]
            let i = self.points.partition_point(|p| p.ct <= value) - 1;
            let interval = self.intervals[i];
            return Ok(value * interval.slope + interval.intercept);
        }

        Err(Error::Range { value, low: first.ct, high: last.ct })
    }
}
