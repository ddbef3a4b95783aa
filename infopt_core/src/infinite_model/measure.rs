//! Measures, reductions of an expression over an infinite parameter
use serde::{Deserialize, Serialize};

use crate::infinite_model::expression::AffineExpr;
use crate::infinite_model::parameter::ParameterRef;

/// Reference to a measure of an [`InfiniteModel`](crate::infinite_model::InfiniteModel)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeasureRef(pub(crate) usize);

impl MeasureRef {
    /// Position of the measure in the model
    pub fn index(&self) -> usize {
        self.0
    }
}

/// How a measure reduces its integrand over the supports of the parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    /// Integral over the parameter domain, approximated with the trapezoid rule
    Integral,
    /// Integral divided by the width of the domain
    Expectation,
    /// Sum of the integrand at every support
    SupportSum,
}

impl MeasureKind {
    /// Weight of each support
    ///
    /// `supports` must be sorted. With a single support the integral is the integrand times the
    /// width of the domain.
    pub fn weights(&self, supports: &[f64], lower_bound: f64, upper_bound: f64) -> Vec<f64> {
        match self {
            MeasureKind::SupportSum => vec![1.; supports.len()],
            MeasureKind::Integral => trapezoid_weights(supports, lower_bound, upper_bound),
            MeasureKind::Expectation => {
                let width = upper_bound - lower_bound;
                let weights = trapezoid_weights(supports, lower_bound, upper_bound);
                if width > 0. {
                    weights.into_iter().map(|w| w / width).collect()
                } else {
                    // Degenerate domain, the expectation is the value at the only point
                    vec![1. / supports.len() as f64; supports.len()]
                }
            }
        }
    }
}

fn trapezoid_weights(supports: &[f64], lower_bound: f64, upper_bound: f64) -> Vec<f64> {
    if supports.len() == 1 {
        return vec![upper_bound - lower_bound];
    }
    let mut weights = vec![0.; supports.len()];
    for (i, pair) in supports.windows(2).enumerate() {
        let half_width = (pair[1] - pair[0]) / 2.;
        weights[i] += half_width;
        weights[i + 1] += half_width;
    }
    weights
}

/// A measure of an infinite model
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub name: String,
    /// Expression being measured, can't contain other measures
    pub integrand: AffineExpr,
    /// Parameter the integrand is reduced over
    pub parameter: ParameterRef,
    pub kind: MeasureKind,
}
