//! Provides struct for representing an optimization problem's objective
use serde::{Deserialize, Serialize};

use crate::optimize::expression::LinearExpr;

/// Represents the Objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Linear expression to optimize
    pub(crate) expression: LinearExpr,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    pub(crate) sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            expression: LinearExpr::new(),
            sense,
        }
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn expression(&self) -> &LinearExpr {
        &self.expression
    }

    /// Coefficients of the objective in minimization form, indexed by variable position
    ///
    /// Maximization objectives are negated so every solver can minimize.
    pub(crate) fn minimization_coefficients(&self, num_variables: usize) -> Vec<f64> {
        let sign = self.sense.minimization_sign();
        let mut coefficients = vec![0.; num_variables];
        for (var, coef) in &self.expression.terms {
            coefficients[var.0] += sign * coef;
        }
        coefficients
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

impl ObjectiveSense {
    /// 1 for minimization, -1 for maximization
    pub(crate) fn minimization_sign(&self) -> f64 {
        match self {
            ObjectiveSense::Minimize => 1.,
            ObjectiveSense::Maximize => -1.,
        }
    }
}
