//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Position of a variable in a [`Problem`](crate::optimize::problem::Problem)
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct VariableIndex(pub usize);

impl Display for VariableIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "VariableIndex({})", self.0)
    }
}

/// A continuous variable in an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Used to identify the variable
    pub id: String,
    /// Lowest value the variable can take, may be `f64::NEG_INFINITY`
    pub lower_bound: f64,
    /// Highest value the variable can take, may be `f64::INFINITY`
    pub upper_bound: f64,
    /// Value the variable is fixed to, if any. A fixed variable ignores its bounds.
    pub fixed: Option<f64>,
    /// Index of the variable in the problem
    pub index: VariableIndex,
}

impl Variable {
    /// Create a new free variable
    pub(crate) fn new(id: &str, index: VariableIndex) -> Self {
        Variable {
            id: id.to_string(),
            lower_bound: f64::NEG_INFINITY,
            upper_bound: f64::INFINITY,
            fixed: None,
            index,
        }
    }

    /// Does the variable have a finite lower bound (and isn't fixed)
    pub fn has_lower_bound(&self) -> bool {
        self.fixed.is_none() && self.lower_bound.is_finite()
    }

    /// Does the variable have a finite upper bound (and isn't fixed)
    pub fn has_upper_bound(&self) -> bool {
        self.fixed.is_none() && self.upper_bound.is_finite()
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed.is_some()
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.fixed {
            Some(value) => write!(f, "{} = {}", self.id, value),
            None => write!(f, "{} <= {} <= {}", self.lower_bound, self.id, self.upper_bound),
        }
    }
}
