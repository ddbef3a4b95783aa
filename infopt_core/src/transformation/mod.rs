//! Transformation of an infinite model into a finite optimizer model
//!
//! A [`TransformationBackend`] owns the optimizer model it builds, and maps references and
//! results between the infinite model and the optimizer model.
use std::fmt::Debug;

use serde::Serialize;
use thiserror::Error;

use crate::infinite_model::constraint::ConstraintRef;
use crate::infinite_model::expression::{AffineExpr, ModelRef};
use crate::infinite_model::measure::MeasureRef;
use crate::infinite_model::parameter::ParameterRef;
use crate::infinite_model::variable::VariableRef;
use crate::infinite_model::ModelData;
use crate::optimize::constraint::ConstraintIndex;
use crate::optimize::expression::LinearExpr;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::SolverError;
use crate::optimize::variable::VariableIndex;
use crate::results::ResultError;

pub mod transcription;

/// Result of mapping an object of the infinite model into the optimizer model
///
/// Finite objects map to a single item. Infinite objects map to one item per support
/// combination of the parameters they depend on, `supports[i]` being the parameter values
/// of `values[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Mapped<T> {
    Finite(T),
    Infinite {
        supports: Vec<Vec<f64>>,
        values: Vec<T>,
    },
}

impl<T> Mapped<T> {
    /// The item of a finite mapping
    pub fn finite(&self) -> Option<&T> {
        match self {
            Mapped::Finite(value) => Some(value),
            Mapped::Infinite { .. } => None,
        }
    }

    pub fn into_finite(self) -> Option<T> {
        match self {
            Mapped::Finite(value) => Some(value),
            Mapped::Infinite { .. } => None,
        }
    }

    /// All mapped items, a single one for finite mappings
    pub fn values(&self) -> &[T] {
        match self {
            Mapped::Finite(value) => std::slice::from_ref(value),
            Mapped::Infinite { values, .. } => values,
        }
    }

    /// Parameter values of each item, None for finite mappings
    pub fn supports(&self) -> Option<&[Vec<f64>]> {
        match self {
            Mapped::Finite(_) => None,
            Mapped::Infinite { supports, .. } => Some(supports),
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Mapped::Infinite { .. })
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> Mapped<U> {
        match self {
            Mapped::Finite(value) => Mapped::Finite(f(value)),
            Mapped::Infinite { supports, values } => Mapped::Infinite {
                supports,
                values: values.into_iter().map(f).collect(),
            },
        }
    }

    /// Map every item, stopping at the first error
    pub fn try_map<U, E, F: FnMut(T) -> Result<U, E>>(self, mut f: F) -> Result<Mapped<U>, E> {
        Ok(match self {
            Mapped::Finite(value) => Mapped::Finite(f(value)?),
            Mapped::Infinite { supports, values } => Mapped::Infinite {
                supports,
                values: values.into_iter().map(f).collect::<Result<Vec<_>, E>>()?,
            },
        })
    }
}

/// A way of transforming an infinite model into a finite optimizer model
///
/// Implementors provide the transformation and the mapping of indices. Mapping of results
/// is provided on top of those.
pub trait TransformationBackend: Debug {
    /// Name of the backend
    fn name(&self) -> &'static str;

    /// Build the optimizer model from the model definitions, replacing any previous build
    fn build(&mut self, model: &ModelData) -> Result<(), TransformationError>;

    fn optimizer_model(&self) -> &Problem;

    fn optimizer_model_mut(&mut self) -> &mut Problem;

    /// Optimizer variable(s) of a variable
    fn map_variable_index(
        &self,
        variable: VariableRef,
    ) -> Result<Mapped<VariableIndex>, TransformationError>;

    /// Optimizer constraint(s) of a constraint
    fn map_constraint_index(
        &self,
        constraint: ConstraintRef,
    ) -> Result<Mapped<ConstraintIndex>, TransformationError>;

    /// Optimizer expression(s) of a measure
    fn map_measure(&self, measure: MeasureRef) -> Result<Mapped<LinearExpr>, TransformationError>;

    /// Optimizer expression(s) of an expression
    fn map_expression(
        &self,
        expression: &AffineExpr,
    ) -> Result<Mapped<LinearExpr>, TransformationError>;

    /// Supports of a parameter used in the last build
    fn parameter_supports(&self, parameter: ParameterRef) -> Result<Vec<f64>, TransformationError>;

    /// Primal value(s) of a parameter, variable or measure
    ///
    /// Parameters take the value of their supports.
    fn map_value(&self, item: ModelRef, result: usize) -> Result<Mapped<f64>, ResultError> {
        let problem = self.optimizer_model();
        match item {
            ModelRef::Variable(variable) => Ok(self
                .map_variable_index(variable)?
                .try_map(|index| problem.variable_value(index, result))?),
            ModelRef::Parameter(parameter) => {
                let supports = self.parameter_supports(parameter)?;
                Ok(Mapped::Infinite {
                    supports: supports.iter().map(|s| vec![*s]).collect(),
                    values: supports,
                })
            }
            ModelRef::Measure(measure) => Ok(self
                .map_measure(measure)?
                .try_map(|expression| evaluate(problem, &expression, result))?),
        }
    }

    /// Primal value(s) of an expression
    fn map_expression_value(
        &self,
        expression: &AffineExpr,
        result: usize,
    ) -> Result<Mapped<f64>, ResultError> {
        let problem = self.optimizer_model();
        Ok(self
            .map_expression(expression)?
            .try_map(|expression| evaluate(problem, &expression, result))?)
    }

    /// Primal value(s) of the function of a constraint
    fn map_constraint_value(
        &self,
        constraint: ConstraintRef,
        result: usize,
    ) -> Result<Mapped<f64>, ResultError> {
        let problem = self.optimizer_model();
        Ok(self
            .map_constraint_index(constraint)?
            .try_map(|index| problem.constraint_value(index, result))?)
    }

    /// Dual(s) of a constraint
    fn map_dual(&self, constraint: ConstraintRef, result: usize) -> Result<Mapped<f64>, ResultError> {
        let problem = self.optimizer_model();
        Ok(self
            .map_constraint_index(constraint)?
            .try_map(|index| problem.dual(index, result))?)
    }

    /// Shadow price(s) of a constraint
    fn map_shadow_price(
        &self,
        constraint: ConstraintRef,
        result: usize,
    ) -> Result<Mapped<f64>, ResultError> {
        let problem = self.optimizer_model();
        Ok(self
            .map_constraint_index(constraint)?
            .try_map(|index| problem.shadow_price(index, result))?)
    }
}

/// Evaluate an optimizer expression at the primal solution `result`
fn evaluate(problem: &Problem, expression: &LinearExpr, result: usize) -> Result<f64, SolverError> {
    expression
        .terms
        .iter()
        .try_fold(expression.constant, |total, (index, coef)| {
            Ok(total + coef * problem.variable_value(*index, result)?)
        })
}

/// Errors from transforming a model, or mapping references into the optimizer model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformationError {
    /// The reference wasn't part of the model when it was last built
    #[error("{0} is not part of the optimizer model, build the model again")]
    NotTransformed(String),
    /// A value used by the model is not a support of its parameter
    #[error("{value} is not a support of parameter p{parameter}")]
    SupportNotFound { parameter: usize, value: f64 },
    #[error("The objective depends on infinite parameters")]
    InfiniteObjective,
    #[error("Measure {0} contains another measure")]
    NestedMeasure(String),
    #[error(transparent)]
    Problem(#[from] ProblemError),
}
