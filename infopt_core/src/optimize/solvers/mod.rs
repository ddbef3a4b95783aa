//! Interfaces to the numerical solvers used to solve a [`Problem`]
use std::fmt::Debug;

use cfg_if::cfg_if;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration;
use crate::optimize::constraint::ConstraintIndex;
use crate::optimize::problem::Problem;
use crate::optimize::variable::VariableIndex;
use crate::optimize::ProblemSolution;

pub mod clarabel;
#[cfg(feature = "highs")]
pub mod highs;

/// A numerical solver
pub trait Solver: Debug {
    /// Name of the solver
    fn name(&self) -> &'static str;

    /// Solve a problem
    ///
    /// Returns the solution found, which includes why the solver stopped. An `Err` is only
    /// returned when the solver couldn't be run at all.
    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Solvers which can be selected through the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Use the Clarabel interior point solver
    Clarabel,
    /// Use the HiGHS solver, requires the highs feature to be enabled
    Highs,
}

impl SolverKind {
    /// Create a solver of this kind, using the current configuration for its settings
    pub fn create(self) -> Result<Box<dyn Solver>, SolverError> {
        match self {
            SolverKind::Clarabel => Ok(Box::new(clarabel::ClarabelSolver::from_configuration())),
            SolverKind::Highs => {
                cfg_if! {
                    if #[cfg(feature = "highs")] {
                        Ok(Box::new(highs::HighsSolver::from_configuration()))
                    } else {
                        Err(SolverError::SolverNotAvailable("highs"))
                    }
                }
            }
        }
    }
}

/// Create the solver selected in the current configuration
pub fn default_solver() -> Result<Box<dyn Solver>, SolverError> {
    configuration::current().solver.create()
}

/// Errors from solving a problem, or from querying its solution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Results were requested before the problem was solved
    #[error("Optimize has not been called, or the problem was modified after optimizing")]
    OptimizeNotCalled,
    /// Results were requested for a result number the solver didn't report
    #[error("Result index {result} is out of bounds, the solver reported {count} result(s)")]
    ResultIndexOutOfBounds { result: usize, count: usize },
    /// Primal values were requested but the solver has none
    #[error("No primal solution is available")]
    NoPrimalSolution,
    /// Dual values were requested but the solver has none
    #[error("No dual solution is available")]
    NoDualSolution,
    /// The solver doesn't report the requested attribute
    #[error("The solver does not support the attribute {0}")]
    UnsupportedAttribute(&'static str),
    #[error("Invalid variable index {0}")]
    InvalidVariableIndex(VariableIndex),
    #[error("Invalid constraint index {0}")]
    InvalidConstraintIndex(ConstraintIndex),
    /// The requested solver wasn't compiled in
    #[error("The {0} solver is not available, enable its feature")]
    SolverNotAvailable(&'static str),
    /// The solver rejected its settings
    #[error("Invalid solver settings: {0}")]
    InvalidSettings(String),
}
