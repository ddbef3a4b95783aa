//! Module for constructing and solving the finite optimization problem a model is transformed into

pub mod constraint;
pub mod expression;
pub mod objective;
pub mod problem;
pub mod solvers;
pub mod variable;

use serde::Serialize;

/// Struct representing the solution to an optimization problem, as reported by a solver
///
/// Vectors are indexed by variable or linear constraint position. Values that a solver
/// can't report are None, and querying them is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSolution {
    /// Why the solver stopped
    pub termination_status: TerminationStatus,
    /// Solver specific description of why the solver stopped
    pub raw_status: String,
    /// Status of the primal values
    pub primal_status: ResultStatus,
    /// Status of the dual values
    pub dual_status: ResultStatus,
    /// Number of results available, results are numbered starting from 1
    pub result_count: usize,
    /// Time spent solving, in seconds
    pub solve_time: f64,
    /// Objective value of the primal values
    pub objective_value: Option<f64>,
    /// Objective value of the dual values
    pub dual_objective_value: Option<f64>,
    /// Best known bound on the optimal objective value
    pub objective_bound: Option<f64>,
    pub simplex_iterations: Option<u64>,
    pub barrier_iterations: Option<u64>,
    pub node_count: Option<u64>,
    pub relative_gap: Option<f64>,
    /// Values of the variables
    pub variable_values: Option<Vec<f64>>,
    /// Duals of the linear constraints
    pub constraint_duals: Option<Vec<f64>>,
    /// Duals of the variable bounds
    pub bound_duals: Option<Vec<BoundDuals>>,
}

impl ProblemSolution {
    /// Create a solution with no values, and nothing but the status reported
    pub fn new(termination_status: TerminationStatus, raw_status: &str) -> Self {
        ProblemSolution {
            termination_status,
            raw_status: raw_status.to_string(),
            primal_status: ResultStatus::NoSolution,
            dual_status: ResultStatus::NoSolution,
            result_count: 0,
            solve_time: 0.,
            objective_value: None,
            dual_objective_value: None,
            objective_bound: None,
            simplex_iterations: None,
            barrier_iterations: None,
            node_count: None,
            relative_gap: None,
            variable_values: None,
            constraint_duals: None,
            bound_duals: None,
        }
    }
}

/// Duals of the bounds of a single variable
///
/// Bounds a variable doesn't have have a dual of 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundDuals {
    pub lower: f64,
    pub upper: f64,
    pub fix: f64,
}

/// Reason the solver stopped
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
    /// Problem has not yet attempted to be optimized
    OptimizeNotCalled,
    /// Problem has been optimized
    Optimal,
    /// An approximate solution has been found
    AlmostOptimal,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
    /// Problem is infeasible to within relaxed tolerances
    AlmostInfeasible,
    /// Problem can't be optimized because objective value is not bounded
    DualInfeasible,
    /// Problem is unbounded to within relaxed tolerances
    AlmostDualInfeasible,
    /// The solver hit the maximum allowed iterations
    IterationLimit,
    /// The solver hit the maximum allowed time
    TimeLimit,
    /// A numerical error occurred during solving
    NumericalError,
    /// The solver made insufficient progress
    SlowProgress,
    /// The solver stopped for some other reason
    OtherError,
}

impl TerminationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationStatus::OptimizeNotCalled => "optimize_not_called",
            TerminationStatus::Optimal => "optimal",
            TerminationStatus::AlmostOptimal => "almost_optimal",
            TerminationStatus::Infeasible => "infeasible",
            TerminationStatus::AlmostInfeasible => "almost_infeasible",
            TerminationStatus::DualInfeasible => "dual_infeasible",
            TerminationStatus::AlmostDualInfeasible => "almost_dual_infeasible",
            TerminationStatus::IterationLimit => "iteration_limit",
            TerminationStatus::TimeLimit => "time_limit",
            TerminationStatus::NumericalError => "numerical_error",
            TerminationStatus::SlowProgress => "slow_progress",
            TerminationStatus::OtherError => "other_error",
        }
    }
}

impl std::fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a set of primal or dual values
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// No values are available
    NoSolution,
    /// The values are feasible
    FeasiblePoint,
    /// The values are feasible to within relaxed tolerances
    NearlyFeasiblePoint,
    /// The values are infeasible
    InfeasiblePoint,
    /// The values certify that the other side of the problem is infeasible
    InfeasibilityCertificate,
    /// The values certify infeasibility to within relaxed tolerances
    NearlyInfeasibilityCertificate,
    /// Values are available, but the solver can't say anything about them
    UnknownResultStatus,
}

impl ResultStatus {
    /// Are there any values with this status
    pub fn has_values(self) -> bool {
        !matches!(self, ResultStatus::NoSolution)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResultStatus::NoSolution => "no_solution",
            ResultStatus::FeasiblePoint => "feasible_point",
            ResultStatus::NearlyFeasiblePoint => "nearly_feasible_point",
            ResultStatus::InfeasiblePoint => "infeasible_point",
            ResultStatus::InfeasibilityCertificate => "infeasibility_certificate",
            ResultStatus::NearlyInfeasibilityCertificate => "nearly_infeasibility_certificate",
            ResultStatus::UnknownResultStatus => "unknown_result_status",
        }
    }
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_solution() {
        let solution = ProblemSolution::new(TerminationStatus::Infeasible, "PrimalInfeasible");
        assert_eq!(solution.result_count, 0);
        assert!(!solution.primal_status.has_values());
        assert!(solution.variable_values.is_none());
        assert_eq!(solution.raw_status, "PrimalInfeasible");
    }

    #[test]
    fn status_display() {
        assert_eq!(TerminationStatus::Optimal.to_string(), "optimal");
        assert_eq!(
            TerminationStatus::OptimizeNotCalled.to_string(),
            "optimize_not_called"
        );
        assert_eq!(ResultStatus::FeasiblePoint.to_string(), "feasible_point");
        assert!(ResultStatus::InfeasibilityCertificate.has_values());
    }
}
