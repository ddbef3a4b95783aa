//! Solver interface for the HiGHS linear programming solver
use std::time::Instant;

use highs::{HighsModelStatus, RowProblem, Sense};
use tracing::{debug, warn};

use crate::configuration;
use crate::optimize::constraint::Constraint;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{BoundDuals, ProblemSolution, ResultStatus, TerminationStatus};

/// HiGHS simplex solver
#[derive(Debug, Clone, PartialEq)]
pub struct HighsSolver {
    /// Primal and dual feasibility tolerance
    pub tolerance: f64,
    /// Time limit in seconds
    pub time_limit: Option<f64>,
    pub verbose: bool,
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::from_configuration()
    }
}

impl HighsSolver {
    /// Create a solver with settings taken from the current configuration
    pub fn from_configuration() -> Self {
        let config = configuration::current();
        HighsSolver {
            tolerance: config.tolerance,
            time_limit: config.time_limit,
            verbose: config.verbose,
        }
    }
}

impl Solver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let mut highs_problem = RowProblem::default();
        let objective = problem
            .objective()
            .minimization_coefficients(problem.num_variables());
        let columns = problem
            .variables()
            .map(|var| {
                let (lower, upper) = match var.fixed {
                    Some(value) => (value, value),
                    None => (var.lower_bound, var.upper_bound),
                };
                highs_problem.add_column(objective[var.index.0], lower..=upper)
            })
            .collect::<Vec<_>>();
        for (_, cons) in problem.constraints() {
            let (lower, upper) = match cons {
                Constraint::Equality { equals, .. } => (*equals, *equals),
                Constraint::Inequality {
                    lower_bound,
                    upper_bound,
                    ..
                } => (*lower_bound, *upper_bound),
            };
            let factors = cons
                .terms()
                .iter()
                .map(|t| (columns[t.variable.0], t.coefficient))
                .collect::<Vec<_>>();
            highs_problem.add_row(lower..=upper, factors);
        }
        debug!(
            rows = problem.num_constraints(),
            columns = problem.num_variables(),
            "Assembled HiGHS problem"
        );

        let mut model = highs_problem.optimise(Sense::Minimise);
        if !self.verbose {
            model.make_quiet();
        }
        model.set_option("primal_feasibility_tolerance", self.tolerance);
        model.set_option("dual_feasibility_tolerance", self.tolerance);
        if let Some(limit) = self.time_limit {
            model.set_option("time_limit", limit);
        }

        let start = Instant::now();
        let solved = model.solve();
        let solve_time = start.elapsed().as_secs_f64();

        let status = solved.status();
        let (termination_status, primal_status, dual_status) = match status {
            HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => (
                TerminationStatus::Optimal,
                ResultStatus::FeasiblePoint,
                ResultStatus::FeasiblePoint,
            ),
            HighsModelStatus::Infeasible => (
                TerminationStatus::Infeasible,
                ResultStatus::NoSolution,
                ResultStatus::NoSolution,
            ),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => (
                TerminationStatus::DualInfeasible,
                ResultStatus::NoSolution,
                ResultStatus::NoSolution,
            ),
            HighsModelStatus::ReachedTimeLimit => (
                TerminationStatus::TimeLimit,
                ResultStatus::UnknownResultStatus,
                ResultStatus::NoSolution,
            ),
            HighsModelStatus::ReachedIterationLimit => (
                TerminationStatus::IterationLimit,
                ResultStatus::UnknownResultStatus,
                ResultStatus::NoSolution,
            ),
            _ => (
                TerminationStatus::OtherError,
                ResultStatus::NoSolution,
                ResultStatus::NoSolution,
            ),
        };
        if !primal_status.has_values() {
            warn!(status = ?status, "HiGHS did not find a primal solution");
        }

        let mut solution = ProblemSolution::new(termination_status, &format!("{:?}", status));
        solution.primal_status = primal_status;
        solution.dual_status = dual_status;
        solution.result_count = usize::from(primal_status.has_values());
        solution.solve_time = solve_time;
        if !primal_status.has_values() {
            return Ok(solution);
        }

        let highs_solution = solved.get_solution();
        let values = highs_solution.columns().to_vec();
        solution.objective_value = Some(problem.objective().expression().evaluate(&values));
        solution.variable_values = Some(values);
        if dual_status.has_values() {
            // The problem was given to HiGHS in minimization form, so its duals already follow
            // the conic convention
            let row_duals = highs_solution.dual_rows().to_vec();
            let bound_duals = problem
                .variables()
                .zip(highs_solution.dual_columns())
                .map(|(var, &reduced_cost)| {
                    if var.is_fixed() {
                        BoundDuals {
                            fix: reduced_cost,
                            ..Default::default()
                        }
                    } else {
                        BoundDuals {
                            lower: reduced_cost.max(0.),
                            upper: reduced_cost.min(0.),
                            fix: 0.,
                        }
                    }
                })
                .collect::<Vec<_>>();
            let dual_objective = problem
                .constraints()
                .zip(&row_duals)
                .map(|((_, cons), dual)| dual * active_side(cons, *dual))
                .sum::<f64>()
                + problem
                    .variables()
                    .zip(&bound_duals)
                    .map(|(var, duals)| match var.fixed {
                        Some(value) => duals.fix * value,
                        None => {
                            bound_term(duals.lower, var.lower_bound)
                                + bound_term(duals.upper, var.upper_bound)
                        }
                    })
                    .sum::<f64>();
            solution.dual_objective_value = Some(
                problem.objective_sense().minimization_sign() * dual_objective
                    + problem.objective().expression().constant,
            );
            solution.constraint_duals = Some(row_duals);
            solution.bound_duals = Some(bound_duals);
        }
        Ok(solution)
    }
}

/// Right hand side a constraint dual applies to, non-negative duals belong to the lower side
fn active_side(cons: &Constraint, dual: f64) -> f64 {
    match cons {
        Constraint::Equality { equals, .. } => *equals,
        Constraint::Inequality {
            lower_bound,
            upper_bound,
            ..
        } => {
            let side = if dual >= 0. { lower_bound } else { upper_bound };
            if side.is_finite() {
                *side
            } else {
                0.
            }
        }
    }
}

fn bound_term(dual: f64, bound: f64) -> f64 {
    if bound.is_finite() {
        dual * bound
    } else {
        0.
    }
}
