//! Implements a solver interface for Clarabel
//!
//! Clarabel solves `min q'x` subject to `Ax + s = b` with `s` in a product of cones. Equality
//! rows (equality constraints and fixed variables) go in a zero cone, every finite side of an
//! inequality or variable bound becomes a row of a nonnegative cone.
use std::time::Instant;

use ::clarabel::algebra::CscMatrix;
use ::clarabel::solver::{
    DefaultSettings, DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus,
    SupportedConeT,
};
use nalgebra::DVector;
use nalgebra_sparse::CooMatrix;
use tracing::{debug, warn};

use crate::configuration;
use crate::optimize::constraint::Constraint;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{BoundDuals, ProblemSolution, ResultStatus, TerminationStatus};

/// Clarabel interior point solver
#[derive(Debug, Clone, PartialEq)]
pub struct ClarabelSolver {
    /// Feasibility and gap tolerance
    pub tolerance: f64,
    pub max_iterations: u32,
    /// Time limit in seconds
    pub time_limit: Option<f64>,
    pub verbose: bool,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        Self::from_configuration()
    }
}

impl ClarabelSolver {
    /// Create a solver with settings taken from the current configuration
    pub fn from_configuration() -> Self {
        let config = configuration::current();
        ClarabelSolver {
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
            time_limit: config.time_limit,
            verbose: config.verbose,
        }
    }

    fn settings(&self) -> Result<DefaultSettings<f64>, SolverError> {
        let mut builder = DefaultSettingsBuilder::default();
        builder
            .verbose(self.verbose)
            .max_iter(self.max_iterations)
            .tol_feas(self.tolerance)
            .tol_gap_abs(self.tolerance)
            .tol_gap_rel(self.tolerance);
        if let Some(limit) = self.time_limit {
            builder.time_limit(limit);
        }
        builder
            .build()
            .map_err(|e| SolverError::InvalidSettings(e.to_string()))
    }
}

impl Solver for ClarabelSolver {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let settings = self.settings()?;
        let n = problem.num_variables();
        if n == 0 {
            return Ok(empty_problem_solution(problem));
        }
        let rows = RowBuilder::from_problem(problem);
        let m = rows.b.len();
        debug!(rows = m, columns = n, "Assembled Clarabel problem");

        let quadratic = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());
        let linear = problem.objective().minimization_coefficients(n);
        let constraints = rows.matrix(n);
        let cones = rows.cones();

        let start = Instant::now();
        let mut solver = DefaultSolver::new(
            &quadratic,
            &linear,
            &constraints,
            &rows.b,
            &cones,
            settings,
        );
        solver.solve();
        let solve_time = start.elapsed().as_secs_f64();

        let status = solver.solution.status.clone();
        let (termination_status, primal_status, dual_status) = map_status(&status);
        if !primal_status.has_values() {
            warn!(status = ?status, "Clarabel did not find a primal solution");
        }

        let mut solution = ProblemSolution::new(termination_status, &format!("{:?}", status));
        solution.primal_status = primal_status;
        solution.dual_status = dual_status;
        solution.result_count = usize::from(primal_status.has_values() || dual_status.has_values());
        solution.solve_time = solve_time;
        solution.barrier_iterations = Some(u64::from(solver.solution.iterations));

        if primal_status.has_values() {
            let x = solver.solution.x.clone();
            solution.objective_value = Some(problem.objective().expression().evaluate(&x));
            solution.variable_values = Some(x);
        }
        if dual_status.has_values() {
            let z = &solver.solution.z;
            let sense = problem.objective_sense().minimization_sign();
            let dual_objective = -DVector::from_column_slice(&rows.b).dot(&DVector::from_column_slice(z));
            solution.dual_objective_value =
                Some(sense * dual_objective + problem.objective().expression().constant);
            let (constraint_duals, bound_duals) = rows.duals(z, problem);
            solution.constraint_duals = Some(constraint_duals);
            solution.bound_duals = Some(bound_duals);
        }
        Ok(solution)
    }
}

/// A problem without variables is solved by its objective constant
fn empty_problem_solution(problem: &Problem) -> ProblemSolution {
    let feasible = problem.constraints().all(|(_, cons)| match cons {
        Constraint::Equality { equals, .. } => equals.abs() <= f64::EPSILON,
        Constraint::Inequality {
            lower_bound,
            upper_bound,
            ..
        } => *lower_bound <= 0. && 0. <= *upper_bound,
    });
    if !feasible {
        return ProblemSolution::new(TerminationStatus::Infeasible, "Infeasible");
    }
    let constant = problem.objective().expression().constant;
    let mut solution = ProblemSolution::new(TerminationStatus::Optimal, "Solved");
    solution.primal_status = ResultStatus::FeasiblePoint;
    solution.dual_status = ResultStatus::FeasiblePoint;
    solution.result_count = 1;
    solution.objective_value = Some(constant);
    solution.dual_objective_value = Some(constant);
    solution.variable_values = Some(Vec::new());
    solution.constraint_duals = Some(vec![0.; problem.num_constraints()]);
    solution.bound_duals = Some(Vec::new());
    solution
}

/// Map a Clarabel status to termination, primal and dual statuses
fn map_status(status: &SolverStatus) -> (TerminationStatus, ResultStatus, ResultStatus) {
    match status {
        SolverStatus::Solved => (
            TerminationStatus::Optimal,
            ResultStatus::FeasiblePoint,
            ResultStatus::FeasiblePoint,
        ),
        SolverStatus::AlmostSolved => (
            TerminationStatus::AlmostOptimal,
            ResultStatus::NearlyFeasiblePoint,
            ResultStatus::NearlyFeasiblePoint,
        ),
        SolverStatus::PrimalInfeasible => (
            TerminationStatus::Infeasible,
            ResultStatus::NoSolution,
            ResultStatus::InfeasibilityCertificate,
        ),
        SolverStatus::AlmostPrimalInfeasible => (
            TerminationStatus::AlmostInfeasible,
            ResultStatus::NoSolution,
            ResultStatus::NearlyInfeasibilityCertificate,
        ),
        SolverStatus::DualInfeasible => (
            TerminationStatus::DualInfeasible,
            ResultStatus::InfeasibilityCertificate,
            ResultStatus::NoSolution,
        ),
        SolverStatus::AlmostDualInfeasible => (
            TerminationStatus::AlmostDualInfeasible,
            ResultStatus::NearlyInfeasibilityCertificate,
            ResultStatus::NoSolution,
        ),
        SolverStatus::MaxIterations => (
            TerminationStatus::IterationLimit,
            ResultStatus::UnknownResultStatus,
            ResultStatus::UnknownResultStatus,
        ),
        SolverStatus::MaxTime => (
            TerminationStatus::TimeLimit,
            ResultStatus::UnknownResultStatus,
            ResultStatus::UnknownResultStatus,
        ),
        SolverStatus::NumericalError => (
            TerminationStatus::NumericalError,
            ResultStatus::NoSolution,
            ResultStatus::NoSolution,
        ),
        SolverStatus::InsufficientProgress => (
            TerminationStatus::SlowProgress,
            ResultStatus::UnknownResultStatus,
            ResultStatus::UnknownResultStatus,
        ),
        #[allow(unreachable_patterns)]
        _ => (
            TerminationStatus::OtherError,
            ResultStatus::NoSolution,
            ResultStatus::NoSolution,
        ),
    }
}

/// Where a row of the Clarabel constraint matrix came from
#[derive(Debug, Clone, Copy, PartialEq)]
enum RowOrigin {
    /// `a'x = b`
    Equality(usize),
    /// `a'x >= l`, stored as `-a'x + s = -l`
    LowerSide(usize),
    /// `a'x <= u`
    UpperSide(usize),
    /// `x = v`
    VariableFix(usize),
    /// `x >= l`, stored as `-x + s = -l`
    VariableLower(usize),
    /// `x <= u`
    VariableUpper(usize),
}

/// Rows of `Ax + s = b`, zero cone rows first
#[derive(Debug, Default)]
struct RowBuilder {
    /// (row, column, value) entries of A
    entries: Vec<(usize, usize, f64)>,
    b: Vec<f64>,
    origins: Vec<RowOrigin>,
    num_equalities: usize,
}

impl RowBuilder {
    fn from_problem(problem: &Problem) -> Self {
        let mut rows = RowBuilder::default();
        // Zero cone
        for (i, (_, cons)) in problem.constraints().enumerate() {
            if let Constraint::Equality { equals, .. } = cons {
                rows.push_constraint(cons, 1., *equals, RowOrigin::Equality(i));
            }
        }
        for var in problem.variables() {
            if let Some(value) = var.fixed {
                rows.push_variable(var.index.0, 1., value, RowOrigin::VariableFix(var.index.0));
            }
        }
        rows.num_equalities = rows.b.len();
        // Nonnegative cone
        for (i, (_, cons)) in problem.constraints().enumerate() {
            if let Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } = cons
            {
                if lower_bound.is_finite() {
                    rows.push_constraint(cons, -1., -lower_bound, RowOrigin::LowerSide(i));
                }
                if upper_bound.is_finite() {
                    rows.push_constraint(cons, 1., *upper_bound, RowOrigin::UpperSide(i));
                }
            }
        }
        for var in problem.variables() {
            let j = var.index.0;
            if var.has_lower_bound() {
                rows.push_variable(j, -1., -var.lower_bound, RowOrigin::VariableLower(j));
            }
            if var.has_upper_bound() {
                rows.push_variable(j, 1., var.upper_bound, RowOrigin::VariableUpper(j));
            }
        }
        rows
    }

    fn push_constraint(&mut self, cons: &Constraint, sign: f64, rhs: f64, origin: RowOrigin) {
        let row = self.b.len();
        for term in cons.terms() {
            self.entries
                .push((row, term.variable.0, sign * term.coefficient));
        }
        self.b.push(rhs);
        self.origins.push(origin);
    }

    fn push_variable(&mut self, column: usize, sign: f64, rhs: f64, origin: RowOrigin) {
        let row = self.b.len();
        self.entries.push((row, column, sign));
        self.b.push(rhs);
        self.origins.push(origin);
    }

    /// Assemble A in compressed sparse column form, duplicate entries are summed
    fn matrix(&self, num_columns: usize) -> CscMatrix<f64> {
        let mut coo = CooMatrix::new(self.b.len(), num_columns);
        for (row, col, value) in &self.entries {
            coo.push(*row, *col, *value);
        }
        let csc = nalgebra_sparse::CscMatrix::from(&coo);
        let (col_offsets, row_indices, values) = csc.disassemble();
        CscMatrix::new(self.b.len(), num_columns, col_offsets, row_indices, values)
    }

    fn cones(&self) -> Vec<SupportedConeT<f64>> {
        let num_inequalities = self.b.len() - self.num_equalities;
        let mut cones = Vec::new();
        if self.num_equalities > 0 {
            cones.push(SupportedConeT::ZeroConeT(self.num_equalities));
        }
        if num_inequalities > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(num_inequalities));
        }
        cones
    }

    /// Convert Clarabel's row duals into constraint and bound duals
    ///
    /// `z` is the sensitivity of the minimization objective to `-b`, so `>=` rows (stored
    /// negated) give non-negative duals and `<=` or equality rows give `-z`.
    fn duals(&self, z: &[f64], problem: &Problem) -> (Vec<f64>, Vec<BoundDuals>) {
        let mut constraint_duals = vec![0.; problem.num_constraints()];
        let mut bound_duals = vec![BoundDuals::default(); problem.num_variables()];
        for (origin, dual) in self.origins.iter().zip(z) {
            match origin {
                RowOrigin::Equality(i) => constraint_duals[*i] -= dual,
                RowOrigin::LowerSide(i) => constraint_duals[*i] += dual,
                RowOrigin::UpperSide(i) => constraint_duals[*i] -= dual,
                RowOrigin::VariableFix(j) => bound_duals[*j].fix = -dual,
                RowOrigin::VariableLower(j) => bound_duals[*j].lower = *dual,
                RowOrigin::VariableUpper(j) => bound_duals[*j].upper = -dual,
            }
        }
        (constraint_duals, bound_duals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::constraint::ConstraintIndex;
    use crate::optimize::expression::LinearExpr;
    use crate::optimize::objective::ObjectiveSense;
    use crate::optimize::variable::VariableIndex;
    use approx::assert_abs_diff_eq;

    /// optimize 2x + y subject to x + y >= 2, x >= 0, 0 <= y <= 1.5
    fn lp(sense: ObjectiveSense, scale: f64) -> Problem {
        let mut problem = Problem::new(sense);
        let x = problem.add_new_variable("x", 0., f64::INFINITY).unwrap();
        let y = problem.add_new_variable("y", 0., 1.5).unwrap();
        let mut sum = LinearExpr::new();
        sum.add_term(x, 1.);
        sum.add_term(y, 1.);
        problem
            .add_constraint("sum", Constraint::new_inequality(&sum, 2., f64::INFINITY))
            .unwrap();
        let mut objective = LinearExpr::constant(scale);
        objective.add_term(x, 2. * scale);
        objective.add_term(y, scale);
        problem.set_objective(sense, objective).unwrap();
        problem
    }

    #[test]
    fn row_layout() {
        let mut problem = lp(ObjectiveSense::Minimize, 1.);
        problem.fix_variable(VariableIndex(1), 1.).unwrap();
        let rows = RowBuilder::from_problem(&problem);
        assert_eq!(
            rows.origins,
            vec![
                RowOrigin::VariableFix(1),
                RowOrigin::LowerSide(0),
                RowOrigin::VariableLower(0),
            ]
        );
        assert_eq!(rows.b, vec![1., -2., -0.]);
        assert_eq!(rows.num_equalities, 1);
        assert_eq!(rows.cones().len(), 2);
        let matrix = rows.matrix(2);
        assert_eq!(matrix.m, 3);
        assert_eq!(matrix.n, 2);
    }

    #[test]
    fn solve_minimization() {
        let mut problem = lp(ObjectiveSense::Minimize, 1.);
        problem.optimize(&mut ClarabelSolver::default()).unwrap();

        assert_eq!(problem.termination_status(), TerminationStatus::Optimal);
        assert_eq!(problem.primal_status(1), ResultStatus::FeasiblePoint);
        assert!(problem.barrier_iterations().unwrap() > 0);
        assert_abs_diff_eq!(problem.objective_value(1).unwrap(), 3.5, epsilon = 1e-5);
        assert_abs_diff_eq!(problem.dual_objective_value(1).unwrap(), 3.5, epsilon = 1e-5);
        assert_abs_diff_eq!(
            problem.variable_value(VariableIndex(0), 1).unwrap(),
            0.5,
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(
            problem.variable_value(VariableIndex(1), 1).unwrap(),
            1.5,
            epsilon = 1e-5
        );
        let sum = ConstraintIndex::Linear(0);
        assert_abs_diff_eq!(problem.constraint_value(sum, 1).unwrap(), 2., epsilon = 1e-5);
        assert_abs_diff_eq!(problem.dual(sum, 1).unwrap(), 2., epsilon = 1e-5);
        // Relaxing sum >= 2 can only lower the objective
        assert_abs_diff_eq!(problem.shadow_price(sum, 1).unwrap(), -2., epsilon = 1e-5);
        let y_upper = ConstraintIndex::UpperBound(VariableIndex(1));
        assert_abs_diff_eq!(problem.dual(y_upper, 1).unwrap(), -1., epsilon = 1e-5);
        assert_abs_diff_eq!(problem.shadow_price(y_upper, 1).unwrap(), -1., epsilon = 1e-5);
        let x_lower = ConstraintIndex::LowerBound(VariableIndex(0));
        assert_abs_diff_eq!(problem.dual(x_lower, 1).unwrap(), 0., epsilon = 1e-5);
        assert!(matches!(
            problem.objective_bound(),
            Err(SolverError::UnsupportedAttribute(_))
        ));
    }

    #[test]
    fn solve_maximization() {
        // maximize -(2x + y) - 1 has the same solution, and the same conic duals
        let mut problem = lp(ObjectiveSense::Maximize, -1.);
        problem.optimize(&mut ClarabelSolver::default()).unwrap();

        assert_eq!(problem.termination_status(), TerminationStatus::Optimal);
        assert_abs_diff_eq!(problem.objective_value(1).unwrap(), -3.5, epsilon = 1e-5);
        assert_abs_diff_eq!(problem.dual_objective_value(1).unwrap(), -3.5, epsilon = 1e-5);
        let sum = ConstraintIndex::Linear(0);
        assert_abs_diff_eq!(problem.dual(sum, 1).unwrap(), 2., epsilon = 1e-5);
        assert_abs_diff_eq!(problem.shadow_price(sum, 1).unwrap(), 2., epsilon = 1e-5);
        let y_upper = ConstraintIndex::UpperBound(VariableIndex(1));
        assert_abs_diff_eq!(problem.shadow_price(y_upper, 1).unwrap(), 1., epsilon = 1e-5);
    }

    #[test]
    fn solve_fixed_variable() {
        let mut problem = lp(ObjectiveSense::Minimize, 1.);
        problem.fix_variable(VariableIndex(1), 1.).unwrap();
        problem.optimize(&mut ClarabelSolver::default()).unwrap();

        assert_abs_diff_eq!(
            problem.variable_value(VariableIndex(0), 1).unwrap(),
            1.,
            epsilon = 1e-5
        );
        // Raising the fixed value of y by one lets x drop by one: 1 - 2 = -1
        let y_fix = ConstraintIndex::Fix(VariableIndex(1));
        assert_abs_diff_eq!(problem.dual(y_fix, 1).unwrap(), -1., epsilon = 1e-5);
        assert_abs_diff_eq!(problem.shadow_price(y_fix, 1).unwrap(), -1., epsilon = 1e-5);
    }

    #[test]
    fn solve_infeasible() {
        let mut problem = lp(ObjectiveSense::Minimize, 1.);
        problem
            .set_variable_bounds(VariableIndex(0), 0., 0.25)
            .unwrap();
        problem.optimize(&mut ClarabelSolver::default()).unwrap();

        assert_eq!(problem.termination_status(), TerminationStatus::Infeasible);
        assert_eq!(problem.primal_status(1), ResultStatus::NoSolution);
        assert!(matches!(
            problem.variable_value(VariableIndex(0), 1),
            Err(SolverError::NoPrimalSolution)
        ));
    }

    #[test]
    fn solve_empty() {
        let mut problem = Problem::new_minimization();
        problem
            .set_objective(ObjectiveSense::Minimize, LinearExpr::constant(4.))
            .unwrap();
        problem.optimize(&mut ClarabelSolver::default()).unwrap();
        assert_eq!(problem.termination_status(), TerminationStatus::Optimal);
        assert_abs_diff_eq!(problem.objective_value(1).unwrap(), 4.);
    }
}
