//! Provides struct representing an optimization problem
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::optimize::constraint::{Constraint, ConstraintIndex, SetKind};
use crate::optimize::expression::LinearExpr;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::{Variable, VariableIndex};
use crate::optimize::{ProblemSolution, ResultStatus, TerminationStatus};

/// An optimization problem
///
/// Any modification of the problem discards the stored solution.
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
    /// Solution from the last call to optimize, None before optimization
    solution: Option<ProblemSolution>,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
            solution: None,
        }
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    // region Update Objective
    /// Replace the objective of the problem
    pub fn set_objective(
        &mut self,
        sense: ObjectiveSense,
        expression: LinearExpr,
    ) -> Result<(), ProblemError> {
        if expression.terms.keys().any(|var| var.0 >= self.variables.len()) {
            return Err(ProblemError::NonExistentVariablesInObjective);
        }
        self.objective = Objective { expression, sense };
        self.reset_solution();
        Ok(())
    }
    // endregion Update Objective

    // region Adding Variables
    /// Add a new free variable to the problem
    pub fn add_variable(&mut self, id: &str) -> Result<VariableIndex, ProblemError> {
        if self.variables.contains_key(id) {
            return Err(ProblemError::VariableIdAlreadyExists(id.to_string()));
        }
        let index = VariableIndex(self.variables.len());
        self.variables.insert(id.to_string(), Variable::new(id, index));
        self.reset_solution();
        Ok(index)
    }

    /// Add a new variable with bounds to the problem
    pub fn add_new_variable(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<VariableIndex, ProblemError> {
        if lower_bound.is_nan() || upper_bound.is_nan() || lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        let index = self.add_variable(id)?;
        self.set_variable_bounds(index, lower_bound, upper_bound)?;
        Ok(index)
    }
    // endregion Adding Variables

    // region Update Variables
    /// Update the bounds of a variable, use infinite values to remove a bound
    pub fn set_variable_bounds(
        &mut self,
        index: VariableIndex,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound.is_nan() || upper_bound.is_nan() || lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        let var = self.variable_mut(index)?;
        var.lower_bound = lower_bound;
        var.upper_bound = upper_bound;
        self.reset_solution();
        Ok(())
    }

    /// Fix a variable to a value, its bounds are ignored while it is fixed
    pub fn fix_variable(&mut self, index: VariableIndex, value: f64) -> Result<(), ProblemError> {
        if !value.is_finite() {
            return Err(ProblemError::InvalidVariableBounds);
        }
        self.variable_mut(index)?.fixed = Some(value);
        self.reset_solution();
        Ok(())
    }

    /// Remove the fixed value of a variable
    pub fn unfix_variable(&mut self, index: VariableIndex) -> Result<(), ProblemError> {
        self.variable_mut(index)?.fixed = None;
        self.reset_solution();
        Ok(())
    }

    fn variable_mut(&mut self, index: VariableIndex) -> Result<&mut Variable, ProblemError> {
        self.variables
            .get_index_mut(index.0)
            .map(|(_, var)| var)
            .ok_or(ProblemError::NonExistentVariable)
    }
    // endregion Update Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(
        &mut self,
        id: &str,
        constraint: Constraint,
    ) -> Result<ConstraintIndex, ProblemError> {
        self.validate_constraint(id, &constraint)?;
        let index = ConstraintIndex::Linear(self.constraints.len());
        self.constraints.insert(id.to_string(), constraint);
        self.reset_solution();
        Ok(index)
    }

    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, id: &str, constraint: &Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(id) {
            return Err(ProblemError::ConstraintAlreadyExists(id.to_string()));
        }
        let satisfiable = match *constraint {
            Constraint::Equality { equals, .. } => equals.is_finite(),
            Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } => {
                lower_bound <= upper_bound
                    && lower_bound != f64::INFINITY
                    && upper_bound != f64::NEG_INFINITY
            }
        };
        if !satisfiable {
            return Err(ProblemError::InvalidConstraintBounds);
        }
        if constraint
            .terms()
            .iter()
            .any(|t| t.variable.0 >= self.variables.len())
        {
            return Err(ProblemError::NonExistentVariablesInConstraint);
        }
        Ok(())
    }
    // endregion Adding Constraints

    // region Accessors
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn objective_sense(&self) -> ObjectiveSense {
        self.objective.sense()
    }

    /// Variables of the problem, in index order
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn variable(&self, index: VariableIndex) -> Option<&Variable> {
        self.variables.get_index(index.0).map(|(_, var)| var)
    }

    pub fn variable_by_id(&self, id: &str) -> Option<&Variable> {
        self.variables.get(id)
    }

    /// Constraints of the problem and their ids, in index order
    pub fn constraints(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.constraints.iter().map(|(id, cons)| (id.as_str(), cons))
    }

    /// Get a linear constraint and its id by position
    pub fn constraint(&self, index: usize) -> Option<(&str, &Constraint)> {
        self.constraints
            .get_index(index)
            .map(|(id, cons)| (id.as_str(), cons))
    }

    pub fn constraint_index_by_id(&self, id: &str) -> Option<ConstraintIndex> {
        self.constraints.get_index_of(id).map(ConstraintIndex::Linear)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
    // endregion Accessors

    // region Solving
    /// Solve the problem with `solver`, storing the solution
    ///
    /// A solver that stops without an optimal solution is not an error, the reason is
    /// available from [`Problem::termination_status`].
    pub fn optimize(&mut self, solver: &mut dyn Solver) -> Result<(), SolverError> {
        debug!(
            solver = solver.name(),
            variables = self.num_variables(),
            constraints = self.num_constraints(),
            "Solving optimization problem"
        );
        self.solution = None;
        let solution = solver.solve(self)?;
        info!(
            solver = solver.name(),
            status = %solution.termination_status,
            solve_time = solution.solve_time,
            "Finished solving optimization problem"
        );
        self.solution = Some(solution);
        Ok(())
    }

    /// Discard the stored solution
    pub fn reset_solution(&mut self) {
        self.solution = None;
    }
    // endregion Solving

    // region Results
    fn solution(&self) -> Result<&ProblemSolution, SolverError> {
        self.solution.as_ref().ok_or(SolverError::OptimizeNotCalled)
    }

    /// Get the solution, checking that `result` is one of its results
    fn solution_for(&self, result: usize) -> Result<&ProblemSolution, SolverError> {
        let solution = self.solution()?;
        if result == 0 || result > solution.result_count {
            return Err(SolverError::ResultIndexOutOfBounds {
                result,
                count: solution.result_count,
            });
        }
        Ok(solution)
    }

    fn primal_solution(&self, result: usize) -> Result<&ProblemSolution, SolverError> {
        let solution = self.solution_for(result)?;
        if !solution.primal_status.has_values() {
            return Err(SolverError::NoPrimalSolution);
        }
        Ok(solution)
    }

    fn dual_solution(&self, result: usize) -> Result<&ProblemSolution, SolverError> {
        let solution = self.solution_for(result)?;
        if !solution.dual_status.has_values() {
            return Err(SolverError::NoDualSolution);
        }
        Ok(solution)
    }

    /// Why the solver stopped, `OptimizeNotCalled` if the problem hasn't been solved
    pub fn termination_status(&self) -> TerminationStatus {
        self.solution
            .as_ref()
            .map_or(TerminationStatus::OptimizeNotCalled, |s| s.termination_status)
    }

    pub fn raw_status(&self) -> Result<String, SolverError> {
        Ok(self.solution()?.raw_status.clone())
    }

    /// Status of the primal values of `result`, `NoSolution` when there is no such result
    pub fn primal_status(&self, result: usize) -> ResultStatus {
        self.solution_for(result)
            .map_or(ResultStatus::NoSolution, |s| s.primal_status)
    }

    /// Status of the dual values of `result`, `NoSolution` when there is no such result
    pub fn dual_status(&self, result: usize) -> ResultStatus {
        self.solution_for(result)
            .map_or(ResultStatus::NoSolution, |s| s.dual_status)
    }

    pub fn result_count(&self) -> usize {
        self.solution.as_ref().map_or(0, |s| s.result_count)
    }

    pub fn has_values(&self, result: usize) -> bool {
        self.primal_status(result).has_values()
    }

    pub fn has_duals(&self, result: usize) -> bool {
        self.dual_status(result).has_values()
    }

    /// Time spent in the solver, in seconds
    pub fn solve_time(&self) -> Result<f64, SolverError> {
        Ok(self.solution()?.solve_time)
    }

    pub fn simplex_iterations(&self) -> Result<u64, SolverError> {
        self.solution()?
            .simplex_iterations
            .ok_or(SolverError::UnsupportedAttribute("SimplexIterations"))
    }

    pub fn barrier_iterations(&self) -> Result<u64, SolverError> {
        self.solution()?
            .barrier_iterations
            .ok_or(SolverError::UnsupportedAttribute("BarrierIterations"))
    }

    pub fn node_count(&self) -> Result<u64, SolverError> {
        self.solution()?
            .node_count
            .ok_or(SolverError::UnsupportedAttribute("NodeCount"))
    }

    pub fn relative_gap(&self) -> Result<f64, SolverError> {
        self.solution()?
            .relative_gap
            .ok_or(SolverError::UnsupportedAttribute("RelativeGap"))
    }

    pub fn objective_value(&self, result: usize) -> Result<f64, SolverError> {
        self.primal_solution(result)?
            .objective_value
            .ok_or(SolverError::UnsupportedAttribute("ObjectiveValue"))
    }

    pub fn dual_objective_value(&self, result: usize) -> Result<f64, SolverError> {
        self.dual_solution(result)?
            .dual_objective_value
            .ok_or(SolverError::UnsupportedAttribute("DualObjectiveValue"))
    }

    /// Best known bound on the optimal objective value
    pub fn objective_bound(&self) -> Result<f64, SolverError> {
        self.solution()?
            .objective_bound
            .ok_or(SolverError::UnsupportedAttribute("ObjectiveBound"))
    }

    /// Value of a variable in `result`
    pub fn variable_value(&self, index: VariableIndex, result: usize) -> Result<f64, SolverError> {
        let values = self
            .primal_solution(result)?
            .variable_values
            .as_ref()
            .ok_or(SolverError::UnsupportedAttribute("VariablePrimal"))?;
        values
            .get(index.0)
            .copied()
            .ok_or(SolverError::InvalidVariableIndex(index))
    }

    /// Value of the function of a constraint in `result`
    ///
    /// For linear constraints this is the sum of the terms (constants were moved to the
    /// set when the constraint was created), for bounds it is the value of the variable.
    pub fn constraint_value(
        &self,
        index: ConstraintIndex,
        result: usize,
    ) -> Result<f64, SolverError> {
        self.constraint_set_kind(index)?;
        let values = self
            .primal_solution(result)?
            .variable_values
            .as_ref()
            .ok_or(SolverError::UnsupportedAttribute("ConstraintPrimal"))?;
        match index {
            ConstraintIndex::Linear(i) => {
                let (_, cons) = self
                    .constraint(i)
                    .ok_or(SolverError::InvalidConstraintIndex(index))?;
                Ok(cons.evaluate(values))
            }
            ConstraintIndex::LowerBound(var)
            | ConstraintIndex::UpperBound(var)
            | ConstraintIndex::Fix(var) => values
                .get(var.0)
                .copied()
                .ok_or(SolverError::InvalidVariableIndex(var)),
        }
    }

    /// Dual of a constraint in `result`
    ///
    /// Duals follow the conic convention of the minimization form of the problem,
    /// duals of `>=` constraints are non-negative and duals of `<=` constraints are
    /// non-positive regardless of the objective sense.
    pub fn dual(&self, index: ConstraintIndex, result: usize) -> Result<f64, SolverError> {
        self.constraint_set_kind(index)?;
        let solution = self.dual_solution(result)?;
        match index {
            ConstraintIndex::Linear(i) => solution
                .constraint_duals
                .as_ref()
                .ok_or(SolverError::UnsupportedAttribute("ConstraintDual"))?
                .get(i)
                .copied()
                .ok_or(SolverError::InvalidConstraintIndex(index)),
            ConstraintIndex::LowerBound(var)
            | ConstraintIndex::UpperBound(var)
            | ConstraintIndex::Fix(var) => {
                let duals = solution
                    .bound_duals
                    .as_ref()
                    .ok_or(SolverError::UnsupportedAttribute("ConstraintDual"))?
                    .get(var.0)
                    .ok_or(SolverError::InvalidConstraintIndex(index))?;
                Ok(match index {
                    ConstraintIndex::LowerBound(_) => duals.lower,
                    ConstraintIndex::UpperBound(_) => duals.upper,
                    _ => duals.fix,
                })
            }
        }
    }

    /// Change of the objective value from an infinitesimal relaxation of a constraint
    ///
    /// Non-positive when minimizing and non-negative when maximizing. An equality is relaxed
    /// on the side its dual is active on. Not defined for interval constraints.
    pub fn shadow_price(&self, index: ConstraintIndex, result: usize) -> Result<f64, SolverError> {
        let kind = self.constraint_set_kind(index)?;
        if kind == SetKind::Interval {
            return Err(SolverError::UnsupportedAttribute(
                "ShadowPrice of interval constraints",
            ));
        }
        let dual = self.dual(index, result)?;
        let sign = self.objective.sense().minimization_sign();
        Ok(match kind {
            SetKind::GreaterThan => -sign * dual,
            SetKind::EqualTo if dual > 0. => -sign * dual,
            _ => sign * dual,
        })
    }

    /// Check that a constraint exists, and get the kind of set it restricts to
    fn constraint_set_kind(&self, index: ConstraintIndex) -> Result<SetKind, SolverError> {
        let invalid = SolverError::InvalidConstraintIndex(index);
        match index {
            ConstraintIndex::Linear(i) => self
                .constraint(i)
                .map(|(_, cons)| cons.set_kind())
                .ok_or(invalid),
            ConstraintIndex::LowerBound(var) => match self.variable(var) {
                Some(v) if v.has_lower_bound() => Ok(SetKind::GreaterThan),
                _ => Err(invalid),
            },
            ConstraintIndex::UpperBound(var) => match self.variable(var) {
                Some(v) if v.has_upper_bound() => Ok(SetKind::LessThan),
                _ => Err(invalid),
            },
            ConstraintIndex::Fix(var) => match self.variable(var) {
                Some(v) if v.is_fixed() => Ok(SetKind::EqualTo),
                _ => Err(invalid),
            },
        }
    }
    // endregion Results
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add a variable with the same id as an existing variable: {0}")]
    VariableIdAlreadyExists(String),
    /// Error when trying to add variable with invalid bounds
    #[error("Tried to add a variable with lower_bound>upper_bound")]
    InvalidVariableBounds,
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add a constraint with the same id as an existing constraint: {0}")]
    ConstraintAlreadyExists(String),
    /// Error when trying to add a constraint with invalid bounds
    #[error("Tried to add an inequality constraint with lower_bound > upper_bound")]
    InvalidConstraintBounds,
    /// Error when trying to add a constraint that contains variables not in the model
    #[error("Tried to add a constraint with variables not in the model")]
    NonExistentVariablesInConstraint,
    /// Error when trying to set an objective which includes variables not in the model
    #[error("Tried setting an objective with variables not in the model")]
    NonExistentVariablesInObjective,
    /// Error when trying to perform an update on a variable that doesn't exist
    #[error("Tried to access a variable that doesn't exist")]
    NonExistentVariable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::BoundDuals;

    /// Solver returning a fixed solution, for testing result queries
    #[derive(Debug)]
    struct FixtureSolver {
        solution: ProblemSolution,
    }

    impl Solver for FixtureSolver {
        fn name(&self) -> &'static str {
            "fixture"
        }

        fn solve(&mut self, _problem: &Problem) -> Result<ProblemSolution, SolverError> {
            Ok(self.solution.clone())
        }
    }

    /// x in [0, 10], y fixed to 2, x + y >= 3, x - y in [-1, 1]
    fn small_problem(sense: ObjectiveSense) -> Problem {
        let mut problem = Problem::new(sense);
        let x = problem.add_new_variable("x", 0., 10.).unwrap();
        let y = problem.add_variable("y").unwrap();
        problem.fix_variable(y, 2.).unwrap();
        let mut sum = LinearExpr::new();
        sum.add_term(x, 1.);
        sum.add_term(y, 1.);
        problem
            .add_constraint("sum", Constraint::new_inequality(&sum, 3., f64::INFINITY))
            .unwrap();
        let mut diff = LinearExpr::new();
        diff.add_term(x, 1.);
        diff.add_term(y, -1.);
        problem
            .add_constraint("diff", Constraint::new_inequality(&diff, -1., 1.))
            .unwrap();
        problem
    }

    fn fixture_solution() -> ProblemSolution {
        let mut solution = ProblemSolution::new(TerminationStatus::Optimal, "fixture optimal");
        solution.primal_status = ResultStatus::FeasiblePoint;
        solution.dual_status = ResultStatus::FeasiblePoint;
        solution.result_count = 1;
        solution.solve_time = 0.25;
        solution.objective_value = Some(1.0);
        solution.variable_values = Some(vec![1.0, 2.0]);
        solution.constraint_duals = Some(vec![1.5, 0.0]);
        solution.bound_duals = Some(vec![
            BoundDuals::default(),
            BoundDuals {
                fix: -0.5,
                ..Default::default()
            },
        ]);
        solution
    }

    #[test]
    fn new_problem() {
        let max_problem = Problem::new(ObjectiveSense::Maximize);
        assert_eq!(max_problem.objective_sense(), ObjectiveSense::Maximize);

        let min_problem = Problem::new_minimization();
        assert_eq!(min_problem.objective_sense(), ObjectiveSense::Minimize);
        assert_eq!(min_problem.termination_status(), TerminationStatus::OptimizeNotCalled);
    }

    #[test]
    fn add_variables() {
        let mut problem = Problem::new_minimization();
        let x = problem.add_new_variable("x", 64., 100.).unwrap();
        let y = problem.add_variable("y").unwrap();
        assert_eq!(x, VariableIndex(0));
        assert_eq!(y, VariableIndex(1));
        let var = problem.variable_by_id("x").unwrap();
        assert!((var.lower_bound - 64.).abs() < 1e-25);
        assert!((var.upper_bound - 100.).abs() < 1e-25);
        assert!(!problem.variable(y).unwrap().has_lower_bound());

        assert_eq!(
            problem.add_variable("x"),
            Err(ProblemError::VariableIdAlreadyExists("x".to_string()))
        );
        assert_eq!(
            problem.add_new_variable("z", 100., 64.),
            Err(ProblemError::InvalidVariableBounds)
        );
        assert_eq!(
            problem.set_variable_bounds(VariableIndex(5), 0., 1.),
            Err(ProblemError::NonExistentVariable)
        );
        assert_eq!(
            problem.set_variable_bounds(y, f64::NAN, 1.),
            Err(ProblemError::InvalidVariableBounds)
        );
        assert_eq!(
            problem.fix_variable(y, f64::INFINITY),
            Err(ProblemError::InvalidVariableBounds)
        );
        assert!(problem.variable(y).unwrap().fixed.is_none());
    }

    #[test]
    fn add_constraints() {
        let mut problem = small_problem(ObjectiveSense::Minimize);
        assert_eq!(problem.num_constraints(), 2);
        assert_eq!(
            problem.constraint_index_by_id("diff"),
            Some(ConstraintIndex::Linear(1))
        );

        let mut expr = LinearExpr::new();
        expr.add_term(VariableIndex(0), 1.);
        assert_eq!(
            problem.add_constraint("sum", Constraint::new_equality(&expr, 1.)),
            Err(ProblemError::ConstraintAlreadyExists("sum".to_string()))
        );
        assert_eq!(
            problem.add_constraint("bad", Constraint::new_inequality(&expr, 2., 1.)),
            Err(ProblemError::InvalidConstraintBounds)
        );
        assert_eq!(
            problem.add_constraint(
                "unreachable",
                Constraint::new_inequality(&expr, f64::INFINITY, f64::INFINITY)
            ),
            Err(ProblemError::InvalidConstraintBounds)
        );
        assert_eq!(
            problem.add_constraint("nan", Constraint::new_equality(&expr, f64::NAN)),
            Err(ProblemError::InvalidConstraintBounds)
        );
        expr.add_term(VariableIndex(7), 1.);
        assert_eq!(
            problem.add_constraint("missing", Constraint::new_equality(&expr, 1.)),
            Err(ProblemError::NonExistentVariablesInConstraint)
        );
        assert_eq!(
            problem.set_objective(ObjectiveSense::Minimize, expr),
            Err(ProblemError::NonExistentVariablesInObjective)
        );
    }

    #[test]
    fn results_before_optimize() {
        let problem = small_problem(ObjectiveSense::Minimize);
        assert_eq!(problem.result_count(), 0);
        assert_eq!(problem.primal_status(1), ResultStatus::NoSolution);
        assert!(matches!(problem.solve_time(), Err(SolverError::OptimizeNotCalled)));
        assert!(matches!(
            problem.variable_value(VariableIndex(0), 1),
            Err(SolverError::OptimizeNotCalled)
        ));
        assert!(matches!(
            problem.dual(ConstraintIndex::Linear(0), 1),
            Err(SolverError::OptimizeNotCalled)
        ));
    }

    #[test]
    fn results_after_optimize() {
        let mut problem = small_problem(ObjectiveSense::Minimize);
        let mut solver = FixtureSolver {
            solution: fixture_solution(),
        };
        problem.optimize(&mut solver).unwrap();

        assert_eq!(problem.termination_status(), TerminationStatus::Optimal);
        assert_eq!(problem.raw_status().unwrap(), "fixture optimal");
        assert!(problem.has_values(1));
        assert!(!problem.has_values(2));
        assert!((problem.solve_time().unwrap() - 0.25).abs() < 1e-12);
        assert!((problem.objective_value(1).unwrap() - 1.0).abs() < 1e-12);
        assert!((problem.variable_value(VariableIndex(1), 1).unwrap() - 2.0).abs() < 1e-12);
        assert!(
            (problem.constraint_value(ConstraintIndex::Linear(0), 1).unwrap() - 3.0).abs()
                < 1e-12
        );
        assert!(
            (problem.constraint_value(ConstraintIndex::Linear(1), 1).unwrap() + 1.0).abs()
                < 1e-12
        );
        assert!((problem.dual(ConstraintIndex::Linear(0), 1).unwrap() - 1.5).abs() < 1e-12);
        assert!(
            (problem.dual(ConstraintIndex::Fix(VariableIndex(1)), 1).unwrap() + 0.5).abs()
                < 1e-12
        );
        assert!(
            (problem.shadow_price(ConstraintIndex::Linear(0), 1).unwrap() + 1.5).abs() < 1e-12
        );
        // A negative dual on an equality is relaxed like an upper bound
        assert!(
            (problem.shadow_price(ConstraintIndex::Fix(VariableIndex(1)), 1).unwrap() + 0.5).abs()
                < 1e-12
        );
    }

    #[test]
    fn result_errors() {
        let mut problem = small_problem(ObjectiveSense::Maximize);
        let mut solver = FixtureSolver {
            solution: fixture_solution(),
        };
        problem.optimize(&mut solver).unwrap();

        assert!(matches!(
            problem.objective_value(2),
            Err(SolverError::ResultIndexOutOfBounds { result: 2, count: 1 })
        ));
        assert!(matches!(
            problem.variable_value(VariableIndex(0), 0),
            Err(SolverError::ResultIndexOutOfBounds { result: 0, count: 1 })
        ));
        assert!(matches!(
            problem.objective_bound(),
            Err(SolverError::UnsupportedAttribute("ObjectiveBound"))
        ));
        assert!(matches!(
            problem.simplex_iterations(),
            Err(SolverError::UnsupportedAttribute("SimplexIterations"))
        ));
        // y is fixed so its bounds aren't constraints
        assert!(matches!(
            problem.dual(ConstraintIndex::LowerBound(VariableIndex(1)), 1),
            Err(SolverError::InvalidConstraintIndex(_))
        ));
        assert!(matches!(
            problem.shadow_price(ConstraintIndex::Linear(1), 1),
            Err(SolverError::UnsupportedAttribute(_))
        ));
        // Maximization flips the sign of the shadow price
        assert!(
            (problem.shadow_price(ConstraintIndex::Linear(0), 1).unwrap() - 1.5).abs() < 1e-12
        );
        assert!(
            (problem.shadow_price(ConstraintIndex::Fix(VariableIndex(1)), 1).unwrap() - 0.5).abs()
                < 1e-12
        );
    }

    #[test]
    fn modification_discards_solution() {
        let mut problem = small_problem(ObjectiveSense::Minimize);
        let mut solver = FixtureSolver {
            solution: fixture_solution(),
        };
        problem.optimize(&mut solver).unwrap();
        problem
            .set_variable_bounds(VariableIndex(0), 0., 5.)
            .unwrap();
        assert_eq!(problem.termination_status(), TerminationStatus::OptimizeNotCalled);
        assert!(matches!(
            problem.objective_value(1),
            Err(SolverError::OptimizeNotCalled)
        ));
    }

    #[test]
    fn infeasible_has_no_values() {
        let mut problem = small_problem(ObjectiveSense::Minimize);
        let mut solution = ProblemSolution::new(TerminationStatus::Infeasible, "infeasible");
        solution.result_count = 1;
        solution.dual_status = ResultStatus::InfeasibilityCertificate;
        solution.constraint_duals = Some(vec![1.0, 0.0]);
        solution.bound_duals = Some(vec![BoundDuals::default(); 2]);
        let mut solver = FixtureSolver { solution };
        problem.optimize(&mut solver).unwrap();

        assert!(matches!(
            problem.variable_value(VariableIndex(0), 1),
            Err(SolverError::NoPrimalSolution)
        ));
        assert!(problem.has_duals(1));
        assert!((problem.dual(ConstraintIndex::Linear(0), 1).unwrap() - 1.0).abs() < 1e-12);
    }
}
