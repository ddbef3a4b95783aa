//! Querying the results of an optimized [`InfiniteModel`]
//!
//! Every query is forwarded to the optimizer model through the mapping functions of the
//! model's [`TransformationBackend`], and values are mapped back to the references of the
//! infinite model. Solver errors, such as unsupported attributes, are returned unchanged.
use thiserror::Error;

use crate::infinite_model::constraint::ConstraintRef;
use crate::infinite_model::expression::{AffineExpr, ModelRef};
use crate::infinite_model::measure::MeasureRef;
use crate::infinite_model::parameter::ParameterRef;
use crate::infinite_model::variable::VariableRef;
use crate::infinite_model::InfiniteModel;
use crate::optimize::constraint::ConstraintIndex;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::SolverError;
use crate::optimize::variable::VariableIndex;
use crate::optimize::{ResultStatus, TerminationStatus};
use crate::transformation::{Mapped, TransformationBackend, TransformationError};

/// Items which have primal values
pub trait ValueQuery {
    fn query_value(&self, model: &InfiniteModel, result: usize) -> Result<Mapped<f64>, ResultError>;
}

/// Items which correspond to variables or constraints of the optimizer model
pub trait IndexQuery {
    type Index;

    fn query_optimizer_index(
        &self,
        model: &InfiniteModel,
    ) -> Result<Mapped<Self::Index>, ResultError>;
}

/// Items which can be asked for duals
pub trait DualQuery {
    fn query_dual(&self, model: &InfiniteModel, result: usize) -> Result<Mapped<f64>, ResultError>;

    fn query_shadow_price(
        &self,
        model: &InfiniteModel,
        result: usize,
    ) -> Result<Mapped<f64>, ResultError>;
}

impl InfiniteModel {
    /// Optimizer model, if an optimizer is attached
    fn attached_problem(&self) -> Result<&Problem, ResultError> {
        if !self.has_optimizer() {
            return Err(ResultError::NoOptimizer);
        }
        Ok(self.optimizer_model())
    }

    /// Backend whose mappings are in sync with the model
    fn built_backend(&self) -> Result<&dyn TransformationBackend, ResultError> {
        if !self.has_optimizer() {
            return Err(ResultError::NoOptimizer);
        }
        if !self.is_built() {
            return Err(SolverError::OptimizeNotCalled.into());
        }
        Ok(self.backend())
    }

    // region Statuses
    /// Why the solver stopped, `OptimizeNotCalled` before optimizing or after a modification
    pub fn termination_status(&self) -> Result<TerminationStatus, ResultError> {
        Ok(self.attached_problem()?.termination_status())
    }

    /// Status as reported by the solver
    pub fn raw_status(&self) -> Result<String, ResultError> {
        Ok(self.attached_problem()?.raw_status()?)
    }

    /// Status of the primal solution `result` (1-based)
    pub fn primal_status(&self, result: usize) -> Result<ResultStatus, ResultError> {
        Ok(self.attached_problem()?.primal_status(result))
    }

    /// Status of the dual solution `result` (1-based)
    pub fn dual_status(&self, result: usize) -> Result<ResultStatus, ResultError> {
        Ok(self.attached_problem()?.dual_status(result))
    }

    pub fn result_count(&self) -> Result<usize, ResultError> {
        Ok(self.attached_problem()?.result_count())
    }

    pub fn has_values(&self, result: usize) -> Result<bool, ResultError> {
        Ok(self.attached_problem()?.has_values(result))
    }

    pub fn has_duals(&self, result: usize) -> Result<bool, ResultError> {
        Ok(self.attached_problem()?.has_duals(result))
    }
    // endregion Statuses

    // region Solver attributes
    /// Time taken by the solver, in seconds
    pub fn solve_time(&self) -> Result<f64, ResultError> {
        Ok(self.attached_problem()?.solve_time()?)
    }

    pub fn simplex_iterations(&self) -> Result<u64, ResultError> {
        Ok(self.attached_problem()?.simplex_iterations()?)
    }

    pub fn barrier_iterations(&self) -> Result<u64, ResultError> {
        Ok(self.attached_problem()?.barrier_iterations()?)
    }

    pub fn node_count(&self) -> Result<u64, ResultError> {
        Ok(self.attached_problem()?.node_count()?)
    }

    pub fn relative_gap(&self) -> Result<f64, ResultError> {
        Ok(self.attached_problem()?.relative_gap()?)
    }
    // endregion Solver attributes

    // region Objective
    pub fn objective_value(&self, result: usize) -> Result<f64, ResultError> {
        Ok(self.attached_problem()?.objective_value(result)?)
    }

    /// Best known bound on the optimal objective value
    pub fn objective_bound(&self) -> Result<f64, ResultError> {
        Ok(self.attached_problem()?.objective_bound()?)
    }

    pub fn dual_objective_value(&self, result: usize) -> Result<f64, ResultError> {
        Ok(self.attached_problem()?.dual_objective_value(result)?)
    }
    // endregion Objective

    // region Mapped results
    /// Primal value(s) of a variable, parameter, measure, expression or constraint
    ///
    /// Parameters give their supports, constraints the value of their function.
    pub fn value<Q: ValueQuery + ?Sized>(
        &self,
        item: &Q,
        result: usize,
    ) -> Result<Mapped<f64>, ResultError> {
        item.query_value(self, result)
    }

    /// Index (or indices) of a variable or constraint in the optimizer model
    pub fn optimizer_index<Q: IndexQuery + ?Sized>(
        &self,
        item: &Q,
    ) -> Result<Mapped<Q::Index>, ResultError> {
        item.query_optimizer_index(self)
    }

    /// Dual(s) of a constraint
    ///
    /// Duals follow the conic convention: non-negative for `>=` and non-positive for `<=`
    /// constraints of the minimization form. Variables have no duals, query their bound
    /// constraints instead.
    ///
    /// # Examples
    /// ```rust
    /// use infopt_core::infinite_model::InfiniteModel;
    /// use infopt_core::infinite_model::variable::VariableInfo;
    /// use infopt_core::results::ResultError;
    /// let mut model = InfiniteModel::new();
    /// let x = model.add_variable("x", VariableInfo::bounded(0., 1.)).unwrap();
    /// assert!(matches!(model.dual(&x, 1), Err(ResultError::DualOnVariable { .. })));
    /// let lower = model.lower_bound_ref(x).unwrap();
    /// assert!(matches!(model.dual(&lower, 1), Err(ResultError::NoOptimizer)));
    /// ```
    pub fn dual<Q: DualQuery + ?Sized>(
        &self,
        item: &Q,
        result: usize,
    ) -> Result<Mapped<f64>, ResultError> {
        item.query_dual(self, result)
    }

    /// Shadow price(s) of a constraint, the change of the objective from relaxing it
    ///
    /// Non-positive when minimizing and non-negative when maximizing.
    pub fn shadow_price<Q: DualQuery + ?Sized>(
        &self,
        item: &Q,
        result: usize,
    ) -> Result<Mapped<f64>, ResultError> {
        item.query_shadow_price(self, result)
    }
    // endregion Mapped results
}

impl ValueQuery for ModelRef {
    fn query_value(&self, model: &InfiniteModel, result: usize) -> Result<Mapped<f64>, ResultError> {
        model.built_backend()?.map_value(*self, result)
    }
}

impl ValueQuery for VariableRef {
    fn query_value(&self, model: &InfiniteModel, result: usize) -> Result<Mapped<f64>, ResultError> {
        ModelRef::Variable(*self).query_value(model, result)
    }
}

impl ValueQuery for ParameterRef {
    fn query_value(&self, model: &InfiniteModel, result: usize) -> Result<Mapped<f64>, ResultError> {
        ModelRef::Parameter(*self).query_value(model, result)
    }
}

impl ValueQuery for MeasureRef {
    fn query_value(&self, model: &InfiniteModel, result: usize) -> Result<Mapped<f64>, ResultError> {
        ModelRef::Measure(*self).query_value(model, result)
    }
}

impl ValueQuery for AffineExpr {
    fn query_value(&self, model: &InfiniteModel, result: usize) -> Result<Mapped<f64>, ResultError> {
        model.built_backend()?.map_expression_value(self, result)
    }
}

impl ValueQuery for ConstraintRef {
    fn query_value(&self, model: &InfiniteModel, result: usize) -> Result<Mapped<f64>, ResultError> {
        model.built_backend()?.map_constraint_value(*self, result)
    }
}

impl IndexQuery for VariableRef {
    type Index = VariableIndex;

    fn query_optimizer_index(
        &self,
        model: &InfiniteModel,
    ) -> Result<Mapped<VariableIndex>, ResultError> {
        Ok(model.built_backend()?.map_variable_index(*self)?)
    }
}

impl IndexQuery for ConstraintRef {
    type Index = ConstraintIndex;

    fn query_optimizer_index(
        &self,
        model: &InfiniteModel,
    ) -> Result<Mapped<ConstraintIndex>, ResultError> {
        Ok(model.built_backend()?.map_constraint_index(*self)?)
    }
}

impl DualQuery for ConstraintRef {
    fn query_dual(&self, model: &InfiniteModel, result: usize) -> Result<Mapped<f64>, ResultError> {
        model.built_backend()?.map_dual(*self, result)
    }

    fn query_shadow_price(
        &self,
        model: &InfiniteModel,
        result: usize,
    ) -> Result<Mapped<f64>, ResultError> {
        model.built_backend()?.map_shadow_price(*self, result)
    }
}

// Always an error, whatever the state of the model
impl DualQuery for VariableRef {
    fn query_dual(&self, model: &InfiniteModel, _result: usize) -> Result<Mapped<f64>, ResultError> {
        Err(dual_on_variable(model, *self))
    }

    fn query_shadow_price(
        &self,
        model: &InfiniteModel,
        _result: usize,
    ) -> Result<Mapped<f64>, ResultError> {
        Err(dual_on_variable(model, *self))
    }
}

fn dual_on_variable(model: &InfiniteModel, variable: VariableRef) -> ResultError {
    ResultError::DualOnVariable {
        variable: model
            .variable_name(variable)
            .map(str::to_string)
            .unwrap_or_else(|| ModelRef::Variable(variable).to_string()),
    }
}

/// Errors from querying results
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResultError {
    #[error("No optimizer is attached to the model, use set_optimizer")]
    NoOptimizer,
    #[error(
        "Variable {variable} has no dual, get the constraint of its bound with \
         lower_bound_ref, upper_bound_ref or fix_ref and query its dual instead"
    )]
    DualOnVariable { variable: String },
    #[error(transparent)]
    Transformation(#[from] TransformationError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}
