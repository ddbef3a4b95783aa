//! The infinite-dimensional model: parameters, variables, measures, constraints and objective
//!
//! An [`InfiniteModel`] is never solved directly. It is transformed by a
//! [`TransformationBackend`] into a finite [`Problem`] (the optimizer model), which is solved
//! by the attached [`Solver`]. Results are then mapped back, see [`crate::results`].
use std::collections::BTreeSet;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::configuration;
use crate::infinite_model::constraint::{ConstraintRef, ConstraintSet, InfiniteConstraint};
use crate::infinite_model::expression::{AffineExpr, ModelRef};
use crate::infinite_model::measure::{Measure, MeasureKind, MeasureRef};
use crate::infinite_model::parameter::{InfiniteParameter, ParameterRef};
use crate::infinite_model::variable::{ModelVariable, VariableInfo, VariableKind, VariableRef};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::transformation::transcription::TranscriptionBackend;
use crate::transformation::{TransformationBackend, TransformationError};

pub mod constraint;
pub mod expression;
pub mod measure;
pub mod parameter;
pub mod variable;

/// Definitions of an infinite model, what a backend transforms
#[derive(Debug, Clone)]
pub struct ModelData {
    parameters: IndexMap<String, InfiniteParameter>,
    variables: IndexMap<String, ModelVariable>,
    measures: IndexMap<String, Measure>,
    constraints: IndexMap<String, InfiniteConstraint>,
    objective_sense: ObjectiveSense,
    objective: AffineExpr,
}

impl Default for ModelData {
    fn default() -> Self {
        ModelData {
            parameters: IndexMap::new(),
            variables: IndexMap::new(),
            measures: IndexMap::new(),
            constraints: IndexMap::new(),
            objective_sense: ObjectiveSense::Minimize,
            objective: AffineExpr::new(),
        }
    }
}

impl ModelData {
    // region Accessors
    pub fn parameter(&self, parameter: ParameterRef) -> Option<&InfiniteParameter> {
        self.parameters.get_index(parameter.0).map(|(_, p)| p)
    }

    pub fn parameters(&self) -> impl Iterator<Item = (ParameterRef, &InfiniteParameter)> {
        self.parameters
            .values()
            .enumerate()
            .map(|(i, p)| (ParameterRef(i), p))
    }

    pub fn variable(&self, variable: VariableRef) -> Option<&ModelVariable> {
        self.variables.get_index(variable.0).map(|(_, v)| v)
    }

    pub fn variables(&self) -> impl Iterator<Item = (VariableRef, &ModelVariable)> {
        self.variables
            .values()
            .enumerate()
            .map(|(i, v)| (VariableRef(i), v))
    }

    pub fn measure(&self, measure: MeasureRef) -> Option<&Measure> {
        self.measures.get_index(measure.0).map(|(_, m)| m)
    }

    pub fn measures(&self) -> impl Iterator<Item = (MeasureRef, &Measure)> {
        self.measures
            .values()
            .enumerate()
            .map(|(i, m)| (MeasureRef(i), m))
    }

    /// Get a constraint added with `add_constraint`, None for bound constraints
    pub fn constraint(&self, constraint: ConstraintRef) -> Option<&InfiniteConstraint> {
        match constraint {
            ConstraintRef::Expression(i) => self.constraints.get_index(i).map(|(_, c)| c),
            _ => None,
        }
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintRef, &InfiniteConstraint)> {
        self.constraints
            .values()
            .enumerate()
            .map(|(i, c)| (ConstraintRef::Expression(i), c))
    }

    pub fn objective_sense(&self) -> ObjectiveSense {
        self.objective_sense
    }

    pub fn objective(&self) -> &AffineExpr {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
    // endregion Accessors

    /// Name of any referenced object, errors if the reference isn't part of this model
    pub fn name(&self, item: ModelRef) -> Result<&str, ModelError> {
        let name = match item {
            ModelRef::Parameter(p) => self.parameter(p).map(|p| p.name.as_str()),
            ModelRef::Variable(v) => self.variable(v).map(|v| v.name.as_str()),
            ModelRef::Measure(m) => self.measure(m).map(|m| m.name.as_str()),
        };
        name.ok_or_else(|| ModelError::InvalidReference(item.to_string()))
    }

    /// Parameters an expression depends on, sorted
    ///
    /// Parameter terms contribute their parameter, infinite variables their parameters, and
    /// measures the parameters of their integrand except the measured one.
    pub fn expression_parameters(
        &self,
        expression: &AffineExpr,
    ) -> Result<Vec<ParameterRef>, ModelError> {
        let mut parameters = BTreeSet::new();
        for item in expression.items() {
            match item {
                ModelRef::Parameter(p) => {
                    self.parameter(p)
                        .ok_or_else(|| ModelError::InvalidReference(item.to_string()))?;
                    parameters.insert(p);
                }
                ModelRef::Variable(v) => {
                    let var = self
                        .variable(v)
                        .ok_or_else(|| ModelError::InvalidReference(item.to_string()))?;
                    parameters.extend(var.parameters().iter().copied());
                }
                ModelRef::Measure(m) => {
                    parameters.extend(self.measure_parameters(m)?);
                }
            }
        }
        Ok(parameters.into_iter().collect())
    }

    /// Parameters a measure still depends on after the reduction
    pub fn measure_parameters(&self, measure: MeasureRef) -> Result<Vec<ParameterRef>, ModelError> {
        let measure = self
            .measure(measure)
            .ok_or_else(|| ModelError::InvalidReference(ModelRef::Measure(measure).to_string()))?;
        let mut parameters = self.expression_parameters(&measure.integrand)?;
        parameters.retain(|p| *p != measure.parameter);
        Ok(parameters)
    }

    /// Check every item of the expression is part of this model
    fn check_expression(&self, expression: &AffineExpr) -> Result<(), ModelError> {
        for item in expression.items() {
            self.name(item)?;
        }
        Ok(())
    }

    fn variable_mut(&mut self, variable: VariableRef) -> Result<&mut ModelVariable, ModelError> {
        self.variables
            .get_index_mut(variable.0)
            .map(|(_, v)| v)
            .ok_or_else(|| ModelError::InvalidReference(ModelRef::Variable(variable).to_string()))
    }

    fn parameter_or_err(&self, parameter: ParameterRef) -> Result<&InfiniteParameter, ModelError> {
        self.parameter(parameter)
            .ok_or_else(|| ModelError::InvalidReference(ModelRef::Parameter(parameter).to_string()))
    }
}

/// An infinite-dimensional optimization model
///
/// # Examples
/// ```rust
/// use infopt_core::infinite_model::InfiniteModel;
/// use infopt_core::infinite_model::constraint::ConstraintSet;
/// use infopt_core::infinite_model::expression::AffineExpr;
/// use infopt_core::infinite_model::measure::MeasureKind;
/// use infopt_core::infinite_model::parameter::InfiniteParameterBuilder;
/// use infopt_core::infinite_model::variable::VariableInfo;
/// use infopt_core::optimize::objective::ObjectiveSense;
/// use infopt_core::optimize::solvers::clarabel::ClarabelSolver;
///
/// let mut model = InfiniteModel::new();
/// let t = model
///     .add_parameter(
///         InfiniteParameterBuilder::default()
///             .name("t")
///             .lower_bound(0.)
///             .upper_bound(1.)
///             .num_supports(5)
///             .build()
///             .unwrap(),
///     )
///     .unwrap();
/// let y = model
///     .add_infinite_variable("y", &[t], VariableInfo::bounded(0., 2.))
///     .unwrap();
/// let cost = model
///     .add_measure("cost", AffineExpr::from(y), t, MeasureKind::Integral)
///     .unwrap();
/// model
///     .add_constraint("floor", AffineExpr::from(y).with_term(t, -1.), ConstraintSet::GreaterThan(0.))
///     .unwrap();
/// model.set_objective(ObjectiveSense::Minimize, AffineExpr::from(cost)).unwrap();
/// model.set_optimizer(Box::new(ClarabelSolver::default()));
/// model.optimize().unwrap();
/// assert!((model.objective_value(1).unwrap() - 0.5).abs() < 1e-5);
/// ```
#[derive(Debug)]
pub struct InfiniteModel {
    data: ModelData,
    backend: Box<dyn TransformationBackend>,
    optimizer: Option<Box<dyn Solver>>,
    /// Is the optimizer model in sync with `data`
    built: bool,
}

impl Default for InfiniteModel {
    fn default() -> Self {
        Self::new()
    }
}

impl InfiniteModel {
    // region Creation Functions
    /// Create an empty model, transformed by transcription
    pub fn new() -> Self {
        Self::with_backend(Box::new(TranscriptionBackend::new()))
    }

    /// Create an empty model transformed by `backend`
    pub fn with_backend(backend: Box<dyn TransformationBackend>) -> Self {
        InfiniteModel {
            data: ModelData::default(),
            backend,
            optimizer: None,
            built: false,
        }
    }
    // endregion Creation Functions

    // region Accessors
    /// Definitions of the model
    pub fn data(&self) -> &ModelData {
        &self.data
    }

    pub fn backend(&self) -> &dyn TransformationBackend {
        self.backend.as_ref()
    }

    /// The finite model produced by the backend, empty until the model is built
    pub fn optimizer_model(&self) -> &Problem {
        self.backend.optimizer_model()
    }

    /// Is the optimizer model up to date with the definitions of this model
    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn parameter_by_name(&self, name: &str) -> Option<ParameterRef> {
        self.data.parameters.get_index_of(name).map(ParameterRef)
    }

    pub fn variable_by_name(&self, name: &str) -> Option<VariableRef> {
        self.data.variables.get_index_of(name).map(VariableRef)
    }

    pub fn measure_by_name(&self, name: &str) -> Option<MeasureRef> {
        self.data.measures.get_index_of(name).map(MeasureRef)
    }

    pub fn constraint_by_name(&self, name: &str) -> Option<ConstraintRef> {
        self.data
            .constraints
            .get_index_of(name)
            .map(ConstraintRef::Expression)
    }

    /// Name of a variable, None if it isn't part of the model
    pub fn variable_name(&self, variable: VariableRef) -> Option<&str> {
        self.data.variable(variable).map(|v| v.name.as_str())
    }

    /// Name of a constraint, bound constraints are named after their variable
    pub fn constraint_name(&self, constraint: ConstraintRef) -> Option<String> {
        match constraint {
            ConstraintRef::Expression(_) => self.data.constraint(constraint).map(|c| c.name.clone()),
            ConstraintRef::LowerBound(v) => self
                .variable_name(v)
                .map(|name| format!("{name}_lower_bound")),
            ConstraintRef::UpperBound(v) => self
                .variable_name(v)
                .map(|name| format!("{name}_upper_bound")),
            ConstraintRef::Fix(v) => self.variable_name(v).map(|name| format!("{name}_fix")),
        }
    }

    /// Parameters an expression depends on, see [`ModelData::expression_parameters`]
    pub fn expression_parameters(
        &self,
        expression: &AffineExpr,
    ) -> Result<Vec<ParameterRef>, ModelError> {
        self.data.expression_parameters(expression)
    }
    // endregion Accessors

    // region Parameters
    /// Add an infinite parameter, generating its supports if none were given
    pub fn add_parameter(
        &mut self,
        mut parameter: InfiniteParameter,
    ) -> Result<ParameterRef, ModelError> {
        self.check_name("parameter", &parameter.name, |data, name| {
            data.parameters.contains_key(name)
        })?;
        if !parameter.lower_bound.is_finite()
            || !parameter.upper_bound.is_finite()
            || parameter.lower_bound > parameter.upper_bound
        {
            return Err(ModelError::InvalidDomain(parameter.name));
        }
        let tolerance = configuration::current().support_tolerance;
        if let Some(value) = parameter
            .supports
            .iter()
            .copied()
            .find(|s| !s.is_finite() || !parameter.in_domain(*s, tolerance))
        {
            return Err(ModelError::SupportOutOfDomain {
                parameter: parameter.name,
                value,
            });
        }
        parameter.supports = parameter.generated_supports(tolerance);
        debug!(
            parameter = parameter.name,
            supports = parameter.supports.len(),
            "Added infinite parameter"
        );
        let index = ParameterRef(self.data.parameters.len());
        self.data
            .parameters
            .insert(parameter.name.clone(), parameter);
        self.invalidate();
        Ok(index)
    }

    /// Add supports to a parameter, values already supports are ignored
    pub fn add_supports(
        &mut self,
        parameter: ParameterRef,
        supports: &[f64],
    ) -> Result<(), ModelError> {
        let tolerance = configuration::current().support_tolerance;
        let param = self.data.parameter_or_err(parameter)?;
        if let Some(value) = supports
            .iter()
            .copied()
            .find(|s| !s.is_finite() || !param.in_domain(*s, tolerance))
        {
            return Err(ModelError::SupportOutOfDomain {
                parameter: param.name.clone(),
                value,
            });
        }
        if let Some((_, param)) = self.data.parameters.get_index_mut(parameter.0) {
            for value in supports {
                param.add_support(*value, tolerance);
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Supports of a parameter, sorted
    pub fn supports(&self, parameter: ParameterRef) -> Result<&[f64], ModelError> {
        Ok(&self.data.parameter_or_err(parameter)?.supports)
    }
    // endregion Parameters

    // region Variables
    /// Add a finite variable
    pub fn add_variable(&mut self, name: &str, info: VariableInfo) -> Result<VariableRef, ModelError> {
        self.insert_variable(name, VariableKind::Finite, info)
    }

    /// Add a variable depending on one or more distinct infinite parameters
    pub fn add_infinite_variable(
        &mut self,
        name: &str,
        parameters: &[ParameterRef],
        info: VariableInfo,
    ) -> Result<VariableRef, ModelError> {
        if parameters.is_empty() {
            return Err(ModelError::NoParameters(name.to_string()));
        }
        for (i, p) in parameters.iter().enumerate() {
            self.data.parameter_or_err(*p)?;
            if parameters[..i].contains(p) {
                return Err(ModelError::RepeatedParameter(name.to_string()));
            }
        }
        self.insert_variable(
            name,
            VariableKind::Infinite {
                parameters: parameters.to_vec(),
            },
            info,
        )
    }

    /// Add a variable that is an infinite variable evaluated at one value per parameter
    ///
    /// Values which aren't supports of their parameter yet are added as supports.
    pub fn add_point_variable(
        &mut self,
        name: &str,
        infinite: VariableRef,
        values: &[f64],
        info: VariableInfo,
    ) -> Result<VariableRef, ModelError> {
        let infinite_var = self.data.variable(infinite).ok_or_else(|| {
            ModelError::InvalidReference(ModelRef::Variable(infinite).to_string())
        })?;
        let parameters = match &infinite_var.kind {
            VariableKind::Infinite { parameters } => parameters.clone(),
            _ => return Err(ModelError::NotInfinite(infinite_var.name.clone())),
        };
        if parameters.len() != values.len() {
            return Err(ModelError::PointValueCount {
                expected: parameters.len(),
                found: values.len(),
            });
        }
        let tolerance = configuration::current().support_tolerance;
        for (p, value) in parameters.iter().zip(values) {
            let param = self.data.parameter_or_err(*p)?;
            if !value.is_finite() || !param.in_domain(*value, tolerance) {
                return Err(ModelError::SupportOutOfDomain {
                    parameter: param.name.clone(),
                    value: *value,
                });
            }
        }
        let variable = self.insert_variable(
            name,
            VariableKind::Point {
                infinite,
                values: values.to_vec(),
            },
            info,
        )?;
        for (p, value) in parameters.iter().zip(values) {
            if let Some((_, param)) = self.data.parameters.get_index_mut(p.0) {
                param.add_support(*value, tolerance);
            }
        }
        Ok(variable)
    }

    fn insert_variable(
        &mut self,
        name: &str,
        kind: VariableKind,
        info: VariableInfo,
    ) -> Result<VariableRef, ModelError> {
        self.check_name("variable", name, |data, name| {
            data.variables.contains_key(name)
        })?;
        if !info.is_valid() {
            return Err(ModelError::InvalidBounds(name.to_string()));
        }
        let index = VariableRef(self.data.variables.len());
        self.data.variables.insert(
            name.to_string(),
            ModelVariable {
                name: name.to_string(),
                kind,
                info,
            },
        );
        self.invalidate();
        Ok(index)
    }

    /// Set the lower bound of a variable which isn't fixed
    pub fn set_lower_bound(&mut self, variable: VariableRef, value: f64) -> Result<(), ModelError> {
        let var = self.data.variable_mut(variable)?;
        if var.info.fix.is_some() {
            return Err(ModelError::VariableFixed(var.name.clone()));
        }
        let info = VariableInfo {
            lower_bound: Some(value),
            ..var.info
        };
        if !info.is_valid() {
            return Err(ModelError::InvalidBounds(var.name.clone()));
        }
        var.info = info;
        self.invalidate();
        Ok(())
    }

    /// Set the upper bound of a variable which isn't fixed
    pub fn set_upper_bound(&mut self, variable: VariableRef, value: f64) -> Result<(), ModelError> {
        let var = self.data.variable_mut(variable)?;
        if var.info.fix.is_some() {
            return Err(ModelError::VariableFixed(var.name.clone()));
        }
        let info = VariableInfo {
            upper_bound: Some(value),
            ..var.info
        };
        if !info.is_valid() {
            return Err(ModelError::InvalidBounds(var.name.clone()));
        }
        var.info = info;
        self.invalidate();
        Ok(())
    }

    pub fn delete_lower_bound(&mut self, variable: VariableRef) -> Result<(), ModelError> {
        let var = self.data.variable_mut(variable)?;
        if var.info.lower_bound.take().is_none() {
            return Err(ModelError::MissingBound {
                variable: var.name.clone(),
                bound: "lower bound",
            });
        }
        self.invalidate();
        Ok(())
    }

    pub fn delete_upper_bound(&mut self, variable: VariableRef) -> Result<(), ModelError> {
        let var = self.data.variable_mut(variable)?;
        if var.info.upper_bound.take().is_none() {
            return Err(ModelError::MissingBound {
                variable: var.name.clone(),
                bound: "upper bound",
            });
        }
        self.invalidate();
        Ok(())
    }

    /// Fix a variable to a value, removing its bounds
    pub fn fix(&mut self, variable: VariableRef, value: f64) -> Result<(), ModelError> {
        let var = self.data.variable_mut(variable)?;
        let info = VariableInfo {
            lower_bound: None,
            upper_bound: None,
            fix: Some(value),
        };
        if !info.is_valid() {
            return Err(ModelError::InvalidBounds(var.name.clone()));
        }
        var.info = info;
        self.invalidate();
        Ok(())
    }

    pub fn unfix(&mut self, variable: VariableRef) -> Result<(), ModelError> {
        let var = self.data.variable_mut(variable)?;
        if var.info.fix.take().is_none() {
            return Err(ModelError::MissingBound {
                variable: var.name.clone(),
                bound: "fixed value",
            });
        }
        self.invalidate();
        Ok(())
    }

    /// Constraint of the lower bound of a variable
    pub fn lower_bound_ref(&self, variable: VariableRef) -> Result<ConstraintRef, ModelError> {
        self.bound_ref(variable, "lower bound", |info| info.lower_bound.is_some())
            .map(|_| ConstraintRef::LowerBound(variable))
    }

    /// Constraint of the upper bound of a variable
    pub fn upper_bound_ref(&self, variable: VariableRef) -> Result<ConstraintRef, ModelError> {
        self.bound_ref(variable, "upper bound", |info| info.upper_bound.is_some())
            .map(|_| ConstraintRef::UpperBound(variable))
    }

    /// Constraint fixing a variable
    pub fn fix_ref(&self, variable: VariableRef) -> Result<ConstraintRef, ModelError> {
        self.bound_ref(variable, "fixed value", |info| info.fix.is_some())
            .map(|_| ConstraintRef::Fix(variable))
    }

    fn bound_ref(
        &self,
        variable: VariableRef,
        bound: &'static str,
        has_bound: impl Fn(&VariableInfo) -> bool,
    ) -> Result<(), ModelError> {
        let var = self.data.variable(variable).ok_or_else(|| {
            ModelError::InvalidReference(ModelRef::Variable(variable).to_string())
        })?;
        if has_bound(&var.info) {
            Ok(())
        } else {
            Err(ModelError::MissingBound {
                variable: var.name.clone(),
                bound,
            })
        }
    }
    // endregion Variables

    // region Measures, Constraints and Objective
    /// Add a measure of `integrand` over `parameter`
    pub fn add_measure(
        &mut self,
        name: &str,
        integrand: AffineExpr,
        parameter: ParameterRef,
        kind: MeasureKind,
    ) -> Result<MeasureRef, ModelError> {
        self.check_name("measure", name, |data, name| data.measures.contains_key(name))?;
        self.data.parameter_or_err(parameter)?;
        self.data.check_expression(&integrand)?;
        if integrand
            .items()
            .any(|item| matches!(item, ModelRef::Measure(_)))
        {
            return Err(ModelError::NestedMeasure(name.to_string()));
        }
        let index = MeasureRef(self.data.measures.len());
        self.data.measures.insert(
            name.to_string(),
            Measure {
                name: name.to_string(),
                integrand,
                parameter,
                kind,
            },
        );
        self.invalidate();
        Ok(index)
    }

    /// Add a constraint, holding at every support of the parameters `expression` depends on
    pub fn add_constraint(
        &mut self,
        name: &str,
        expression: AffineExpr,
        set: ConstraintSet,
    ) -> Result<ConstraintRef, ModelError> {
        self.check_name("constraint", name, |data, name| {
            data.constraints.contains_key(name)
        })?;
        if !set.is_valid() {
            return Err(ModelError::InvalidConstraintSet(name.to_string()));
        }
        self.data.check_expression(&expression)?;
        let index = ConstraintRef::Expression(self.data.constraints.len());
        self.data.constraints.insert(
            name.to_string(),
            InfiniteConstraint {
                name: name.to_string(),
                expression,
                set,
            },
        );
        self.invalidate();
        Ok(index)
    }

    /// Set the objective, which can't depend on any parameter once measures are applied
    pub fn set_objective(
        &mut self,
        sense: ObjectiveSense,
        expression: AffineExpr,
    ) -> Result<(), ModelError> {
        if !self.data.expression_parameters(&expression)?.is_empty() {
            return Err(ModelError::InfiniteObjective);
        }
        self.data.objective_sense = sense;
        self.data.objective = expression;
        self.invalidate();
        Ok(())
    }
    // endregion Measures, Constraints and Objective

    // region Optimizing
    /// Attach the solver used by [`InfiniteModel::optimize`]
    pub fn set_optimizer(&mut self, optimizer: Box<dyn Solver>) {
        self.optimizer = Some(optimizer);
        self.invalidate();
    }

    /// Attach the solver selected in the configuration
    pub fn set_default_optimizer(&mut self) -> Result<(), ModelError> {
        self.set_optimizer(crate::optimize::solvers::default_solver()?);
        Ok(())
    }

    pub fn has_optimizer(&self) -> bool {
        self.optimizer.is_some()
    }

    /// Name of the attached solver
    pub fn optimizer_name(&self) -> Option<&'static str> {
        self.optimizer.as_ref().map(|o| o.name())
    }

    /// Transform the model into its optimizer model
    pub fn build_optimizer_model(&mut self) -> Result<(), ModelError> {
        self.built = false;
        self.backend.build(&self.data)?;
        self.built = true;
        let problem = self.backend.optimizer_model();
        info!(
            backend = self.backend.name(),
            model_variables = self.data.num_variables(),
            model_constraints = self.data.num_constraints(),
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "Built optimizer model"
        );
        Ok(())
    }

    /// Build the optimizer model if needed, then solve it with the attached optimizer
    pub fn optimize(&mut self) -> Result<(), ModelError> {
        if self.optimizer.is_none() {
            return Err(ModelError::NoOptimizer);
        }
        if !self.built {
            self.build_optimizer_model()?;
        }
        let Some(optimizer) = self.optimizer.as_mut() else {
            return Err(ModelError::NoOptimizer);
        };
        self.backend
            .optimizer_model_mut()
            .optimize(&mut **optimizer)?;
        info!(
            status = %self.backend.optimizer_model().termination_status(),
            "Optimized infinite model"
        );
        Ok(())
    }
    // endregion Optimizing

    /// Mark the optimizer model as out of date and discard its results
    fn invalidate(&mut self) {
        self.built = false;
        self.backend.optimizer_model_mut().reset_solution();
    }

    fn check_name(
        &self,
        kind: &'static str,
        name: &str,
        exists: impl Fn(&ModelData, &str) -> bool,
    ) -> Result<(), ModelError> {
        if exists(&self.data, name) {
            Err(ModelError::DuplicateName {
                kind,
                name: name.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Errors from building or optimizing an infinite model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("A {kind} named {name} already exists")]
    DuplicateName { kind: &'static str, name: String },
    /// Parameter domain with non-finite bounds or lower_bound > upper_bound
    #[error("Parameter {0} has an invalid domain")]
    InvalidDomain(String),
    #[error("Value {value} is outside the domain of parameter {parameter}")]
    SupportOutOfDomain { parameter: String, value: f64 },
    /// Reference from another model, or to an object that doesn't exist
    #[error("Reference {0} is not part of the model")]
    InvalidReference(String),
    #[error("Variable {0} has invalid bounds")]
    InvalidBounds(String),
    #[error("Variable {0} is fixed, unfix it before setting bounds")]
    VariableFixed(String),
    #[error("Variable {variable} has no {bound}")]
    MissingBound {
        variable: String,
        bound: &'static str,
    },
    #[error("Variable {0} is not an infinite variable")]
    NotInfinite(String),
    #[error("Point variable needs {expected} parameter value(s), {found} given")]
    PointValueCount { expected: usize, found: usize },
    #[error("Infinite variable {0} needs at least one parameter")]
    NoParameters(String),
    #[error("Infinite variable {0} depends on the same parameter more than once")]
    RepeatedParameter(String),
    #[error("Measure {0} contains another measure")]
    NestedMeasure(String),
    #[error("Constraint {0} has an invalid set")]
    InvalidConstraintSet(String),
    #[error("The objective depends on infinite parameters, apply a measure first")]
    InfiniteObjective,
    #[error("No optimizer is attached to the model, use set_optimizer")]
    NoOptimizer,
    #[error(transparent)]
    Transformation(#[from] TransformationError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infinite_model::parameter::InfiniteParameterBuilder;
    use crate::infinite_model::variable::VariableInfoBuilder;
    use crate::optimize::solvers::clarabel::ClarabelSolver;
    use crate::optimize::TerminationStatus;

    fn time(supports: Vec<f64>) -> InfiniteParameter {
        InfiniteParameterBuilder::default()
            .name("t")
            .lower_bound(0.)
            .upper_bound(2.)
            .supports(supports)
            .build()
            .unwrap()
    }

    #[test]
    fn add_parameters() {
        let mut model = InfiniteModel::new();
        let t = model.add_parameter(time(vec![2., 0.])).unwrap();
        assert_eq!(model.supports(t).unwrap(), &[0., 2.]);
        assert_eq!(model.parameter_by_name("t"), Some(t));
        assert!(matches!(
            model.add_parameter(time(vec![])),
            Err(ModelError::DuplicateName { kind: "parameter", .. })
        ));

        let bad = InfiniteParameterBuilder::default()
            .name("x")
            .lower_bound(1.)
            .upper_bound(0.)
            .build()
            .unwrap();
        assert_eq!(
            model.add_parameter(bad),
            Err(ModelError::InvalidDomain("x".to_string()))
        );
        let outside = InfiniteParameterBuilder::default()
            .name("x")
            .lower_bound(0.)
            .upper_bound(1.)
            .supports(vec![0.5, 3.])
            .build()
            .unwrap();
        assert!(matches!(
            model.add_parameter(outside),
            Err(ModelError::SupportOutOfDomain { value, .. }) if value == 3.
        ));

        model.add_supports(t, &[1., 0.]).unwrap();
        assert_eq!(model.supports(t).unwrap(), &[0., 1., 2.]);
        assert!(model.add_supports(t, &[5.]).is_err());
    }

    #[test]
    fn add_variables() {
        let mut model = InfiniteModel::new();
        let t = model.add_parameter(time(vec![0., 2.])).unwrap();
        let x = model.add_variable("x", VariableInfo::free()).unwrap();
        let y = model
            .add_infinite_variable("y", &[t], VariableInfo::bounded(0., 5.))
            .unwrap();
        assert_eq!(model.variable_by_name("x"), Some(x));
        assert!(matches!(
            model.add_variable("y", VariableInfo::free()),
            Err(ModelError::DuplicateName { kind: "variable", .. })
        ));
        assert_eq!(
            model.add_variable("z", VariableInfo::bounded(2., 1.)),
            Err(ModelError::InvalidBounds("z".to_string()))
        );
        assert_eq!(
            model.add_infinite_variable("z", &[], VariableInfo::free()),
            Err(ModelError::NoParameters("z".to_string()))
        );
        assert_eq!(
            model.add_infinite_variable("z", &[t, t], VariableInfo::free()),
            Err(ModelError::RepeatedParameter("z".to_string()))
        );

        let y1 = model
            .add_point_variable("y1", y, &[1.], VariableInfo::free())
            .unwrap();
        assert_eq!(model.supports(t).unwrap(), &[0., 1., 2.]);
        assert_eq!(model.variable_name(y1), Some("y1"));
        assert_eq!(
            model.add_point_variable("y2", x, &[1.], VariableInfo::free()),
            Err(ModelError::NotInfinite("x".to_string()))
        );
        assert_eq!(
            model.add_point_variable("y2", y, &[1., 1.], VariableInfo::free()),
            Err(ModelError::PointValueCount {
                expected: 1,
                found: 2
            })
        );
        assert!(model
            .add_point_variable("y2", y, &[4.], VariableInfo::free())
            .is_err());
        assert_eq!(model.supports(t).unwrap(), &[0., 1., 2.]);
    }

    #[test]
    fn bounds_and_refs() {
        let mut model = InfiniteModel::new();
        let info = VariableInfoBuilder::default().lower_bound(0.).build().unwrap();
        let x = model.add_variable("x", info).unwrap();
        assert_eq!(model.lower_bound_ref(x), Ok(ConstraintRef::LowerBound(x)));
        assert!(matches!(
            model.upper_bound_ref(x),
            Err(ModelError::MissingBound { bound: "upper bound", .. })
        ));
        model.set_upper_bound(x, 3.).unwrap();
        assert_eq!(model.upper_bound_ref(x), Ok(ConstraintRef::UpperBound(x)));
        assert!(model.set_lower_bound(x, 4.).is_err());
        assert_eq!(
            model.set_lower_bound(x, f64::NAN),
            Err(ModelError::InvalidBounds("x".to_string()))
        );
        assert_eq!(
            model.set_upper_bound(x, f64::INFINITY),
            Err(ModelError::InvalidBounds("x".to_string()))
        );
        assert_eq!(
            model.fix(x, f64::NAN),
            Err(ModelError::InvalidBounds("x".to_string()))
        );
        // A NaN bound is rejected at creation as well, so no bound reference can dangle
        let nan_lower = VariableInfoBuilder::default()
            .lower_bound(f64::NAN)
            .build()
            .unwrap();
        assert_eq!(
            model.add_variable("w", nan_lower),
            Err(ModelError::InvalidBounds("w".to_string()))
        );
        assert_eq!(model.variable_by_name("w"), None);

        model.fix(x, 1.).unwrap();
        assert_eq!(model.fix_ref(x), Ok(ConstraintRef::Fix(x)));
        assert!(model.lower_bound_ref(x).is_err());
        assert!(model.upper_bound_ref(x).is_err());
        assert_eq!(
            model.set_lower_bound(x, 0.),
            Err(ModelError::VariableFixed("x".to_string()))
        );
        model.unfix(x).unwrap();
        assert!(model.fix_ref(x).is_err());
        assert!(model.unfix(x).is_err());
        assert!(model.delete_lower_bound(x).is_err());
        model.set_lower_bound(x, -1.).unwrap();
        model.delete_lower_bound(x).unwrap();
        assert!(model.lower_bound_ref(x).is_err());
        assert_eq!(
            model.constraint_name(ConstraintRef::Fix(x)),
            Some("x_fix".to_string())
        );
    }

    #[test]
    fn parameter_dependence() {
        let mut model = InfiniteModel::new();
        let t = model.add_parameter(time(vec![0., 1.])).unwrap();
        let s = model
            .add_parameter(
                InfiniteParameterBuilder::default()
                    .name("s")
                    .lower_bound(0.)
                    .upper_bound(1.)
                    .num_supports(2)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let x = model.add_variable("x", VariableInfo::free()).unwrap();
        let y = model
            .add_infinite_variable("y", &[s, t], VariableInfo::free())
            .unwrap();
        let y0 = model
            .add_point_variable("y0", y, &[0., 0.], VariableInfo::free())
            .unwrap();
        let m = model
            .add_measure("m", AffineExpr::from(y), t, MeasureKind::Integral)
            .unwrap();

        let expr = AffineExpr::from(x).with_term(y0, 1.);
        assert!(model.expression_parameters(&expr).unwrap().is_empty());
        assert_eq!(
            model.expression_parameters(&AffineExpr::from(y)).unwrap(),
            vec![t, s]
        );
        assert_eq!(
            model.expression_parameters(&AffineExpr::from(m)).unwrap(),
            vec![s]
        );
        assert_eq!(
            model
                .expression_parameters(&AffineExpr::from(x).with_term(t, 1.))
                .unwrap(),
            vec![t]
        );
        assert_eq!(
            model.set_objective(ObjectiveSense::Minimize, AffineExpr::from(m)),
            Err(ModelError::InfiniteObjective)
        );
        assert_eq!(
            model.add_measure("n", AffineExpr::from(m), s, MeasureKind::Integral),
            Err(ModelError::NestedMeasure("n".to_string()))
        );
        assert!(model
            .expression_parameters(&AffineExpr::from(VariableRef(10)))
            .is_err());
    }

    #[test]
    fn constraints() {
        let mut model = InfiniteModel::new();
        let x = model.add_variable("x", VariableInfo::free()).unwrap();
        let c = model
            .add_constraint("c", AffineExpr::from(x), ConstraintSet::Interval(0., 1.))
            .unwrap();
        assert_eq!(model.constraint_by_name("c"), Some(c));
        assert_eq!(model.constraint_name(c), Some("c".to_string()));
        assert_eq!(
            model.add_constraint("d", AffineExpr::from(x), ConstraintSet::Interval(1., 0.)),
            Err(ModelError::InvalidConstraintSet("d".to_string()))
        );
        for set in [
            ConstraintSet::GreaterThan(f64::INFINITY),
            ConstraintSet::LessThan(f64::NEG_INFINITY),
            ConstraintSet::EqualTo(f64::NEG_INFINITY),
        ] {
            assert_eq!(
                model.add_constraint("d", AffineExpr::from(x), set),
                Err(ModelError::InvalidConstraintSet("d".to_string()))
            );
        }
        assert_eq!(model.data().num_constraints(), 1);
        assert!(model
            .add_constraint(
                "d",
                AffineExpr::from(VariableRef(3)),
                ConstraintSet::EqualTo(0.)
            )
            .is_err());
    }

    #[test]
    fn modification_discards_results() {
        let mut model = InfiniteModel::new();
        let x = model.add_variable("x", VariableInfo::bounded(1., 2.)).unwrap();
        model
            .set_objective(ObjectiveSense::Minimize, AffineExpr::from(x))
            .unwrap();
        assert_eq!(model.optimize(), Err(ModelError::NoOptimizer));

        model.set_optimizer(Box::new(ClarabelSolver::default()));
        model.optimize().unwrap();
        assert!(model.is_built());
        assert_eq!(
            model.optimizer_model().termination_status(),
            TerminationStatus::Optimal
        );

        model.set_upper_bound(x, 3.).unwrap();
        assert!(!model.is_built());
        assert_eq!(
            model.optimizer_model().termination_status(),
            TerminationStatus::OptimizeNotCalled
        );
        model.optimize().unwrap();
        model.set_optimizer(Box::new(ClarabelSolver::default()));
        assert_eq!(
            model.optimizer_model().termination_status(),
            TerminationStatus::OptimizeNotCalled
        );
    }
}
