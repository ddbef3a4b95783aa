//! Transformation by transcription
//!
//! Every infinite object is discretized over the supports of the parameters it depends on:
//! an infinite variable becomes one optimizer variable per support combination, a measure a
//! weighted sum over the supports of its parameter, and a constraint one optimizer constraint
//! per support combination.
use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::configuration;
use crate::infinite_model::constraint::{ConstraintRef, ConstraintSet};
use crate::infinite_model::expression::{AffineExpr, ModelRef};
use crate::infinite_model::measure::MeasureRef;
use crate::infinite_model::parameter::ParameterRef;
use crate::infinite_model::variable::{VariableInfo, VariableKind, VariableRef};
use crate::infinite_model::ModelData;
use crate::optimize::constraint::{Constraint, ConstraintIndex};
use crate::optimize::expression::LinearExpr;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::variable::VariableIndex;
use crate::transformation::{Mapped, TransformationBackend, TransformationError};

/// Support position of each parameter an expression is evaluated at
type Assignment = BTreeMap<ParameterRef, usize>;

/// Backend discretizing the model over the supports of its parameters
///
/// Support combinations are enumerated row-major, the last parameter varying fastest. Optimizer
/// objects are named after their infinite counterpart and support values, e.g. `y(1, 2.5)`.
#[derive(Debug, Clone)]
pub struct TranscriptionBackend {
    problem: Problem,
    /// Supports of each parameter at build time
    supports: IndexMap<ParameterRef, Vec<f64>>,
    variables: IndexMap<VariableRef, Mapped<VariableIndex>>,
    measures: IndexMap<MeasureRef, Mapped<LinearExpr>>,
    constraints: IndexMap<ConstraintRef, Mapped<ConstraintIndex>>,
    /// Grid parameters of each infinite variable, in declaration order
    variable_parameters: IndexMap<VariableRef, Vec<ParameterRef>>,
    /// Grid parameters each measure still depends on
    measure_parameters: IndexMap<MeasureRef, Vec<ParameterRef>>,
    tolerance: f64,
}

impl Default for TranscriptionBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptionBackend {
    pub fn new() -> Self {
        TranscriptionBackend {
            problem: Problem::new_minimization(),
            supports: IndexMap::new(),
            variables: IndexMap::new(),
            measures: IndexMap::new(),
            constraints: IndexMap::new(),
            variable_parameters: IndexMap::new(),
            measure_parameters: IndexMap::new(),
            tolerance: configuration::current().support_tolerance,
        }
    }

    // region Build steps
    fn transcribe_variables(&mut self, model: &ModelData) -> Result<(), TransformationError> {
        for (variable, var) in model.variables() {
            match &var.kind {
                VariableKind::Finite => {
                    let index = self.problem.add_variable(&var.name)?;
                    self.apply_info(index, &var.info)?;
                    self.variables.insert(variable, Mapped::Finite(index));
                }
                VariableKind::Infinite { parameters } => {
                    let grid = self.support_grid(parameters)?;
                    let mut supports = Vec::with_capacity(grid.len());
                    let mut indices = Vec::with_capacity(grid.len());
                    for combination in grid {
                        let values = self.support_values(parameters, &combination)?;
                        let index = self.problem.add_variable(&label(&var.name, &values))?;
                        self.apply_info(index, &var.info)?;
                        supports.push(values);
                        indices.push(index);
                    }
                    self.variable_parameters.insert(variable, parameters.clone());
                    self.variables.insert(
                        variable,
                        Mapped::Infinite {
                            supports,
                            values: indices,
                        },
                    );
                }
                VariableKind::Point { .. } => {}
            }
        }
        // Point variables are aliases of an optimizer variable of their infinite variable
        for (variable, var) in model.variables() {
            let VariableKind::Point { infinite, values } = &var.kind else {
                continue;
            };
            let parameters = self
                .variable_parameters
                .get(infinite)
                .cloned()
                .ok_or_else(|| not_transformed(ModelRef::Variable(*infinite)))?;
            let mut assignment = Assignment::new();
            for (parameter, value) in parameters.iter().zip(values) {
                let position = self
                    .supports_of(*parameter)?
                    .iter()
                    .position(|s| (s - value).abs() <= self.tolerance)
                    .ok_or(TransformationError::SupportNotFound {
                        parameter: parameter.index(),
                        value: *value,
                    })?;
                assignment.insert(*parameter, position);
            }
            let index = self.variable_at(*infinite, &assignment)?;
            self.apply_info(index, &var.info)?;
            self.variables.insert(variable, Mapped::Finite(index));
        }
        Ok(())
    }

    fn transcribe_measures(&mut self, model: &ModelData) -> Result<(), TransformationError> {
        for (measure_ref, measure) in model.measures() {
            if measure
                .integrand
                .items()
                .any(|item| matches!(item, ModelRef::Measure(_)))
            {
                return Err(TransformationError::NestedMeasure(measure.name.clone()));
            }
            let parameter = model
                .parameter(measure.parameter)
                .ok_or_else(|| not_transformed(ModelRef::Parameter(measure.parameter)))?;
            let weights = measure.kind.weights(
                self.supports_of(measure.parameter)?,
                parameter.lower_bound,
                parameter.upper_bound,
            );
            let mut remaining = self.expression_parameters(&measure.integrand)?;
            remaining.retain(|p| *p != measure.parameter);

            let grid = self.support_grid(&remaining)?;
            let mut supports = Vec::with_capacity(grid.len());
            let mut expressions = Vec::with_capacity(grid.len());
            for combination in grid {
                let mut assignment = support_assignment(&remaining, &combination);
                let mut expression = LinearExpr::new();
                for (position, weight) in weights.iter().enumerate() {
                    assignment.insert(measure.parameter, position);
                    expression.add_scaled(&self.transcribe(&measure.integrand, &assignment)?, *weight);
                }
                supports.push(self.support_values(&remaining, &combination)?);
                expressions.push(expression);
            }
            self.measures
                .insert(measure_ref, into_mapped(&remaining, supports, expressions));
            self.measure_parameters.insert(measure_ref, remaining);
        }
        Ok(())
    }

    fn transcribe_constraints(&mut self, model: &ModelData) -> Result<(), TransformationError> {
        for (constraint_ref, cons) in model.constraints() {
            let parameters = self.expression_parameters(&cons.expression)?;
            let (lower_bound, upper_bound) = cons.set.bounds();
            let grid = self.support_grid(&parameters)?;
            let mut supports = Vec::with_capacity(grid.len());
            let mut indices = Vec::with_capacity(grid.len());
            for combination in grid {
                let values = self.support_values(&parameters, &combination)?;
                let expression =
                    self.transcribe(&cons.expression, &support_assignment(&parameters, &combination))?;
                let constraint = match cons.set {
                    ConstraintSet::EqualTo(equals) => Constraint::new_equality(&expression, equals),
                    _ => Constraint::new_inequality(&expression, lower_bound, upper_bound),
                };
                indices.push(
                    self.problem
                        .add_constraint(&label(&cons.name, &values), constraint)?,
                );
                supports.push(values);
            }
            self.constraints
                .insert(constraint_ref, into_mapped(&parameters, supports, indices));
        }
        Ok(())
    }

    fn transcribe_objective(&mut self, model: &ModelData) -> Result<(), TransformationError> {
        if !self.expression_parameters(model.objective())?.is_empty() {
            return Err(TransformationError::InfiniteObjective);
        }
        let objective = self.transcribe(model.objective(), &Assignment::new())?;
        self.problem
            .set_objective(model.objective_sense(), objective)?;
        Ok(())
    }

    /// Apply the bounds or fixed value of a variable, bounds that aren't given are kept
    fn apply_info(
        &mut self,
        index: VariableIndex,
        info: &VariableInfo,
    ) -> Result<(), TransformationError> {
        if let Some(value) = info.fix {
            self.problem.fix_variable(index, value)?;
            return Ok(());
        }
        let var = self
            .problem
            .variable(index)
            .ok_or(ProblemError::NonExistentVariable)?;
        let lower_bound = info.lower_bound.unwrap_or(var.lower_bound);
        let upper_bound = info.upper_bound.unwrap_or(var.upper_bound);
        self.problem
            .set_variable_bounds(index, lower_bound, upper_bound)?;
        Ok(())
    }
    // endregion Build steps

    // region Discretization
    fn supports_of(&self, parameter: ParameterRef) -> Result<&[f64], TransformationError> {
        self.supports
            .get(&parameter)
            .map(Vec::as_slice)
            .ok_or_else(|| not_transformed(ModelRef::Parameter(parameter)))
    }

    /// Every combination of support positions of the parameters
    fn support_grid(
        &self,
        parameters: &[ParameterRef],
    ) -> Result<Vec<Vec<usize>>, TransformationError> {
        let counts = parameters
            .iter()
            .map(|p| self.supports_of(*p).map(<[f64]>::len))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(support_grid(&counts))
    }

    fn support_values(
        &self,
        parameters: &[ParameterRef],
        combination: &[usize],
    ) -> Result<Vec<f64>, TransformationError> {
        parameters
            .iter()
            .zip(combination)
            .map(|(p, position)| {
                self.supports_of(*p)?
                    .get(*position)
                    .copied()
                    .ok_or_else(|| not_transformed(ModelRef::Parameter(*p)))
            })
            .collect()
    }

    /// Position in the grid of `parameters` of the support combination `assignment`
    fn grid_position(
        &self,
        parameters: &[ParameterRef],
        assignment: &Assignment,
    ) -> Result<usize, TransformationError> {
        let mut position = 0;
        let mut stride = 1;
        for parameter in parameters.iter().rev() {
            let support = assignment
                .get(parameter)
                .ok_or_else(|| not_transformed(ModelRef::Parameter(*parameter)))?;
            position += support * stride;
            stride *= self.supports_of(*parameter)?.len();
        }
        Ok(position)
    }

    /// Optimizer variable of a variable at a support combination
    fn variable_at(
        &self,
        variable: VariableRef,
        assignment: &Assignment,
    ) -> Result<VariableIndex, TransformationError> {
        let missing = || not_transformed(ModelRef::Variable(variable));
        match self.variables.get(&variable).ok_or_else(missing)? {
            Mapped::Finite(index) => Ok(*index),
            Mapped::Infinite { values, .. } => {
                let parameters = self.variable_parameters.get(&variable).ok_or_else(missing)?;
                let position = self.grid_position(parameters, assignment)?;
                values.get(position).copied().ok_or_else(missing)
            }
        }
    }

    /// Optimizer expression of a measure at a support combination
    fn measure_at(
        &self,
        measure: MeasureRef,
        assignment: &Assignment,
    ) -> Result<&LinearExpr, TransformationError> {
        let missing = || not_transformed(ModelRef::Measure(measure));
        match self.measures.get(&measure).ok_or_else(missing)? {
            Mapped::Finite(expression) => Ok(expression),
            Mapped::Infinite { values, .. } => {
                let parameters = self.measure_parameters.get(&measure).ok_or_else(missing)?;
                let position = self.grid_position(parameters, assignment)?;
                values.get(position).ok_or_else(missing)
            }
        }
    }

    /// Optimizer expression of an expression at a support combination
    fn transcribe(
        &self,
        expression: &AffineExpr,
        assignment: &Assignment,
    ) -> Result<LinearExpr, TransformationError> {
        let mut transcribed = LinearExpr::constant(expression.constant);
        for (item, coef) in &expression.terms {
            match *item {
                ModelRef::Parameter(parameter) => {
                    let value = assignment
                        .get(&parameter)
                        .and_then(|position| self.supports.get(&parameter)?.get(*position))
                        .ok_or_else(|| not_transformed(*item))?;
                    transcribed.constant += coef * value;
                }
                ModelRef::Variable(variable) => {
                    transcribed.add_term(self.variable_at(variable, assignment)?, *coef);
                }
                ModelRef::Measure(measure) => {
                    transcribed.add_scaled(self.measure_at(measure, assignment)?, *coef);
                }
            }
        }
        Ok(transcribed)
    }

    /// Sorted parameters of the grid an expression is transcribed over
    fn expression_parameters(
        &self,
        expression: &AffineExpr,
    ) -> Result<Vec<ParameterRef>, TransformationError> {
        let mut parameters = BTreeSet::new();
        for item in expression.items() {
            match item {
                ModelRef::Parameter(parameter) => {
                    self.supports_of(parameter)?;
                    parameters.insert(parameter);
                }
                ModelRef::Variable(variable) => {
                    if !self.variables.contains_key(&variable) {
                        return Err(not_transformed(item));
                    }
                    if let Some(grid) = self.variable_parameters.get(&variable) {
                        parameters.extend(grid.iter().copied());
                    }
                }
                ModelRef::Measure(measure) => {
                    let grid = self
                        .measure_parameters
                        .get(&measure)
                        .ok_or_else(|| not_transformed(item))?;
                    parameters.extend(grid.iter().copied());
                }
            }
        }
        Ok(parameters.into_iter().collect())
    }
    // endregion Discretization
}

impl TransformationBackend for TranscriptionBackend {
    fn name(&self) -> &'static str {
        "transcription"
    }

    fn build(&mut self, model: &ModelData) -> Result<(), TransformationError> {
        *self = TranscriptionBackend::new();
        for (parameter, param) in model.parameters() {
            self.supports.insert(parameter, param.supports.clone());
        }
        self.transcribe_variables(model)?;
        self.transcribe_measures(model)?;
        self.transcribe_constraints(model)?;
        self.transcribe_objective(model)?;
        debug!(
            variables = self.problem.num_variables(),
            constraints = self.problem.num_constraints(),
            "Transcribed infinite model"
        );
        Ok(())
    }

    fn optimizer_model(&self) -> &Problem {
        &self.problem
    }

    fn optimizer_model_mut(&mut self) -> &mut Problem {
        &mut self.problem
    }

    fn map_variable_index(
        &self,
        variable: VariableRef,
    ) -> Result<Mapped<VariableIndex>, TransformationError> {
        self.variables
            .get(&variable)
            .cloned()
            .ok_or_else(|| not_transformed(ModelRef::Variable(variable)))
    }

    fn map_constraint_index(
        &self,
        constraint: ConstraintRef,
    ) -> Result<Mapped<ConstraintIndex>, TransformationError> {
        match constraint {
            ConstraintRef::Expression(_) => self
                .constraints
                .get(&constraint)
                .cloned()
                .ok_or_else(|| TransformationError::NotTransformed(constraint.to_string())),
            ConstraintRef::LowerBound(variable) => Ok(self
                .map_variable_index(variable)?
                .map(ConstraintIndex::LowerBound)),
            ConstraintRef::UpperBound(variable) => Ok(self
                .map_variable_index(variable)?
                .map(ConstraintIndex::UpperBound)),
            ConstraintRef::Fix(variable) => {
                Ok(self.map_variable_index(variable)?.map(ConstraintIndex::Fix))
            }
        }
    }

    fn map_measure(&self, measure: MeasureRef) -> Result<Mapped<LinearExpr>, TransformationError> {
        self.measures
            .get(&measure)
            .cloned()
            .ok_or_else(|| not_transformed(ModelRef::Measure(measure)))
    }

    fn map_expression(
        &self,
        expression: &AffineExpr,
    ) -> Result<Mapped<LinearExpr>, TransformationError> {
        let parameters = self.expression_parameters(expression)?;
        let grid = self.support_grid(&parameters)?;
        let mut supports = Vec::with_capacity(grid.len());
        let mut expressions = Vec::with_capacity(grid.len());
        for combination in grid {
            expressions.push(self.transcribe(expression, &support_assignment(&parameters, &combination))?);
            supports.push(self.support_values(&parameters, &combination)?);
        }
        Ok(into_mapped(&parameters, supports, expressions))
    }

    fn parameter_supports(&self, parameter: ParameterRef) -> Result<Vec<f64>, TransformationError> {
        Ok(self.supports_of(parameter)?.to_vec())
    }
}

/// Row-major enumeration of support positions, `counts[i]` supports for parameter `i`
fn support_grid(counts: &[usize]) -> Vec<Vec<usize>> {
    let mut grid = vec![Vec::with_capacity(counts.len())];
    for &count in counts {
        grid = grid
            .into_iter()
            .flat_map(|prefix| {
                (0..count).map(move |position| {
                    let mut combination = prefix.clone();
                    combination.push(position);
                    combination
                })
            })
            .collect();
    }
    grid
}

fn support_assignment(parameters: &[ParameterRef], combination: &[usize]) -> Assignment {
    parameters
        .iter()
        .copied()
        .zip(combination.iter().copied())
        .collect()
}

/// Name of an optimizer object, `name(v1, v2)` or just `name` without parameters
fn label(name: &str, values: &[f64]) -> String {
    if values.is_empty() {
        return name.to_string();
    }
    let values = values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{name}({values})")
}

fn into_mapped<T>(parameters: &[ParameterRef], supports: Vec<Vec<f64>>, mut values: Vec<T>) -> Mapped<T> {
    if parameters.is_empty() {
        if let Some(value) = values.pop() {
            return Mapped::Finite(value);
        }
    }
    Mapped::Infinite { supports, values }
}

fn not_transformed(item: ModelRef) -> TransformationError {
    TransformationError::NotTransformed(item.to_string())
}
