//! Module providing a JSON report of the results of an infinite model
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::infinite_model::InfiniteModel;
use crate::io::IoError;
use crate::optimize::{ResultStatus, TerminationStatus};
use crate::transformation::Mapped;

/// Results of the first solution of a model, keyed by the names used in the model
///
/// Values of infinite variables and duals of infinite constraints are written with the
/// parameter values they belong to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsReport {
    pub termination_status: TerminationStatus,
    pub raw_status: Option<String>,
    pub primal_status: ResultStatus,
    pub dual_status: ResultStatus,
    /// Seconds
    pub solve_time: Option<f64>,
    pub objective_value: Option<f64>,
    /// Values of every variable, empty without a primal solution
    pub variables: IndexMap<String, Mapped<f64>>,
    /// Duals of every constraint, None without a dual solution
    pub constraint_duals: Option<IndexMap<String, Mapped<f64>>>,
}

impl ResultsReport {
    /// Collect the results of a model with an attached optimizer
    pub fn from_model(model: &InfiniteModel) -> Result<Self, IoError> {
        let has_values = model.has_values(1)?;
        let mut variables = IndexMap::new();
        if has_values {
            for (variable, var) in model.data().variables() {
                variables.insert(var.name.clone(), model.value(&variable, 1)?);
            }
        }
        let constraint_duals = if model.has_duals(1)? {
            let mut duals = IndexMap::new();
            for (constraint, cons) in model.data().constraints() {
                duals.insert(cons.name.clone(), model.dual(&constraint, 1)?);
            }
            Some(duals)
        } else {
            None
        };
        Ok(ResultsReport {
            termination_status: model.termination_status()?,
            raw_status: model.raw_status().ok(),
            primal_status: model.primal_status(1)?,
            dual_status: model.dual_status(1)?,
            solve_time: model.solve_time().ok(),
            objective_value: if has_values {
                Some(model.objective_value(1)?)
            } else {
                None
            },
            variables,
            constraint_duals,
        })
    }

    pub fn to_json_string(&self) -> Result<String, IoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON to `path`
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infinite_model::constraint::ConstraintSet;
    use crate::infinite_model::expression::AffineExpr;
    use crate::infinite_model::parameter::InfiniteParameterBuilder;
    use crate::infinite_model::variable::VariableInfo;
    use crate::optimize::objective::ObjectiveSense;
    use crate::optimize::solvers::clarabel::ClarabelSolver;
    use crate::results::ResultError;
    use serde_json::Value;

    fn solved_model() -> InfiniteModel {
        let mut model = InfiniteModel::new();
        let t = model
            .add_parameter(
                InfiniteParameterBuilder::default()
                    .name("t")
                    .lower_bound(0.)
                    .upper_bound(1.)
                    .num_supports(2)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let x = model.add_variable("x", VariableInfo::bounded(0., 4.)).unwrap();
        let y = model
            .add_infinite_variable("y", &[t], VariableInfo::free())
            .unwrap();
        model
            .add_constraint(
                "link",
                AffineExpr::from(y).with_term(x, -1.),
                ConstraintSet::EqualTo(0.),
            )
            .unwrap();
        model
            .set_objective(ObjectiveSense::Maximize, AffineExpr::from(x))
            .unwrap();
        model.set_optimizer(Box::new(ClarabelSolver::default()));
        model.optimize().unwrap();
        model
    }

    #[test]
    fn report_json() {
        let model = solved_model();
        let report = ResultsReport::from_model(&model).unwrap();
        assert_eq!(report.termination_status, TerminationStatus::Optimal);
        assert!((report.objective_value.unwrap() - 4.).abs() < 1e-5);
        assert!(report.variables["y"].is_infinite());
        assert_eq!(report.constraint_duals.as_ref().map(|d| d.len()), Some(1));

        let json: Value = serde_json::from_str(&report.to_json_string().unwrap()).unwrap();
        assert_eq!(json["termination_status"], "optimal");
        assert_eq!(json["primal_status"], "feasible_point");
        assert!(json["variables"]["x"].is_number());
        assert_eq!(json["variables"]["y"]["supports"][1][0], 1.0);
        assert_eq!(json["constraint_duals"]["link"]["values"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn report_needs_optimizer() {
        let mut model = InfiniteModel::new();
        model.add_variable("x", VariableInfo::free()).unwrap();
        assert!(matches!(
            ResultsReport::from_model(&model),
            Err(IoError::Results(ResultError::NoOptimizer))
        ));
    }

    #[test]
    fn report_before_optimize() {
        let mut model = solved_model();
        model.add_variable("z", VariableInfo::free()).unwrap();
        let report = ResultsReport::from_model(&model).unwrap();
        assert_eq!(report.termination_status, TerminationStatus::OptimizeNotCalled);
        assert!(report.variables.is_empty());
        assert_eq!(report.constraint_duals, None);
        assert_eq!(report.objective_value, None);
    }

    #[test]
    fn write_report() {
        let path = std::env::temp_dir().join("infopt_results_report.json");
        let report = ResultsReport::from_model(&solved_model()).unwrap();
        report.write_json(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"termination_status\": \"optimal\""));
        fs::remove_file(path).unwrap();
    }
}
