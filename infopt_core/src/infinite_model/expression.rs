//! Affine expressions over parameters, variables and measures of an infinite model
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;

use crate::infinite_model::measure::MeasureRef;
use crate::infinite_model::parameter::ParameterRef;
use crate::infinite_model::variable::VariableRef;

/// Reference to any object of an infinite model which can appear in an expression
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelRef {
    Parameter(ParameterRef),
    Variable(VariableRef),
    Measure(MeasureRef),
}

impl From<ParameterRef> for ModelRef {
    fn from(value: ParameterRef) -> Self {
        ModelRef::Parameter(value)
    }
}

impl From<VariableRef> for ModelRef {
    fn from(value: VariableRef) -> Self {
        ModelRef::Variable(value)
    }
}

impl From<MeasureRef> for ModelRef {
    fn from(value: MeasureRef) -> Self {
        ModelRef::Measure(value)
    }
}

impl Display for ModelRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelRef::Parameter(p) => write!(f, "p{}", p.index()),
            ModelRef::Variable(v) => write!(f, "v{}", v.index()),
            ModelRef::Measure(m) => write!(f, "m{}", m.index()),
        }
    }
}

/// An affine expression `sum(coefficient * item) + constant`
///
/// Parameters appearing in an expression take the value of the support the expression is
/// evaluated at.
///
/// # Examples
/// ```rust
/// use infopt_core::infinite_model::expression::AffineExpr;
/// use infopt_core::infinite_model::InfiniteModel;
/// use infopt_core::infinite_model::variable::VariableInfo;
/// let mut model = InfiniteModel::new();
/// let x = model.add_variable("x", VariableInfo::free()).unwrap();
/// let expr = AffineExpr::from(x).with_term(x, 2.).with_constant(1.);
/// assert_eq!(expr.coefficient(x), 3.);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffineExpr {
    pub terms: IndexMap<ModelRef, f64>,
    pub constant: f64,
}

impl AffineExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an expression with only a constant
    pub fn constant(constant: f64) -> Self {
        AffineExpr {
            terms: IndexMap::new(),
            constant,
        }
    }

    /// Add `coefficient * item` to the expression, merging with an existing term
    pub fn add_term<R: Into<ModelRef>>(&mut self, item: R, coefficient: f64) {
        *self.terms.entry(item.into()).or_insert(0.) += coefficient;
    }

    /// Builder style version of [`AffineExpr::add_term`]
    pub fn with_term<R: Into<ModelRef>>(mut self, item: R, coefficient: f64) -> Self {
        self.add_term(item, coefficient);
        self
    }

    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    /// Coefficient of an item, 0 if it doesn't appear
    pub fn coefficient<R: Into<ModelRef>>(&self, item: R) -> f64 {
        self.terms.get(&item.into()).copied().unwrap_or(0.)
    }

    /// Iterate over the items of the expression
    pub fn items(&self) -> impl Iterator<Item = ModelRef> + '_ {
        self.terms.keys().copied()
    }
}

impl From<ModelRef> for AffineExpr {
    fn from(value: ModelRef) -> Self {
        AffineExpr::new().with_term(value, 1.)
    }
}

impl From<ParameterRef> for AffineExpr {
    fn from(value: ParameterRef) -> Self {
        AffineExpr::from(ModelRef::from(value))
    }
}

impl From<VariableRef> for AffineExpr {
    fn from(value: VariableRef) -> Self {
        AffineExpr::from(ModelRef::from(value))
    }
}

impl From<MeasureRef> for AffineExpr {
    fn from(value: MeasureRef) -> Self {
        AffineExpr::from(ModelRef::from(value))
    }
}

impl Display for AffineExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut terms = self
            .terms
            .iter()
            .map(|(item, coef)| format!("{coef}*{item}"))
            .collect::<Vec<_>>();
        if self.constant != 0. || terms.is_empty() {
            terms.push(format!("{}", self.constant));
        }
        write!(f, "{}", terms.join(" + "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_terms() {
        let x = VariableRef(0);
        let t = ParameterRef(0);
        let mut expr = AffineExpr::from(x).with_term(t, -1.);
        expr.add_term(x, 2.);
        assert_eq!(expr.coefficient(x), 3.);
        assert_eq!(expr.coefficient(t), -1.);
        assert_eq!(expr.coefficient(MeasureRef(0)), 0.);
        assert_eq!(expr.items().count(), 2);
    }

    #[test]
    fn display() {
        let expr = AffineExpr::from(VariableRef(1)).with_constant(2.);
        assert_eq!(expr.to_string(), "1*v1 + 2");
        assert_eq!(AffineExpr::new().to_string(), "0");
    }
}
