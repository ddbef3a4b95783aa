//! Provides struct for representing a constraint in an optimization problem
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::optimize::expression::LinearExpr;
use crate::optimize::variable::VariableIndex;

/// Identifies a constraint of a [`Problem`](crate::optimize::problem::Problem)
///
/// Variable bounds are addressed through the variable they belong to.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ConstraintIndex {
    /// A linear constraint, by position
    Linear(usize),
    /// The lower bound of a variable
    LowerBound(VariableIndex),
    /// The upper bound of a variable
    UpperBound(VariableIndex),
    /// The fixed value of a variable
    Fix(VariableIndex),
}

impl Display for ConstraintIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintIndex::Linear(i) => write!(f, "ConstraintIndex({})", i),
            ConstraintIndex::LowerBound(v) => write!(f, "LowerBound({})", v),
            ConstraintIndex::UpperBound(v) => write!(f, "UpperBound({})", v),
            ConstraintIndex::Fix(v) => write!(f, "Fix({})", v),
        }
    }
}

/// Which kind of set a constraint function is restricted to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SetKind {
    EqualTo,
    GreaterThan,
    LessThan,
    Interval,
}

/// Represents a linear constraint in an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Represents an equality constraint, where `terms` = `equals`
    Equality {
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The right hand side of the equality constraint
        equals: f64,
    },
    /// Represents an inequality constraint, either bound may be infinite
    Inequality {
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The lowest value the sum of the terms can take
        lower_bound: f64,
        /// The highest value the sum of the terms can take
        upper_bound: f64,
    },
}

impl Constraint {
    /// Create a new equality constraint `expression = equals`
    ///
    /// The constant of the expression is moved to the right hand side.
    ///
    /// # Examples
    /// ```rust
    /// use infopt_core::optimize::constraint::Constraint;
    /// use infopt_core::optimize::expression::LinearExpr;
    /// use infopt_core::optimize::variable::VariableIndex;
    /// let mut expr = LinearExpr::new();
    /// expr.add_term(VariableIndex(0), 3.0);
    /// expr.add_term(VariableIndex(1), 2.0);
    /// expr.constant = 1.0;
    /// // Represents 3*x + 2*y + 1 = 7
    /// let cons = Constraint::new_equality(&expr, 7.0);
    /// assert_eq!(cons.to_string(), "3*x0 + 2*x1 = 6");
    /// ```
    pub fn new_equality(expression: &LinearExpr, equals: f64) -> Self {
        Constraint::Equality {
            terms: Constraint::collect_terms(expression),
            equals: equals - expression.constant,
        }
    }

    /// Create a new inequality constraint `lower_bound <= expression <= upper_bound`
    ///
    /// Either bound may be infinite, the constant of the expression is moved to the bounds.
    pub fn new_inequality(expression: &LinearExpr, lower_bound: f64, upper_bound: f64) -> Self {
        Constraint::Inequality {
            terms: Constraint::collect_terms(expression),
            lower_bound: lower_bound - expression.constant,
            upper_bound: upper_bound - expression.constant,
        }
    }

    /// Terms of the constraint
    pub fn terms(&self) -> &[ConstraintTerm] {
        match self {
            Constraint::Equality { terms, .. } => terms,
            Constraint::Inequality { terms, .. } => terms,
        }
    }

    /// Kind of set the constraint restricts its terms to
    pub fn set_kind(&self) -> SetKind {
        match self {
            Constraint::Equality { .. } => SetKind::EqualTo,
            Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } => match (lower_bound.is_finite(), upper_bound.is_finite()) {
                (true, true) => SetKind::Interval,
                (false, true) => SetKind::LessThan,
                // A constraint with no finite bound is treated as a (trivial) lower bound
                (_, false) => SetKind::GreaterThan,
            },
        }
    }

    /// Evaluate the terms of the constraint, with `values` indexed by variable position
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms()
            .iter()
            .map(|t| t.coefficient * values[t.variable.0])
            .sum()
    }

    fn collect_terms(expression: &LinearExpr) -> Vec<ConstraintTerm> {
        expression
            .terms
            .iter()
            .map(|(var, coef)| ConstraintTerm {
                variable: *var,
                coefficient: *coef,
            })
            .collect()
    }

    /// Convert a slice of terms into a String representation
    fn terms_to_string(terms: &[ConstraintTerm]) -> String {
        if terms.is_empty() {
            return "0".to_string();
        }
        terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Equality { terms, equals } => {
                write!(f, "{} = {}", Self::terms_to_string(terms), equals)
            }
            Constraint::Inequality {
                terms,
                lower_bound,
                upper_bound,
            } => {
                write!(
                    f,
                    "{} <= {} <= {}",
                    lower_bound,
                    Self::terms_to_string(terms),
                    upper_bound
                )
            }
        }
    }
}

/// Represents a single term in a constraint, specifically
/// represents the multiplication of the `variable` by the `coefficient`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintTerm {
    /// Index of the variable in the problem
    pub variable: VariableIndex,
    /// The coefficient for the variable
    pub coefficient: f64,
}

impl Display for ConstraintTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*x{}", self.coefficient, self.variable.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr() -> LinearExpr {
        let mut expr = LinearExpr::new();
        expr.add_term(VariableIndex(0), 2.0);
        expr.add_term(VariableIndex(2), -1.0);
        expr.constant = 3.0;
        expr
    }

    #[test]
    fn constant_moves_to_bounds() {
        match Constraint::new_inequality(&expr(), 5.0, f64::INFINITY) {
            Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } => {
                assert!((lower_bound - 2.0).abs() < 1e-12);
                assert!(upper_bound.is_infinite());
            }
            Constraint::Equality { .. } => panic!("Incorrect constraint type created"),
        }
    }

    #[test]
    fn set_kinds() {
        let e = expr();
        assert_eq!(Constraint::new_equality(&e, 1.).set_kind(), SetKind::EqualTo);
        assert_eq!(
            Constraint::new_inequality(&e, 1., f64::INFINITY).set_kind(),
            SetKind::GreaterThan
        );
        assert_eq!(
            Constraint::new_inequality(&e, f64::NEG_INFINITY, 1.).set_kind(),
            SetKind::LessThan
        );
        assert_eq!(Constraint::new_inequality(&e, 0., 1.).set_kind(), SetKind::Interval);
    }

    #[test]
    fn evaluate_and_display() {
        let cons = Constraint::new_equality(&expr(), 0.0);
        assert!((cons.evaluate(&[1.0, 100.0, 4.0]) - (-2.0)).abs() < 1e-12);
        assert_eq!(cons.to_string(), "2*x0 + -1*x2 = -3");
    }
}
