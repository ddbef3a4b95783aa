//! Constraints of an infinite model
use std::fmt::{Display, Formatter};

use crate::infinite_model::expression::AffineExpr;
use crate::infinite_model::variable::VariableRef;

/// Reference to a constraint of an [`InfiniteModel`](crate::infinite_model::InfiniteModel)
///
/// The bounds and fixed value of a variable are constraints as well, obtained with
/// [`lower_bound_ref`](crate::infinite_model::InfiniteModel::lower_bound_ref),
/// [`upper_bound_ref`](crate::infinite_model::InfiniteModel::upper_bound_ref) and
/// [`fix_ref`](crate::infinite_model::InfiniteModel::fix_ref).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintRef {
    /// Constraint added with `add_constraint`, by position
    Expression(usize),
    LowerBound(VariableRef),
    UpperBound(VariableRef),
    Fix(VariableRef),
}

impl Display for ConstraintRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintRef::Expression(i) => write!(f, "c{i}"),
            ConstraintRef::LowerBound(v) => write!(f, "lower_bound(v{})", v.index()),
            ConstraintRef::UpperBound(v) => write!(f, "upper_bound(v{})", v.index()),
            ConstraintRef::Fix(v) => write!(f, "fix(v{})", v.index()),
        }
    }
}

/// Set an expression is constrained to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintSet {
    EqualTo(f64),
    GreaterThan(f64),
    LessThan(f64),
    /// Both bounds, `lower <= upper`
    Interval(f64, f64),
}

impl ConstraintSet {
    /// Lower and upper bound of the set, infinite when missing
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            ConstraintSet::EqualTo(value) => (value, value),
            ConstraintSet::GreaterThan(lower) => (lower, f64::INFINITY),
            ConstraintSet::LessThan(upper) => (f64::NEG_INFINITY, upper),
            ConstraintSet::Interval(lower, upper) => (lower, upper),
        }
    }

    /// Check the set can be satisfied: no NaN, ordered bounds, an equality with a finite value
    /// and no lower bound of `+inf` or upper bound of `-inf`
    pub(crate) fn is_valid(&self) -> bool {
        let (lower, upper) = self.bounds();
        if lower.is_nan() || upper.is_nan() {
            return false;
        }
        if let ConstraintSet::EqualTo(value) = self {
            return value.is_finite();
        }
        lower <= upper && lower != f64::INFINITY && upper != f64::NEG_INFINITY
    }
}

impl Display for ConstraintSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintSet::EqualTo(value) => write!(f, "= {value}"),
            ConstraintSet::GreaterThan(lower) => write!(f, ">= {lower}"),
            ConstraintSet::LessThan(upper) => write!(f, "<= {upper}"),
            ConstraintSet::Interval(lower, upper) => write!(f, "in [{lower}, {upper}]"),
        }
    }
}

/// A constraint holding at every support of the parameters its expression depends on
#[derive(Debug, Clone, PartialEq)]
pub struct InfiniteConstraint {
    pub name: String,
    pub expression: AffineExpr,
    pub set: ConstraintSet,
}

impl Display for InfiniteConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} {}", self.name, self.expression, self.set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_bounds() {
        assert_eq!(ConstraintSet::EqualTo(2.).bounds(), (2., 2.));
        assert_eq!(
            ConstraintSet::GreaterThan(1.).bounds(),
            (1., f64::INFINITY)
        );
        assert!(ConstraintSet::Interval(0., 1.).is_valid());
        assert!(!ConstraintSet::Interval(1., 0.).is_valid());
        assert!(!ConstraintSet::EqualTo(f64::NAN).is_valid());
        assert!(!ConstraintSet::EqualTo(f64::INFINITY).is_valid());
        assert!(!ConstraintSet::GreaterThan(f64::INFINITY).is_valid());
        assert!(!ConstraintSet::LessThan(f64::NEG_INFINITY).is_valid());
        assert!(!ConstraintSet::Interval(f64::INFINITY, f64::INFINITY).is_valid());
        assert!(ConstraintSet::GreaterThan(f64::NEG_INFINITY).is_valid());
        assert!(ConstraintSet::Interval(f64::NEG_INFINITY, 2.).is_valid());
    }

    #[test]
    fn display() {
        let cons = InfiniteConstraint {
            name: "c".to_string(),
            expression: AffineExpr::from(VariableRef(0)),
            set: ConstraintSet::LessThan(3.),
        };
        assert_eq!(cons.to_string(), "c: 1*v0 <= 3");
    }
}
