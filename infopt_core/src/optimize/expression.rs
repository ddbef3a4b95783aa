//! Linear expressions over the variables of an optimization problem
use indexmap::IndexMap;

use crate::optimize::variable::VariableIndex;

/// A linear expression `sum(coefficient * variable) + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    /// Coefficient of each variable, variables appear at most once
    pub terms: IndexMap<VariableIndex, f64>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an expression with only a constant
    pub fn constant(constant: f64) -> Self {
        LinearExpr {
            terms: IndexMap::new(),
            constant,
        }
    }

    /// Add `coefficient * variable` to the expression, merging with an existing term
    pub fn add_term(&mut self, variable: VariableIndex, coefficient: f64) {
        *self.terms.entry(variable).or_insert(0.0) += coefficient;
    }

    /// Add `scale * other` to the expression
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: f64) {
        for (var, coef) in &other.terms {
            self.add_term(*var, coef * scale);
        }
        self.constant += other.constant * scale;
    }

    /// Evaluate the expression, with `values` indexed by variable position
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values[var.0])
            .sum::<f64>()
            + self.constant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_terms() {
        let mut expr = LinearExpr::constant(1.0);
        expr.add_term(VariableIndex(1), 2.0);
        expr.add_term(VariableIndex(1), 0.5);
        let mut other = LinearExpr::constant(2.0);
        other.add_term(VariableIndex(0), 1.0);
        other.add_term(VariableIndex(1), 1.0);
        expr.add_scaled(&other, 2.0);

        assert_eq!(expr.terms.len(), 2);
        assert!((expr.terms[&VariableIndex(1)] - 4.5).abs() < 1e-12);
        assert!((expr.terms[&VariableIndex(0)] - 2.0).abs() < 1e-12);
        assert!((expr.constant - 5.0).abs() < 1e-12);
        assert!((expr.evaluate(&[1.0, 2.0]) - 16.0).abs() < 1e-12);
    }
}
