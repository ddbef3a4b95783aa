//! Decision variables of an infinite model
use derive_builder::Builder;

use crate::infinite_model::parameter::ParameterRef;

/// Reference to a variable of an [`InfiniteModel`](crate::infinite_model::InfiniteModel)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableRef(pub(crate) usize);

impl VariableRef {
    /// Position of the variable in the model
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Bounds and fixed value of a variable, all optional
///
/// # Examples
/// ```rust
/// use infopt_core::infinite_model::variable::VariableInfoBuilder;
/// let info = VariableInfoBuilder::default()
///     .lower_bound(0.)
///     .build()
///     .unwrap();
/// assert_eq!(info.upper_bound, None);
/// ```
#[derive(Builder, Debug, Clone, Copy, Default, PartialEq)]
#[builder(default)]
pub struct VariableInfo {
    #[builder(setter(strip_option))]
    pub lower_bound: Option<f64>,
    #[builder(setter(strip_option))]
    pub upper_bound: Option<f64>,
    /// Value the variable is fixed to, a fixed variable has no bounds
    #[builder(setter(strip_option))]
    pub fix: Option<f64>,
}

impl VariableInfo {
    /// Information for a variable with no bounds
    pub fn free() -> Self {
        Self::default()
    }

    /// Information for a variable with both bounds set
    pub fn bounded(lower_bound: f64, upper_bound: f64) -> Self {
        VariableInfo {
            lower_bound: Some(lower_bound),
            upper_bound: Some(upper_bound),
            fix: None,
        }
    }

    /// Check the values are finite, the bounds are ordered and not combined with a fixed value
    ///
    /// A missing bound is `None`, never an infinite value.
    pub(crate) fn is_valid(&self) -> bool {
        let values = [self.lower_bound, self.upper_bound, self.fix];
        if values.iter().flatten().any(|value| !value.is_finite()) {
            return false;
        }
        if self.fix.is_some() {
            return self.lower_bound.is_none() && self.upper_bound.is_none();
        }
        match (self.lower_bound, self.upper_bound) {
            (Some(lower), Some(upper)) => lower <= upper,
            _ => true,
        }
    }
}

/// How a variable depends on the infinite parameters
#[derive(Debug, Clone, PartialEq)]
pub enum VariableKind {
    /// A single scalar decision variable
    Finite,
    /// A function of one or more distinct infinite parameters
    Infinite { parameters: Vec<ParameterRef> },
    /// An infinite variable evaluated at one value per parameter
    Point {
        infinite: VariableRef,
        values: Vec<f64>,
    },
}

/// A variable of an infinite model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVariable {
    pub name: String,
    pub kind: VariableKind,
    pub info: VariableInfo,
}

impl ModelVariable {
    pub fn is_infinite(&self) -> bool {
        matches!(self.kind, VariableKind::Infinite { .. })
    }

    /// Parameters the variable depends on, empty for finite and point variables
    pub fn parameters(&self) -> &[ParameterRef] {
        match &self.kind {
            VariableKind::Infinite { parameters } => parameters,
            _ => &[],
        }
    }
}
