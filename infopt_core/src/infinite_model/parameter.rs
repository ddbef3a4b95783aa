//! Infinite parameters, the continuous domains variables can depend on
use derive_builder::Builder;

/// Reference to an infinite parameter of an [`InfiniteModel`](crate::infinite_model::InfiniteModel)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterRef(pub(crate) usize);

impl ParameterRef {
    /// Position of the parameter in the model
    pub fn index(&self) -> usize {
        self.0
    }
}

/// An infinite parameter, such as time or position, over the interval
/// `[lower_bound, upper_bound]`
///
/// The model is discretized at the `supports` of its parameters. When a parameter is added to
/// a model without explicit supports, `num_supports` evenly spaced supports (or the
/// configured default number) are generated.
///
/// # Examples
/// ```rust
/// use infopt_core::infinite_model::parameter::InfiniteParameterBuilder;
/// let time = InfiniteParameterBuilder::default()
///     .name("t")
///     .lower_bound(0.)
///     .upper_bound(10.)
///     .num_supports(11)
///     .build()
///     .unwrap();
/// assert_eq!(time.generated_supports(1e-8).len(), 11);
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct InfiniteParameter {
    /// Used to identify the parameter
    #[builder(setter(into))]
    pub name: String,
    /// Lowest value of the parameter
    pub lower_bound: f64,
    /// Highest value of the parameter
    pub upper_bound: f64,
    /// Values the model is discretized at, sorted and without duplicates once in a model
    #[builder(default = "Vec::new()")]
    pub supports: Vec<f64>,
    /// Number of supports to generate when `supports` is empty
    #[builder(default = "None", setter(strip_option))]
    pub num_supports: Option<usize>,
}

impl InfiniteParameter {
    /// Is the value inside the domain of the parameter (to within `tolerance`)
    pub fn in_domain(&self, value: f64, tolerance: f64) -> bool {
        value >= self.lower_bound - tolerance && value <= self.upper_bound + tolerance
    }

    /// Supports the parameter will have once added to a model
    ///
    /// Explicit supports are sorted and de-duplicated, otherwise `num_supports` (default
    /// from the configuration) evenly spaced supports including both ends of the domain are
    /// generated. A single generated support sits at the middle of the domain.
    pub fn generated_supports(&self, tolerance: f64) -> Vec<f64> {
        if !self.supports.is_empty() {
            let mut supports = Vec::with_capacity(self.supports.len());
            for value in &self.supports {
                insert_support(&mut supports, *value, tolerance);
            }
            return supports;
        }
        let num = self
            .num_supports
            .unwrap_or_else(|| crate::configuration::current().num_supports);
        let width = self.upper_bound - self.lower_bound;
        if width <= tolerance {
            return vec![self.lower_bound];
        }
        match num {
            0 => Vec::new(),
            1 => vec![self.lower_bound + width / 2.],
            n => (0..n)
                .map(|i| self.lower_bound + width * (i as f64) / ((n - 1) as f64))
                .collect(),
        }
    }

    /// Add a support, keeping supports sorted. Returns false if an equal support (to within
    /// `tolerance`) already exists.
    pub(crate) fn add_support(&mut self, value: f64, tolerance: f64) -> bool {
        insert_support(&mut self.supports, value, tolerance)
    }

    /// Position of the support equal to `value` (to within `tolerance`)
    pub fn support_index(&self, value: f64, tolerance: f64) -> Option<usize> {
        self.supports
            .iter()
            .position(|s| (s - value).abs() <= tolerance)
    }
}

/// Insert a value into a sorted vec, unless an equal value is already present
fn insert_support(supports: &mut Vec<f64>, value: f64, tolerance: f64) -> bool {
    if supports.iter().any(|s| (s - value).abs() <= tolerance) {
        return false;
    }
    let position = supports.partition_point(|s| *s < value);
    supports.insert(position, value);
    true
}
