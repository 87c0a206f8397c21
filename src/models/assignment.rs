use serde::{Deserialize, Serialize};

/// A knowledge-base variable together with its value domain.
///
/// The constraint model owns the authoritative variable list; strategies only
/// ever read it. The domain order is the order values are drawn in.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Variable {
    pub(crate) name: String,
    pub(crate) domain: Vec<String>,
}

impl Variable {
    pub fn new(name: &str, domain: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            domain,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }
}

/// A single `variable=value` preference inside a requirement.
///
/// Assignments are compared by their canonical string form, which is also how
/// they are matched against conflict-set constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub(crate) variable: String,
    pub(crate) value: String,
}

impl Assignment {
    pub fn new(variable: &str, value: &str) -> Self {
        Self {
            variable: variable.to_string(),
            value: value.to_string(),
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Compares the canonical `variable=value` form against a raw constraint
    /// string without allocating.
    pub(crate) fn matches_str(&self, canonical: &str) -> bool {
        canonical
            .strip_prefix(self.variable.as_str())
            .and_then(|rest| rest.strip_prefix('='))
            .is_some_and(|value| value == self.value)
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.variable, self.value)
    }
}
