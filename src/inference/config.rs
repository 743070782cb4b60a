//! Configuration for the elimination entry points.

use tracing::debug;

/// What to do when the variable being eliminated has no touching factors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EmptyVariablePolicy {
    /// Return [`EliminationError::NoTouchingFactors`](crate::inference::EliminationError::NoTouchingFactors).
    #[default]
    Reject,
    /// Mark the variable eliminated without producing a conditional.
    Skip,
    /// Emit the factor family's uninformative conditional for the variable.
    Uninformative,
}

/// Elimination configuration.
///
/// # Example
///
/// ```
/// use apex_inference::inference::{EliminationConfig, EmptyVariablePolicy};
///
/// let config = EliminationConfig::new()
///     .with_empty_variable_policy(EmptyVariablePolicy::Skip)
///     .with_validate_index(true);
/// assert!(config.validate_index);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EliminationConfig {
    /// Handling of variables with no touching factors
    pub empty_variable_policy: EmptyVariablePolicy,
    /// Run a full index/graph consistency check before eliminating a range
    pub validate_index: bool,
    /// Emit a debug line per eliminated variable
    pub trace_steps: bool,
}

impl Default for EliminationConfig {
    fn default() -> Self {
        Self {
            empty_variable_policy: EmptyVariablePolicy::Reject,
            validate_index: true,
            trace_steps: false,
        }
    }
}

impl EliminationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy for variables with no touching factors
    pub fn with_empty_variable_policy(mut self, policy: EmptyVariablePolicy) -> Self {
        self.empty_variable_policy = policy;
        self
    }

    /// Enable or disable the up-front index consistency check
    pub fn with_validate_index(mut self, validate_index: bool) -> Self {
        self.validate_index = validate_index;
        self
    }

    /// Enable or disable per-step debug tracing
    pub fn with_trace_steps(mut self, trace_steps: bool) -> Self {
        self.trace_steps = trace_steps;
        self
    }

    pub fn print_configuration(&self) {
        debug!(
            "Configuration:\n  Empty variables:  {:?}\n  Validate index:   {}\n  Trace steps:      {}",
            self.empty_variable_policy,
            if self.validate_index {
                "enabled"
            } else {
                "disabled"
            },
            if self.trace_steps {
                "enabled"
            } else {
                "disabled"
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EliminationConfig::default();
        assert_eq!(config.empty_variable_policy, EmptyVariablePolicy::Reject);
        assert!(config.validate_index);
        assert!(!config.trace_steps);
        assert_eq!(config, EliminationConfig::new());
    }

    #[test]
    fn test_builder() {
        let config = EliminationConfig::new()
            .with_empty_variable_policy(EmptyVariablePolicy::Uninformative)
            .with_validate_index(false)
            .with_trace_steps(true);
        assert_eq!(
            config.empty_variable_policy,
            EmptyVariablePolicy::Uninformative
        );
        assert!(!config.validate_index);
        assert!(config.trace_steps);
    }
}
