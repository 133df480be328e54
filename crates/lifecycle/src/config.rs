//! Options recognised by the lifecycle coordinator.

use std::str::FromStr;

use domain::{OrderError, OrderStatus};

/// How status changes requested by an update are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Any enumerated status may follow any other.
    #[default]
    Permissive,

    /// Only the transitions allowed by [`OrderStatus::can_transition_to`].
    Strict,
}

impl StatusPolicy {
    /// Checks a status change against this policy.
    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        match self {
            StatusPolicy::Permissive => Ok(()),
            StatusPolicy::Strict if from.can_transition_to(to) => Ok(()),
            StatusPolicy::Strict => Err(OrderError::InvalidTransition { from, to }),
        }
    }
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(StatusPolicy::Permissive),
            "strict" => Ok(StatusPolicy::Strict),
            other => Err(format!("unknown status policy: {other}")),
        }
    }
}

/// Lifecycle coordinator configuration.
#[derive(Debug, Clone, Default)]
pub struct LifecycleConfig {
    pub status_policy: StatusPolicy,
}

impl LifecycleConfig {
    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }
}
