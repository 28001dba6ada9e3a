use serde::{Deserialize, Serialize};

/// Classifier stage lifecycle. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StageState {
    #[default]
    NotStarted,
    Running,
    Stopped,
}

impl StageState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &StageState) -> bool {
        use StageState::*;

        matches!(
            (self, target),
            (NotStarted, Running) | (NotStarted, Stopped) | (Running, Stopped)
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(StageState::NotStarted.can_transition_to(&StageState::Running));
        assert!(StageState::Running.can_transition_to(&StageState::Stopped));
        assert!(StageState::NotStarted.can_transition_to(&StageState::Stopped));
    }

    #[test]
    fn test_stopped_is_terminal() {
        assert!(!StageState::Stopped.can_transition_to(&StageState::Running));
        assert!(!StageState::Stopped.can_transition_to(&StageState::NotStarted));
        assert!(!StageState::Running.can_transition_to(&StageState::NotStarted));
    }
}
