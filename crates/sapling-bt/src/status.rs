#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Externally visible result of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    #[default]
    None,
    Running,
    Success,
    Failure,
}

impl Status {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Failure)
    }

    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    /// Swaps `Success` and `Failure`; other values pass through.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            other => other,
        }
    }
}

/// Internal execution phase of a node.
///
/// Transitions only move forward through this list, except for `Done -> Entering`
/// (re-entry) and `any -> Disabling` (reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SubStatus {
    #[default]
    None,
    Enabling,
    Entering,
    Running,
    Succeeding,
    Failing,
    Exiting,
    Done,
    Disabling,
}

impl SubStatus {
    /// Stable numeric code used in trace events.
    pub fn code(self) -> u64 {
        match self {
            SubStatus::None => 0,
            SubStatus::Enabling => 1,
            SubStatus::Entering => 2,
            SubStatus::Running => 3,
            SubStatus::Succeeding => 4,
            SubStatus::Failing => 5,
            SubStatus::Exiting => 6,
            SubStatus::Done => 7,
            SubStatus::Disabling => 8,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        Some(match code {
            0 => SubStatus::None,
            1 => SubStatus::Enabling,
            2 => SubStatus::Entering,
            3 => SubStatus::Running,
            4 => SubStatus::Succeeding,
            5 => SubStatus::Failing,
            6 => SubStatus::Exiting,
            7 => SubStatus::Done,
            8 => SubStatus::Disabling,
            _ => return None,
        })
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: SubStatus) -> bool {
        use SubStatus::*;
        if next == Disabling {
            return self != None && self != Disabling;
        }
        matches!(
            (self, next),
            (None, Enabling)
                | (Enabling, Entering)
                | (Entering, Running)
                | (Running, Succeeding)
                | (Running, Failing)
                | (Succeeding, Exiting)
                | (Failing, Exiting)
                | (Exiting, Done)
                | (Done, Entering)
                | (Disabling, None)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_keeps_running_and_none() {
        assert_eq!(Status::Success.invert(), Status::Failure);
        assert_eq!(Status::Failure.invert(), Status::Success);
        assert_eq!(Status::Running.invert(), Status::Running);
        assert_eq!(Status::None.invert(), Status::None);
    }

    #[test]
    fn codes_roundtrip() {
        for code in 0..9 {
            let sub = SubStatus::from_code(code).expect("valid code");
            assert_eq!(sub.code(), code);
        }
        assert_eq!(SubStatus::from_code(9), None);
    }

    #[test]
    fn lifecycle_edges() {
        assert!(SubStatus::None.can_transition_to(SubStatus::Enabling));
        assert!(SubStatus::Done.can_transition_to(SubStatus::Entering));
        assert!(SubStatus::Running.can_transition_to(SubStatus::Disabling));
        assert!(!SubStatus::Running.can_transition_to(SubStatus::Entering));
        assert!(!SubStatus::None.can_transition_to(SubStatus::Disabling));
        assert!(!SubStatus::Done.can_transition_to(SubStatus::Running));
    }
}
