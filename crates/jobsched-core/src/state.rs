//! Job lifecycle state

use core::fmt;

/// State of a job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JobState {
    /// Resident in the pool, no outstanding handles are valid
    Free = 0,

    /// Allocated, being filled in by the submitter
    Configuring = 1,

    /// Published, waiting on a nonzero barrier count
    Blocked = 2,

    /// Eligible to run, in the ready queue (or being popped)
    Ready = 3,

    /// Body currently executing on a worker
    Running = 4,

    /// Body returned, completion list and successors being processed
    Retiring = 5,
}

impl JobState {
    /// Check if this state allows the job to be picked up by a worker
    #[inline]
    pub const fn is_schedulable(&self) -> bool {
        matches!(self, JobState::Ready)
    }

    /// Check if successor/completion appends are still accepted.
    ///
    /// Once a record leaves Running its lists are snapshotted and drained;
    /// appends after that point must run the callback themselves.
    #[inline]
    pub const fn accepts_appends(&self) -> bool {
        matches!(
            self,
            JobState::Configuring | JobState::Blocked | JobState::Ready | JobState::Running
        )
    }

    /// Check if barrier counts may still be added
    #[inline]
    pub const fn accepts_barriers(&self) -> bool {
        matches!(self, JobState::Configuring | JobState::Blocked)
    }
}

impl From<u8> for JobState {
    fn from(v: u8) -> Self {
        match v {
            0 => JobState::Free,
            1 => JobState::Configuring,
            2 => JobState::Blocked,
            3 => JobState::Ready,
            4 => JobState::Running,
            5 => JobState::Retiring,
            _ => JobState::Free, // Default for invalid values
        }
    }
}

impl From<JobState> for u8 {
    fn from(state: JobState) -> u8 {
        state as u8
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Free => write!(f, "free"),
            JobState::Configuring => write!(f, "configuring"),
            JobState::Blocked => write!(f, "blocked"),
            JobState::Ready => write!(f, "ready"),
            JobState::Running => write!(f, "running"),
            JobState::Retiring => write!(f, "retiring"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(JobState::Ready.is_schedulable());
        assert!(!JobState::Blocked.is_schedulable());
        assert!(!JobState::Running.is_schedulable());

        assert!(JobState::Configuring.accepts_appends());
        assert!(JobState::Running.accepts_appends());
        assert!(!JobState::Retiring.accepts_appends());
        assert!(!JobState::Free.accepts_appends());

        assert!(JobState::Configuring.accepts_barriers());
        assert!(JobState::Blocked.accepts_barriers());
        assert!(!JobState::Ready.accepts_barriers());
    }

    #[test]
    fn test_state_round_trip() {
        for s in [
            JobState::Free,
            JobState::Configuring,
            JobState::Blocked,
            JobState::Ready,
            JobState::Running,
            JobState::Retiring,
        ] {
            assert_eq!(JobState::from(u8::from(s)), s);
        }
        // Out-of-range values fall back to Free
        assert_eq!(JobState::from(200u8), JobState::Free);
    }
}
