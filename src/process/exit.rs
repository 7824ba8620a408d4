//! Classification of the supervised process's exit.
//!
//! An exit caused by a signal the admin surface asked for is expected:
//! SIGKILL after a kill request, SIGQUIT after a quit request. Any other
//! unsuccessful exit is a failure.

use std::fmt;
use std::process::ExitStatus;

use crate::admin::RequestedSignal;

#[cfg(unix)]
const SIGKILL: i32 = 9;
#[cfg(unix)]
const SIGQUIT: i32 = 3;

/// How the supervised process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exited with status 0.
    Success,
    /// Terminated by a signal that was requested through the admin server.
    Requested(RequestedSignal),
    /// Any other exit.
    Failed(String),
}

impl ExitOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExitOutcome::Failed(_))
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Success => write!(f, "exited successfully"),
            ExitOutcome::Requested(signal) => write!(f, "terminated by requested {}", signal),
            ExitOutcome::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

/// Classify `status` given the last signal requested over HTTP.
pub fn classify_exit(status: ExitStatus, requested: RequestedSignal) -> ExitOutcome {
    if status.success() {
        return ExitOutcome::Success;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        let expected = match requested {
            RequestedSignal::Kill => Some(SIGKILL),
            RequestedSignal::Quit => Some(SIGQUIT),
            _ => None,
        };
        if expected.is_some() && status.signal() == expected {
            return ExitOutcome::Requested(requested);
        }
    }

    #[cfg(not(unix))]
    let _ = requested;

    ExitOutcome::Failed(format!("process {}", status))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    fn killed_by(signal: i32) -> ExitStatus {
        ExitStatus::from_raw(signal)
    }

    fn exit_code(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    #[test]
    fn success_is_success() {
        assert_eq!(
            classify_exit(exit_code(0), RequestedSignal::None),
            ExitOutcome::Success
        );
    }

    #[test]
    fn requested_kill_is_expected() {
        assert_eq!(
            classify_exit(killed_by(9), RequestedSignal::Kill),
            ExitOutcome::Requested(RequestedSignal::Kill)
        );
    }

    #[test]
    fn requested_quit_is_expected() {
        assert_eq!(
            classify_exit(killed_by(3), RequestedSignal::Quit),
            ExitOutcome::Requested(RequestedSignal::Quit)
        );
    }

    #[test]
    fn mismatched_signal_is_failure() {
        assert!(classify_exit(killed_by(9), RequestedSignal::Quit).is_failure());
        assert!(classify_exit(killed_by(3), RequestedSignal::Kill).is_failure());
        assert!(classify_exit(killed_by(1), RequestedSignal::Hangup).is_failure());
    }

    #[test]
    fn unrequested_failure() {
        let outcome = classify_exit(exit_code(1), RequestedSignal::None);
        assert!(outcome.is_failure());
        assert!(outcome.to_string().contains("exit status: 1"));
    }
}
