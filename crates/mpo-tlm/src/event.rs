//! The per-file state machine as an explicit `match` over
//! `(FileStatus, Event)`, per spec §4.8's transition diagram. This
//! module decides the *next logical status*; the actual compare-and-
//! swap against the row lives in `mpo_db::MediaFileRepo` and enforces
//! the same rule at the SQL level so a concurrent writer can't race
//! past it.

use mpo_common::{FailureKind, FileStatus};

/// Something that happened to a file's active task, driving a
/// transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Submitted,
    Dispatched,
    StageSucceeded,
    StageFailed(FailureKind),
    CancelRequested,
    CancelConfirmed,
    StaleDetected,
    OperatorRecovery,
}

/// Outcome of applying an `Event` to a `FileStatus`: either a legal
/// next state plus whether a retry should be scheduled, or a rejection
/// the caller must not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    To(FileStatus),
    /// `StageFailed` with `TransientInfra` under the retry budget:
    /// caller re-enqueues after `Backoff::delay(attempt)` rather than
    /// leaving the file in `Error`.
    RetryTo(FileStatus),
    Rejected,
}

/// Applies `event` to `current`, given whether the file's `retry_count`
/// is still under `max_retries`. Pure function with no I/O, so the
/// legal-transition table can be exhaustively unit tested without a
/// database.
pub fn apply(current: FileStatus, event: Event, retries_remaining: bool) -> Transition {
    use Event::*;
    use FileStatus::*;

    match (current, event) {
        (Pending, Dispatched) => Transition::To(Processing),

        (Processing, StageSucceeded) => Transition::To(Completed),

        (Processing, StageFailed(FailureKind::TransientInfra)) if retries_remaining => {
            Transition::RetryTo(Pending)
        }
        (Processing, StageFailed(_)) => Transition::To(Error),

        (Processing, CancelRequested) => Transition::To(Cancelling),
        (Cancelling, CancelConfirmed) => Transition::To(Cancelled),
        // The running stage may still finish or fail after cancellation
        // was requested but before it observed the flag; both outcomes
        // are legal from Cancelling.
        (Cancelling, StageSucceeded) => Transition::To(Completed),
        (Cancelling, StageFailed(_)) => Transition::To(Cancelled),

        (Processing, StaleDetected) => Transition::To(Orphaned),
        (Orphaned, OperatorRecovery) => Transition::To(Pending),

        (Error, Dispatched) => Transition::To(Processing),

        (Completed, Dispatched) => Transition::To(Processing),

        _ => Transition::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_to_processing_on_dispatch() {
        assert_eq!(
            apply(FileStatus::Pending, Event::Dispatched, true),
            Transition::To(FileStatus::Processing)
        );
    }

    #[test]
    fn transient_failure_under_budget_retries_to_pending() {
        assert_eq!(
            apply(
                FileStatus::Processing,
                Event::StageFailed(FailureKind::TransientInfra),
                true
            ),
            Transition::RetryTo(FileStatus::Pending)
        );
    }

    #[test]
    fn transient_failure_over_budget_is_terminal() {
        assert_eq!(
            apply(
                FileStatus::Processing,
                Event::StageFailed(FailureKind::TransientInfra),
                false
            ),
            Transition::To(FileStatus::Error)
        );
    }

    #[test]
    fn input_quality_failure_is_always_terminal_even_with_budget() {
        assert_eq!(
            apply(
                FileStatus::Processing,
                Event::StageFailed(FailureKind::InputQuality),
                true
            ),
            Transition::To(FileStatus::Error)
        );
    }

    #[test]
    fn cancel_request_moves_processing_to_cancelling_without_preemption() {
        assert_eq!(
            apply(FileStatus::Processing, Event::CancelRequested, true),
            Transition::To(FileStatus::Cancelling)
        );
    }

    #[test]
    fn cancelling_confirms_to_cancelled() {
        assert_eq!(
            apply(FileStatus::Cancelling, Event::CancelConfirmed, true),
            Transition::To(FileStatus::Cancelled)
        );
    }

    #[test]
    fn cancelling_stage_can_still_complete_before_observing_flag() {
        assert_eq!(
            apply(FileStatus::Cancelling, Event::StageSucceeded, true),
            Transition::To(FileStatus::Completed)
        );
    }

    #[test]
    fn stale_processing_becomes_orphaned() {
        assert_eq!(
            apply(FileStatus::Processing, Event::StaleDetected, true),
            Transition::To(FileStatus::Orphaned)
        );
    }

    #[test]
    fn orphaned_recovers_to_pending() {
        assert_eq!(
            apply(FileStatus::Orphaned, Event::OperatorRecovery, true),
            Transition::To(FileStatus::Pending)
        );
    }

    #[test]
    fn completed_files_cannot_be_cancelled() {
        assert_eq!(
            apply(FileStatus::Completed, Event::CancelRequested, true),
            Transition::Rejected
        );
    }

    #[test]
    fn cancelled_is_terminal_for_every_event() {
        for event in [
            Event::Submitted,
            Event::Dispatched,
            Event::StageSucceeded,
            Event::StageFailed(FailureKind::TransientInfra),
            Event::CancelRequested,
            Event::CancelConfirmed,
            Event::StaleDetected,
            Event::OperatorRecovery,
        ] {
            assert_eq!(
                apply(FileStatus::Cancelled, event, true),
                Transition::Rejected
            );
        }
    }
}
