//! The three periodic sweeps from spec §4.10, each scanning
//! `mpo_db::media_file::MediaFileRepo` for rows stuck past a
//! configured threshold and driving the matching transition through
//! `mpo-tlm`.

use chrono::Utc;
use mpo_common::NotificationEvent;
use mpo_db::media_file::MediaFileRepo;
use mpo_tlm::TaskLifecycleManager;
use tracing::{info, instrument, warn};

use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct SweepThresholds {
    pub stale_pending_after_secs: u64,
    pub stall_deadline_secs: u64,
    pub cancel_deadline_secs: u64,
}

/// Outcome of one sweep pass, returned so the caller can log/emit
/// `recovery_suggested` without the sweep functions depending on the
/// notification transport directly.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub orphaned: Vec<uuid::Uuid>,
    pub stale_pending_deleted: Vec<uuid::Uuid>,
    pub cancel_timed_out: Vec<uuid::Uuid>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.orphaned.is_empty()
            && self.stale_pending_deleted.is_empty()
            && self.cancel_timed_out.is_empty()
    }

    /// One `recovery_suggested` event per affected owner, per spec
    /// §4.10; callers group by owner before publishing since this
    /// report only tracks file ids.
    pub fn recovery_notification(&self) -> Option<NotificationEvent> {
        if self.orphaned.is_empty() {
            return None;
        }
        Some(NotificationEvent::new(
            mpo_common::NotificationKind::RecoverySuggested,
            serde_json::json!({ "file_ids": self.orphaned }),
        ))
    }
}

/// Marks rows stuck in `Processing` with a stale `task_last_update` as
/// `Orphaned`. A file that another worker just heartbeated between the
/// scan and the write loses the CAS and is silently skipped -- not
/// double-counted as an error, since that's an expected race.
#[instrument(level = "debug", skip(media_files))]
pub async fn sweep_stalled(
    media_files: &MediaFileRepo,
    thresholds: SweepThresholds,
) -> Result<Vec<uuid::Uuid>> {
    let cutoff = Utc::now() - chrono::Duration::seconds(thresholds.stall_deadline_secs as i64);
    let stale = media_files.find_stale_processing(cutoff).await?;

    let mut orphaned = Vec::new();
    for file in stale {
        match media_files.mark_orphaned(file.id).await {
            Ok(row) => {
                metrics::counter!("mpo_reaper_orphaned_total").increment(1);
                info!("✅ marked media_file {} orphaned (stalled)", row.id);
                orphaned.push(row.id);
            }
            Err(e) => warn!("⚠️ failed to orphan media_file {}: {e}", file.id),
        }
    }
    Ok(orphaned)
}

/// Deletes rows stuck in `Pending` past `stale_pending_after_secs` with
/// no completed upload -- these never got a blob, so there's nothing
/// for the safe-delete path's blob/index steps to clean up.
#[instrument(level = "debug", skip(media_files))]
pub async fn sweep_stale_pending(
    media_files: &MediaFileRepo,
    thresholds: SweepThresholds,
) -> Result<Vec<uuid::Uuid>> {
    let cutoff =
        Utc::now() - chrono::Duration::seconds(thresholds.stale_pending_after_secs as i64);
    let stale = media_files.find_stale_pending(cutoff).await?;

    let mut deleted = Vec::new();
    for file in stale {
        match media_files.delete(file.id).await {
            Ok(true) => {
                metrics::counter!("mpo_reaper_stale_pending_deleted_total").increment(1);
                info!("✅ deleted stale pending media_file {}", file.id);
                deleted.push(file.id);
            }
            Ok(false) => warn!("⚠️ stale pending media_file {} was not safe to delete", file.id),
            Err(e) => warn!("⚠️ failed to delete stale pending media_file {}: {e}", file.id),
        }
    }
    Ok(deleted)
}

/// Moves rows stuck in `Cancelling` past the cancellation deadline to
/// `Cancelled`, setting `force_delete_eligible`. The deadline itself is
/// `mpo-tlm`'s to judge (`TaskLifecycleManager::cancel_timed_out`); this
/// sweep only supplies the periodic scan.
#[instrument(level = "debug", skip(media_files, tlm))]
pub async fn sweep_cancel_timeouts(
    media_files: &MediaFileRepo,
    tlm: &TaskLifecycleManager,
    thresholds: SweepThresholds,
) -> Result<Vec<uuid::Uuid>> {
    let cutoff = Utc::now() - chrono::Duration::seconds(thresholds.cancel_deadline_secs as i64);
    let cancelling = media_files.find_stale_cancelling(cutoff).await?;

    let mut timed_out = Vec::new();
    for file in cancelling {
        let deadline = std::time::Duration::from_secs(thresholds.cancel_deadline_secs);
        if !tlm.cancel_timed_out(file.task_last_update.unwrap_or(file.upload_time), deadline) {
            continue;
        }
        match tlm.confirm_cancel(file.id).await {
            Ok(row) => {
                metrics::counter!("mpo_reaper_cancel_timeouts_total").increment(1);
                info!("✅ timed out cancellation for media_file {}", row.id);
                timed_out.push(row.id);
            }
            Err(e) => warn!("⚠️ failed to confirm cancel for media_file {}: {e}", file.id),
        }
    }
    Ok(timed_out)
}

/// Runs all three sweeps in sequence and assembles the combined report.
#[instrument(level = "debug", skip(media_files, tlm))]
pub async fn run_all(
    media_files: &MediaFileRepo,
    tlm: &TaskLifecycleManager,
    thresholds: SweepThresholds,
) -> Result<SweepReport> {
    let orphaned = sweep_stalled(media_files, thresholds).await?;
    let stale_pending_deleted = sweep_stale_pending(media_files, thresholds).await?;
    let cancel_timed_out = sweep_cancel_timeouts(media_files, tlm, thresholds).await?;

    Ok(SweepReport {
        orphaned,
        stale_pending_deleted,
        cancel_timed_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_has_no_recovery_notification() {
        let report = SweepReport::default();
        assert!(report.is_empty());
        assert!(report.recovery_notification().is_none());
    }

    #[test]
    fn orphaned_files_produce_a_recovery_suggested_event() {
        let report = SweepReport {
            orphaned: vec![uuid::Uuid::new_v4()],
            ..Default::default()
        };
        let event = report.recovery_notification().unwrap();
        assert_eq!(event.kind, mpo_common::NotificationKind::RecoverySuggested);
    }
}
