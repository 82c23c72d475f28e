//! Thin orchestration wrapper around `mpo_db::SpeakerRepo::merge`: the
//! repo already enforces the transaction and the ownership check at
//! the SQL level, this adds the logging/metrics the TLM applies to
//! every mutation it drives.

use mpo_db::speaker::SpeakerRepo;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::Result;

#[instrument(level = "debug", skip(repo))]
pub async fn merge_speakers(
    repo: &SpeakerRepo,
    media_file_id: Uuid,
    owner: Uuid,
    source: Uuid,
    target: Uuid,
) -> Result<()> {
    repo.merge(media_file_id, owner, source, target).await?;
    metrics::counter!("mpo_speaker_merges_total").increment(1);
    info!("✅ merged speaker {source} into {target} for media_file {media_file_id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    // `SpeakerRepo::merge`'s self-merge rejection and transactionality
    // are covered in mpo-db; this module adds no branching logic of its
    // own beyond delegating, so it has nothing further to unit test
    // without a live database.
}
