//! Prepare phase of the upload handshake: look up `(owner, content_hash)`
//! and either hand back the existing file or reserve a Pending row and
//! storage key for the upload that follows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IngestError, Result};
use crate::IngestionCoordinator;

#[derive(Debug, Clone, Deserialize)]
pub struct PrepareRequest {
    pub filename: String,
    pub file_size: i64,
    pub content_type: String,
    /// Hex-encoded content hash the client computed locally.
    pub file_hash: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PrepareResponse {
    pub file_id: Uuid,
    pub is_duplicate: bool,
}

impl IngestionCoordinator {
    /// Spec §4.5 step 1: returns the existing file unchanged if its
    /// `(owner, content_hash)` is already on record, otherwise reserves a
    /// Pending row with `storage_path = {owner}/{uuid}/original`.
    pub async fn prepare(&self, owner: Uuid, request: PrepareRequest) -> Result<PrepareResponse> {
        let content_hash = decode_hash(&request.file_hash)?;

        if let Some(existing) = self
            .media_files
            .find_by_content_hash(owner, &content_hash)
            .await?
        {
            return Ok(PrepareResponse {
                file_id: existing.id,
                is_duplicate: true,
            });
        }

        let id = Uuid::new_v4();
        let storage_path = format!("{owner}/{id}/original");
        let file = self
            .media_files
            .create_pending(
                id,
                owner,
                &request.filename,
                request.file_size,
                &request.content_type,
                &storage_path,
                &content_hash,
            )
            .await?;

        // `create_pending` returns the pre-existing row instead of `id`
        // when it lost a race against a concurrent identical prepare.
        Ok(PrepareResponse {
            file_id: file.id,
            is_duplicate: file.id != id,
        })
    }
}

pub(crate) fn decode_hash(hex: &str) -> Result<Vec<u8>> {
    hex_decode(hex).ok_or_else(|| IngestError::HashMismatch {
        claimed: hex.to_string(),
        observed: "<unparseable hex>".to_string(),
    })
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_decode_round_trips() {
        let bytes = vec![0xde, 0xad, 0xbe, 0xef];
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        assert_eq!(hex_decode(&hex).unwrap(), bytes);
    }

    #[test]
    fn hex_decode_rejects_odd_length() {
        assert!(hex_decode("abc").is_none());
    }
}
