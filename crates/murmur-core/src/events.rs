use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Backend transcription events consumed by the overlay.
///
/// The transport is opaque here: events arrive over a channel the host wires
/// up. Payload field names mirror the backend's JSON wire shape, so a raw
/// event value deserializes directly into the matching variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TranscriptEvent {
    /// A partial or ring-buffer-sourced span of speech. Spans may repeat or
    /// overlap; ordering across chunks is not guaranteed.
    #[serde(rename_all = "camelCase")]
    Chunk {
        id: u64,
        text: String,
        timestamp: Timestamp,
        is_partial: bool,
    },

    /// One full utterance, emitted when a transcript is finalized. Additional
    /// backend fields (database id, metadata) are ignored by this core.
    #[serde(rename_all = "camelCase")]
    Final {
        text: String,
        #[serde(default)]
        duration_ms: Option<u64>,
    },
}

impl TranscriptEvent {
    /// The backend channel this event class arrives on.
    pub fn event_name(&self) -> &'static str {
        match self {
            TranscriptEvent::Chunk { .. } => "transcription-chunk",
            TranscriptEvent::Final { .. } => "transcript-created",
        }
    }

    /// The speech text carried by the event.
    pub fn text(&self) -> &str {
        match self {
            TranscriptEvent::Chunk { text, .. } => text,
            TranscriptEvent::Final { text, .. } => text,
        }
    }
}
