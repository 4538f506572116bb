//! Per-call session state.
//!
//! One [`CallSession`] exists per active telephony call, exclusively owned
//! by its session relay. It tracks playback position so that a barge-in can
//! truncate the backend's record of the response to what the caller really
//! heard, and it keeps the FIFO of outstanding playback checkpoints (marks).
//!
//! This is a pure state machine: no I/O, all transitions synchronous. The
//! relay applies events from both connections to it one at a time, so no
//! locking is needed.

use std::collections::VecDeque;

/// State carried for one telephony call.
#[derive(Debug, Default)]
pub struct CallSession {
    /// Stream identifier assigned by the telephony provider on stream start
    stream_sid: Option<String>,
    /// Milliseconds since stream start, updated only by inbound media frames
    latest_media_timestamp: u64,
    /// Outstanding playback checkpoint tokens, FIFO
    pending_marks: VecDeque<String>,
    /// Identifier of the AI response currently being played to the caller
    active_item_id: Option<String>,
    /// `latest_media_timestamp` at the moment the first chunk of the current
    /// response was forwarded
    response_start_timestamp: Option<u64>,
}

/// What an interruption requires of the two connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interruption {
    /// Stream to send the `clear` frame to
    pub stream_sid: String,
    /// Truncation to send to the backend, when a response item was active
    pub truncation: Option<Truncation>,
}

/// Truncate an interrupted response item at the heard offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    /// The interrupted response item
    pub item_id: String,
    /// Audio cutoff offset: how much of the response was actually played
    pub audio_end_ms: u64,
}

impl CallSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    pub fn latest_media_timestamp(&self) -> u64 {
        self.latest_media_timestamp
    }

    pub fn pending_mark_count(&self) -> usize {
        self.pending_marks.len()
    }

    pub fn active_item_id(&self) -> Option<&str> {
        self.active_item_id.as_deref()
    }

    pub fn response_start_timestamp(&self) -> Option<u64> {
        self.response_start_timestamp
    }

    /// Begin a fresh stream epoch.
    ///
    /// Resets the media clock to zero and clears the response fields
    /// (`response_start_timestamp` set implies `active_item_id` may be set,
    /// so both go together). Marks queued in the old epoch will never be
    /// acknowledged, so the queue is cleared too.
    pub fn start_stream(&mut self, stream_sid: String) {
        self.stream_sid = Some(stream_sid);
        self.latest_media_timestamp = 0;
        self.response_start_timestamp = None;
        self.active_item_id = None;
        self.pending_marks.clear();
    }

    /// Record the timestamp of an inbound media frame.
    ///
    /// Timestamps are assumed non-decreasing; an out-of-order frame moves
    /// the clock backward, a known limitation.
    pub fn observe_media_timestamp(&mut self, timestamp: u64) {
        self.latest_media_timestamp = timestamp;
    }

    /// Account for one forwarded audio chunk of a backend response.
    ///
    /// The first chunk of a response pins `response_start_timestamp` to the
    /// current media clock; every chunk records the item as active.
    pub fn begin_response_chunk(&mut self, item_id: String) {
        if self.response_start_timestamp.is_none() {
            self.response_start_timestamp = Some(self.latest_media_timestamp);
        }
        self.active_item_id = Some(item_id);
    }

    /// Push one outstanding playback checkpoint token.
    pub fn push_mark(&mut self, label: &str) {
        self.pending_marks.push_back(label.to_string());
    }

    /// Acknowledge one playback checkpoint, FIFO. No-op when none are
    /// outstanding.
    ///
    /// Draining the queue means every forwarded chunk has finished playing,
    /// so the response is fully consumed and its fields reset.
    pub fn ack_mark(&mut self) -> Option<String> {
        let acked = self.pending_marks.pop_front();
        if acked.is_some() && self.pending_marks.is_empty() {
            self.active_item_id = None;
            self.response_start_timestamp = None;
        }
        acked
    }

    /// Run the barge-in procedure.
    ///
    /// Preconditions: at least one mark outstanding and a response start
    /// timestamp recorded (and, by construction, a known stream). When they
    /// do not hold this is a no-op returning `None`, which makes repeated
    /// speech-started events idempotent once state is cleared.
    pub fn interrupt(&mut self) -> Option<Interruption> {
        if self.pending_marks.is_empty() {
            return None;
        }
        let start = self.response_start_timestamp?;
        let stream_sid = self.stream_sid.clone()?;

        // Monotonic within a stream epoch, so never negative
        let elapsed = self.latest_media_timestamp.saturating_sub(start);
        let truncation = self.active_item_id.take().map(|item_id| Truncation {
            item_id,
            audio_end_ms: elapsed,
        });

        self.pending_marks.clear();
        self.response_start_timestamp = None;

        Some(Interruption {
            stream_sid,
            truncation,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
