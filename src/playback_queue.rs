//! Manual play queue consulted before any automatic ordering policy.
//!
//! The queue owns the id-to-position mapping; a track's queue slot is always
//! derived from its 1-based index here, so no other component ever writes
//! queue positions.

use std::collections::{HashMap, VecDeque};

use crate::playlist::Track;
use crate::protocol::QueuePosition;

#[derive(Debug, Default)]
pub struct PlaybackQueue {
    entries: VecDeque<Track>,
    positions: HashMap<String, usize>, // track id -> 1-based slot
}

impl PlaybackQueue {
    pub fn new() -> PlaybackQueue {
        PlaybackQueue::default()
    }

    /// Appends a track to the end of the queue. Enqueueing a track that is
    /// already queued is a no-op.
    pub fn enqueue(&mut self, track: Track) {
        if self.positions.contains_key(&track.id) {
            return;
        }
        self.entries.push_back(track);
        self.renumber();
    }

    /// Pops the head of the queue and renumbers the remaining entries
    /// contiguously from 1.
    pub fn dequeue_next(&mut self) -> Option<Track> {
        let track = self.entries.pop_front()?;
        self.renumber();
        Some(track)
    }

    /// Drops any queued entries for the given track ids. Used when tracks
    /// leave their owning playlist so no dangling queue slots remain.
    pub fn purge(&mut self, ids: &[String]) {
        let before = self.entries.len();
        self.entries.retain(|track| !ids.contains(&track.id));
        if self.entries.len() != before {
            self.renumber();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 1-based slot of the given track, or `None` when it is not queued.
    pub fn position_of(&self, track_id: &str) -> Option<usize> {
        self.positions.get(track_id).copied()
    }

    /// Snapshot of all queue slots in queue order, for UI display.
    pub fn positions(&self) -> Vec<QueuePosition> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, track)| QueuePosition {
                track_id: track.id.clone(),
                position: index + 1,
            })
            .collect()
    }

    fn renumber(&mut self) {
        self.positions.clear();
        for (index, track) in self.entries.iter().enumerate() {
            self.positions.insert(track.id.clone(), index + 1);
        }
    }
}
