//! Decides which track plays next or previous.
//!
//! The sequencer composes the manual play queue, the pure order policy, and
//! a snapshot of the currently visible track ordering pushed by the UI.
//! The manual queue always wins over the automatic mode; everything else is
//! index arithmetic over the snapshot.

use log::trace;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast::Sender;

use crate::order;
use crate::playback_queue::PlaybackQueue;
use crate::playlist::Track;
use crate::protocol::{self, PlaybackMode};

pub struct PlaybackSequencer {
    mode: PlaybackMode,
    queue: PlaybackQueue,
    view: Vec<Track>,
    last_played: Option<String>,
    bus_producer: Sender<protocol::Message>,
    // Use StdRng instead of ThreadRng for thread safety
    rng: StdRng,
}

impl PlaybackSequencer {
    pub fn new(bus_producer: Sender<protocol::Message>) -> PlaybackSequencer {
        // Generate a random seed
        let mut seed = [0u8; 32];
        getrandom::fill(&mut seed).expect("Failed to generate random seed");
        PlaybackSequencer::with_rng_seed(bus_producer, seed)
    }

    /// Builds a sequencer with a fixed shuffle seed, for reproducible tests.
    pub fn with_rng_seed(
        bus_producer: Sender<protocol::Message>,
        seed: [u8; 32],
    ) -> PlaybackSequencer {
        PlaybackSequencer {
            mode: PlaybackMode::Default,
            queue: PlaybackQueue::new(),
            view: Vec::new(),
            last_played: None,
            bus_producer,
            rng: StdRng::from_seed(seed),
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Changes future next/previous resolution; has no retroactive effect.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    /// Records the most recently played track and asks the UI to reveal it.
    pub fn set_last_played(&mut self, track: &Track) {
        self.last_played = Some(track.id.clone());
        let _ = self.bus_producer.send(protocol::Message::Playlist(
            protocol::PlaylistMessage::RevealTrack {
                id: track.id.clone(),
            },
        ));
    }

    /// Replaces the visible ordering snapshot that sequencing navigates.
    pub fn apply_view_snapshot(&mut self, view: Vec<Track>) {
        self.view = view;
    }

    pub fn enqueue(&mut self, track: Track) {
        self.queue.enqueue(track);
        self.broadcast_queue_changed();
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.broadcast_queue_changed();
    }

    /// Drops queue entries for tracks that left their owning playlist.
    pub fn purge_queued(&mut self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        self.queue.purge(ids);
        self.broadcast_queue_changed();
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    /// Resolves the track that plays after `current`.
    ///
    /// The manual queue always takes priority over the playback mode. With
    /// nothing loaded (`current == None`) the sequencer bootstraps from the
    /// last played track, falling back to the top of the visible ordering.
    /// A current track that is filtered out of the view yields `None`.
    pub fn next(&mut self, current: Option<&str>) -> Option<Track> {
        if let Some(track) = self.queue.dequeue_next() {
            self.broadcast_queue_changed();
            return Some(track);
        }

        let index = match current {
            None => {
                let index = self
                    .last_played
                    .as_deref()
                    .and_then(|id| self.index_of(id))
                    .unwrap_or(0);
                return self.view.get(index).cloned();
            }
            Some(id) => match self.index_of(id) {
                Some(index) => index,
                None => {
                    trace!("next: reference track {} not in visible ordering", id);
                    return None;
                }
            },
        };

        let next = order::resolve_next(index, self.view.len(), self.mode, &mut self.rng)?;
        self.view.get(next).cloned()
    }

    /// Resolves the track that plays before `current`. The manual queue is
    /// never consulted for backwards navigation.
    pub fn prev(&mut self, current: Option<&str>) -> Option<Track> {
        let index = self.index_of(current?)?;
        let prev = order::resolve_prev(index, self.view.len(), self.mode, &mut self.rng)?;
        self.view.get(prev).cloned()
    }

    fn index_of(&self, track_id: &str) -> Option<usize> {
        self.view.iter().position(|track| track.id == track_id)
    }

    fn broadcast_queue_changed(&self) {
        let _ = self.bus_producer.send(protocol::Message::Playlist(
            protocol::PlaylistMessage::QueuePositionsChanged(self.queue.positions()),
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::sync::broadcast;

    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            path: PathBuf::from(format!("/tmp/{}.mp3", id)),
        }
    }

    fn sequencer() -> PlaybackSequencer {
        let (bus_producer, _) = broadcast::channel(64);
        let mut sequencer = PlaybackSequencer::with_rng_seed(bus_producer, [3u8; 32]);
        sequencer.apply_view_snapshot(vec![track("t1"), track("t2"), track("t3")]);
        sequencer
    }

    #[test]
    fn test_queue_head_wins_over_every_mode() {
        for mode in [
            PlaybackMode::Default,
            PlaybackMode::Repeat,
            PlaybackMode::RepeatTrack,
            PlaybackMode::Shuffle,
        ] {
            let mut sequencer = sequencer();
            sequencer.set_mode(mode);
            sequencer.enqueue(track("t3"));

            let next = sequencer.next(Some("t1")).expect("queued head");
            assert_eq!(next.id, "t3");
            assert!(sequencer.queue().is_empty());
        }
    }

    #[test]
    fn test_default_mode_stops_after_last_track_until_repeat() {
        let mut sequencer = sequencer();
        assert!(sequencer.next(Some("t3")).is_none());

        sequencer.set_mode(PlaybackMode::Repeat);
        let next = sequencer.next(Some("t3")).expect("wrapped");
        assert_eq!(next.id, "t1");
    }

    #[test]
    fn test_bootstrap_prefers_last_played_then_top_of_view() {
        let mut sequencer = sequencer();
        sequencer.set_last_played(&track("t2"));
        assert_eq!(sequencer.next(None).expect("bootstrap").id, "t2");

        // Last played no longer visible: fall back to the first row.
        sequencer.apply_view_snapshot(vec![track("t3"), track("t1")]);
        assert_eq!(sequencer.next(None).expect("bootstrap").id, "t3");
    }

    #[test]
    fn test_bootstrap_on_empty_view_yields_nothing() {
        let mut sequencer = sequencer();
        sequencer.apply_view_snapshot(Vec::new());
        assert!(sequencer.next(None).is_none());
        assert!(sequencer.prev(Some("t1")).is_none());
    }

    #[test]
    fn test_filtered_out_current_track_yields_nothing() {
        let mut sequencer = sequencer();
        sequencer.apply_view_snapshot(vec![track("t1"), track("t3")]);
        assert!(sequencer.next(Some("t2")).is_none());
        assert!(sequencer.prev(Some("t2")).is_none());
    }

    #[test]
    fn test_prev_ignores_queue_and_needs_a_current_track() {
        let mut sequencer = sequencer();
        sequencer.enqueue(track("t3"));

        let prev = sequencer.prev(Some("t2")).expect("previous");
        assert_eq!(prev.id, "t1");
        // Queue untouched by backwards navigation.
        assert_eq!(sequencer.queue().len(), 1);

        assert!(sequencer.prev(None).is_none());
    }

    #[test]
    fn test_repeat_track_replays_current_in_both_directions() {
        let mut sequencer = sequencer();
        sequencer.set_mode(PlaybackMode::RepeatTrack);
        assert_eq!(sequencer.next(Some("t2")).expect("same").id, "t2");
        assert_eq!(sequencer.prev(Some("t2")).expect("same").id, "t2");
    }

    #[test]
    fn test_shuffle_always_resolves_within_view() {
        let mut sequencer = sequencer();
        sequencer.set_mode(PlaybackMode::Shuffle);
        for _ in 0..32 {
            let next = sequencer.next(Some("t1")).expect("shuffle pick");
            assert!(["t1", "t2", "t3"].contains(&next.id.as_str()));
        }
    }

    #[test]
    fn test_queue_mutations_notify_the_ui() {
        let (bus_producer, mut receiver) = broadcast::channel(64);
        let mut sequencer = PlaybackSequencer::with_rng_seed(bus_producer, [3u8; 32]);

        sequencer.enqueue(track("t1"));
        match receiver.try_recv().expect("queue notification") {
            protocol::Message::Playlist(protocol::PlaylistMessage::QueuePositionsChanged(
                positions,
            )) => {
                assert_eq!(positions.len(), 1);
                assert_eq!(positions[0].track_id, "t1");
                assert_eq!(positions[0].position, 1);
            }
            other => panic!("unexpected message: {:?}", other),
        }

        sequencer.clear_queue();
        match receiver.try_recv().expect("queue notification") {
            protocol::Message::Playlist(protocol::PlaylistMessage::QueuePositionsChanged(
                positions,
            )) => assert!(positions.is_empty()),
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
