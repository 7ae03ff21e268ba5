//! Pure next/previous index resolution over a visible track ordering.
//!
//! Given the index of the reference track within the visible ordering and
//! the ordering's length, these functions decide which index plays next or
//! previous under the active playback mode. They never touch playlist state;
//! shuffle randomness comes from the caller-supplied RNG so sequencing stays
//! reproducible under test.

use rand::{Rng, RngExt};

use crate::protocol::PlaybackMode;

/// Resolves the index that plays after `index`. `None` means "no next track".
pub fn resolve_next<R: Rng>(
    index: usize,
    size: usize,
    mode: PlaybackMode,
    rng: &mut R,
) -> Option<usize> {
    if size == 0 {
        return None;
    }

    match mode {
        PlaybackMode::Default => (index + 1 < size).then_some(index + 1),
        PlaybackMode::Repeat => Some((index + 1) % size),
        PlaybackMode::RepeatTrack => Some(index),
        PlaybackMode::Shuffle => Some(rng.random_range(0..size)),
    }
}

/// Resolves the index that plays before `index`. `None` means "no previous track".
pub fn resolve_prev<R: Rng>(
    index: usize,
    size: usize,
    mode: PlaybackMode,
    rng: &mut R,
) -> Option<usize> {
    if size == 0 {
        return None;
    }

    match mode {
        PlaybackMode::Default => (index > 0).then(|| index - 1),
        PlaybackMode::Repeat => Some((index + size - 1) % size),
        PlaybackMode::RepeatTrack => Some(index),
        PlaybackMode::Shuffle => Some(rng.random_range(0..size)),
    }
}
