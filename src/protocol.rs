//! Event-bus protocol shared by all runtime components.
//!
//! This module defines the message payloads exchanged between the sequencing
//! engine, the external player, and the UI layer.

use std::path::PathBuf;

/// Track traversal strategy for next/previous operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    #[default]
    Default, // Play tracks in order, stop after the last one
    Repeat,      // Play tracks in order, wrap back to the beginning
    RepeatTrack, // Replay the same track
    Shuffle,     // Pick a uniform-random track each step
}

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Playlist(PlaylistMessage),
    Playback(PlaybackMessage),
}

/// Playlist-domain commands and notifications.
#[derive(Debug, Clone)]
pub enum PlaylistMessage {
    /// UI requested a new track at the end of the current playlist.
    AddTrack {
        path: PathBuf,
    },
    TrackAdded {
        id: String,
        path: PathBuf,
    },
    /// UI requested removal of tracks from the current playlist.
    RemoveTracks {
        ids: Vec<String>,
    },
    /// UI requested a track be appended to the manual play queue.
    Enqueue {
        id: String,
    },
    ClearQueue,
    /// Emitted after any queue mutation so the UI can re-render positions.
    QueuePositionsChanged(Vec<QueuePosition>),
    /// UI pushed the currently visible (filtered/sorted) track ordering.
    /// Sequencing navigates this snapshot, never raw storage order.
    ApplyViewSnapshot(Vec<String>),
    /// UI cleared its filter; sequencing falls back to playlist order.
    ClearViewSnapshot,
    ChangePlaybackMode(PlaybackMode),
    PlaybackModeChanged(PlaybackMode),
    CreatePlaylist {
        name: String,
    },
    RenamePlaylist {
        id: String,
        name: String,
    },
    DeletePlaylist {
        id: String,
    },
    MovePlaylist {
        from: usize,
        to: usize,
    },
    SwitchPlaylist {
        id: String,
    },
    SwitchPlaylistByIndex(usize),
    /// Full playlist set restored from storage at startup.
    PlaylistsRestored(Vec<PlaylistInfo>),
    /// Tracks of the now-current playlist restored from storage.
    PlaylistRestored(Vec<StoredTrack>),
    /// Playlist set changed after an add/rename/delete/move edit.
    PlaylistsChanged(Vec<PlaylistInfo>),
    ActivePlaylistChanged(String),
    /// Asks the UI to scroll to and select the given track row.
    RevealTrack {
        id: String,
    },
    SaveAll,
}

/// Playback-domain commands and notifications.
#[derive(Debug, Clone)]
pub enum PlaybackMessage {
    Next,
    Previous,
    /// Player reached the end of the given track.
    TrackFinished(String),
    /// Player opened the given track.
    TrackStarted(String),
    /// Engine resolved the track the player should load next.
    StartTrack(StoredTrack),
    Stop,
}

/// Minimal track row restored from storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct StoredTrack {
    /// Stable track id.
    pub id: String,
    /// File path on disk.
    pub path: PathBuf,
}

/// Minimal playlist metadata restored from storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct PlaylistInfo {
    /// Stable playlist id.
    pub id: String,
    /// User-visible name.
    pub name: String,
    /// Persisted slot among sibling playlists.
    pub position: usize,
}

/// Current 1-based slot of one queued track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePosition {
    pub track_id: String,
    pub position: usize,
}
