//! Bus-driven runtime that ties sequencing, playlist management, and
//! persistence together.
//!
//! The engine consumes commands from the broadcast bus, mutates the playlist
//! manager and sequencer, and publishes notifications back onto the same bus.
//! The player and UI never call into the engine directly.

use std::path::PathBuf;

use log::{debug, error, info, trace};
use tokio::sync::broadcast::{Receiver, Sender};

use crate::config::{self, Config};
use crate::db_manager::DbManager;
use crate::playlist_manager::PlaylistManager;
use crate::protocol::{self, StoredTrack};
use crate::sequencer::PlaybackSequencer;

pub struct SequencerEngine {
    manager: PlaylistManager,
    sequencer: PlaybackSequencer,
    config: Config,
    config_path: Option<PathBuf>,
    bus_consumer: Receiver<protocol::Message>,
    bus_producer: Sender<protocol::Message>,
    now_playing: Option<String>,
}

impl SequencerEngine {
    pub fn new(
        bus_consumer: Receiver<protocol::Message>,
        bus_producer: Sender<protocol::Message>,
        db_manager: DbManager,
        config: Config,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            manager: PlaylistManager::new(db_manager),
            sequencer: PlaybackSequencer::new(bus_producer.clone()),
            config,
            config_path,
            bus_consumer,
            bus_producer,
            now_playing: None,
        }
    }

    pub fn run(&mut self) {
        self.restore();

        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(message) => self.handle_message(message),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("SequencerEngine: lagged, skipped {} messages", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    error!("SequencerEngine: bus closed");
                    break;
                }
            }
        }
    }

    /// Restores playlists and session state from storage and announces the
    /// restored world to the UI.
    fn restore(&mut self) {
        if let Err(e) = self.manager.load(&self.config) {
            error!("Failed to restore playlists from database: {}", e);
        }
        self.sequencer.set_mode(self.config.playback_mode);

        info!(
            "Restored {} playlists, mode {:?}",
            self.manager.playlists().len(),
            self.config.playback_mode
        );

        let _ = self.bus_producer.send(protocol::Message::Playlist(
            protocol::PlaylistMessage::PlaylistsRestored(self.manager.infos()),
        ));
        let _ = self.bus_producer.send(protocol::Message::Playlist(
            protocol::PlaylistMessage::PlaybackModeChanged(self.config.playback_mode),
        ));
        self.broadcast_active();
        self.refresh_view();
    }

    fn handle_message(&mut self, message: protocol::Message) {
        match message {
            protocol::Message::Playlist(message) => self.handle_playlist_message(message),
            protocol::Message::Playback(message) => self.handle_playback_message(message),
        }
    }

    fn handle_playlist_message(&mut self, message: protocol::PlaylistMessage) {
        match message {
            protocol::PlaylistMessage::AddTrack { path } => {
                debug!("SequencerEngine: adding track {:?}", path);
                match self.manager.add_track_to_current(path) {
                    Ok(Some(track)) => {
                        let _ = self.bus_producer.send(protocol::Message::Playlist(
                            protocol::PlaylistMessage::TrackAdded {
                                id: track.id,
                                path: track.path,
                            },
                        ));
                        self.refresh_view();
                    }
                    Ok(None) => debug!("AddTrack ignored, no current playlist"),
                    Err(e) => error!("Failed to save track to database: {}", e),
                }
            }
            protocol::PlaylistMessage::RemoveTracks { ids } => {
                match self.manager.remove_tracks_from_current(&ids) {
                    Ok(removed) => {
                        self.sequencer.purge_queued(&removed);
                        self.refresh_view();
                    }
                    Err(e) => error!("Failed to remove tracks: {}", e),
                }
            }
            protocol::PlaylistMessage::Enqueue { id } => {
                let track = self
                    .manager
                    .current()
                    .and_then(|playlist| playlist.find_track(&id))
                    .cloned();
                match track {
                    Some(track) => self.sequencer.enqueue(track),
                    None => debug!("Enqueue ignored, {} not in current playlist", id),
                }
            }
            protocol::PlaylistMessage::ClearQueue => {
                self.sequencer.clear_queue();
            }
            protocol::PlaylistMessage::ApplyViewSnapshot(ids) => {
                let Some(playlist) = self.manager.current() else {
                    return;
                };
                let view = ids
                    .iter()
                    .filter_map(|id| playlist.find_track(id))
                    .cloned()
                    .collect();
                self.sequencer.apply_view_snapshot(view);
            }
            protocol::PlaylistMessage::ClearViewSnapshot => {
                self.refresh_view();
            }
            protocol::PlaylistMessage::ChangePlaybackMode(mode) => {
                debug!("SequencerEngine: playback mode -> {:?}", mode);
                self.sequencer.set_mode(mode);
                self.config.playback_mode = mode;
                let _ = self.bus_producer.send(protocol::Message::Playlist(
                    protocol::PlaylistMessage::PlaybackModeChanged(mode),
                ));
            }
            protocol::PlaylistMessage::CreatePlaylist { name } => {
                match self.manager.add(&name) {
                    Ok(playlist) => info!("Created playlist {:?} ({})", name, playlist.id()),
                    Err(e) => error!("Failed to create playlist: {}", e),
                }
                self.broadcast_playlists_changed();
            }
            protocol::PlaylistMessage::RenamePlaylist { id, name } => {
                if let Err(e) = self.manager.rename(&id, &name) {
                    error!("Failed to rename playlist: {}", e);
                }
                self.broadcast_playlists_changed();
            }
            protocol::PlaylistMessage::DeletePlaylist { id } => {
                let was_current = self.manager.current().map(|p| p.id() == id) == Some(true);
                match self.manager.remove(&id) {
                    Ok(removed) => self.sequencer.purge_queued(&removed),
                    Err(e) => error!("Failed to delete playlist: {}", e),
                }
                self.broadcast_playlists_changed();
                if was_current {
                    self.broadcast_active();
                    self.refresh_view();
                }
            }
            protocol::PlaylistMessage::MovePlaylist { from, to } => {
                self.manager.move_playlist(from, to);
                self.broadcast_playlists_changed();
            }
            protocol::PlaylistMessage::SwitchPlaylist { id } => {
                if self.manager.select(&id) {
                    self.broadcast_active();
                    self.refresh_view();
                } else {
                    debug!("SwitchPlaylist ignored, unknown playlist {}", id);
                }
            }
            protocol::PlaylistMessage::SwitchPlaylistByIndex(index) => {
                let id = self.manager.get(index).map(|playlist| playlist.id().to_string());
                match id {
                    Some(id) => {
                        self.manager.select(&id);
                        self.broadcast_active();
                        self.refresh_view();
                    }
                    None => debug!("SwitchPlaylistByIndex ignored, index {} out of bounds", index),
                }
            }
            protocol::PlaylistMessage::SaveAll => {
                if let Err(e) = self.manager.save_all(&mut self.config) {
                    error!("Failed to save playlists: {}", e);
                }
                if let Some(path) = &self.config_path {
                    if let Err(e) = config::save_to(path, &self.config) {
                        error!("Failed to save config to {:?}: {}", path, e);
                    }
                }
            }
            _ => trace!("SequencerEngine: ignoring playlist notification"),
        }
    }

    fn handle_playback_message(&mut self, message: protocol::PlaybackMessage) {
        match message {
            protocol::PlaybackMessage::Next => {
                let current = self.now_playing.clone();
                match self.sequencer.next(current.as_deref()) {
                    Some(track) => self.start_track(track.id, track.path),
                    None => self.stop(),
                }
            }
            protocol::PlaybackMessage::Previous => {
                let current = self.now_playing.clone();
                // No previous track is not a stop condition; playback simply
                // continues on the current track.
                if let Some(track) = self.sequencer.prev(current.as_deref()) {
                    self.start_track(track.id, track.path);
                }
            }
            protocol::PlaybackMessage::TrackFinished(id) => {
                match self.sequencer.next(Some(&id)) {
                    Some(track) => self.start_track(track.id, track.path),
                    None => self.stop(),
                }
            }
            protocol::PlaybackMessage::TrackStarted(id) => {
                self.now_playing = Some(id.clone());
                let track = self
                    .manager
                    .playlists()
                    .iter()
                    .find_map(|playlist| playlist.find_track(&id))
                    .cloned();
                if let Some(track) = track {
                    self.sequencer.set_last_played(&track);
                }
            }
            _ => trace!("SequencerEngine: ignoring playback notification"),
        }
    }

    fn start_track(&self, id: String, path: PathBuf) {
        debug!("SequencerEngine: starting track {}", id);
        let _ = self.bus_producer.send(protocol::Message::Playback(
            protocol::PlaybackMessage::StartTrack(StoredTrack { id, path }),
        ));
    }

    fn stop(&mut self) {
        debug!("SequencerEngine: nothing to play, stopping");
        self.now_playing = None;
        let _ = self
            .bus_producer
            .send(protocol::Message::Playback(protocol::PlaybackMessage::Stop));
    }

    /// Points the sequencer at the current playlist's storage order. The UI
    /// overrides this with [`protocol::PlaylistMessage::ApplyViewSnapshot`]
    /// while a filter or sort is active.
    fn refresh_view(&mut self) {
        let view = self
            .manager
            .current()
            .map(|playlist| playlist.tracks().to_vec())
            .unwrap_or_default();
        self.sequencer.apply_view_snapshot(view);
    }

    fn broadcast_playlists_changed(&self) {
        let _ = self.bus_producer.send(protocol::Message::Playlist(
            protocol::PlaylistMessage::PlaylistsChanged(self.manager.infos()),
        ));
    }

    /// Announces the current playlist and its restored track rows.
    fn broadcast_active(&self) {
        let Some(playlist) = self.manager.current() else {
            return;
        };
        let _ = self.bus_producer.send(protocol::Message::Playlist(
            protocol::PlaylistMessage::ActivePlaylistChanged(playlist.id().to_string()),
        ));
        let tracks = playlist
            .tracks()
            .iter()
            .map(|track| StoredTrack {
                id: track.id.clone(),
                path: track.path.clone(),
            })
            .collect();
        let _ = self.bus_producer.send(protocol::Message::Playlist(
            protocol::PlaylistMessage::PlaylistRestored(tracks),
        ));
    }
}
