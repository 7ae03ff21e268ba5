//! Owns the playlist collection, the current-playlist selection, and their
//! persistence.
//!
//! The manager never performs per-track sequencing; it only answers which
//! playlist is current and keeps the persisted collection in sync with the
//! in-memory one. Track removal reports the removed ids so the caller can
//! purge manual-queue references.

use log::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::db_manager::DbManager;
use crate::error::Error;
use crate::playlist::{Playlist, Track};
use crate::protocol::PlaylistInfo;

pub const DEFAULT_PLAYLIST_NAME: &str = "Default";

pub struct PlaylistManager {
    playlists: Vec<Playlist>,
    current_id: Option<String>,
    db_manager: DbManager,
}

impl PlaylistManager {
    pub fn new(db_manager: DbManager) -> Self {
        Self {
            playlists: Vec::new(),
            current_id: None,
            db_manager,
        }
    }

    /// Loads all persisted playlists (ordered by position) and their tracks.
    /// An empty store yields exactly one default playlist, persisted
    /// immediately. The current playlist comes from the persisted config id,
    /// falling back to the first playlist when the id is absent or stale.
    pub fn load(&mut self, config: &Config) -> Result<(), Error> {
        self.playlists.clear();

        for info in self.db_manager.get_all_playlists()? {
            let mut playlist = Playlist::new(info.id.clone(), info.name, info.position);
            for row in self.db_manager.get_tracks_for_playlist(&info.id)? {
                playlist.add_track(Track {
                    id: row.id,
                    path: row.path,
                });
            }
            self.playlists.push(playlist);
        }

        if self.playlists.is_empty() {
            info!("No persisted playlists, creating {:?}", DEFAULT_PLAYLIST_NAME);
            self.add(DEFAULT_PLAYLIST_NAME)?;
        }

        let persisted = config.current_playlist_id.as_deref();
        let current = persisted
            .and_then(|id| self.playlists.iter().find(|playlist| playlist.id() == id))
            .or_else(|| self.playlists.first());
        self.current_id = current.map(|playlist| playlist.id().to_string());

        info!(
            "Restored {} playlists, current: {:?}",
            self.playlists.len(),
            self.current_id
        );
        Ok(())
    }

    /// Creates, persists, and appends a new playlist; returns a reference to it.
    pub fn add(&mut self, name: &str) -> Result<&Playlist, Error> {
        let id = Uuid::new_v4().to_string();
        let position = self.playlists.len();
        self.db_manager.create_playlist(&id, name, position)?;
        self.playlists
            .push(Playlist::new(id, name.to_string(), position));
        Ok(&self.playlists[position])
    }

    /// Removes a playlist, orphaning its persisted track rows and deleting
    /// its record. Returns the ids of the tracks it held so the caller can
    /// purge queue references. Removing the current playlist selects the
    /// sibling now occupying its slot (or the last remaining one), so
    /// "current" always points at a member of the set.
    pub fn remove(&mut self, id: &str) -> Result<Vec<String>, Error> {
        let Some(index) = self.playlists.iter().position(|playlist| playlist.id() == id) else {
            debug!("remove: unknown playlist {}", id);
            return Ok(Vec::new());
        };

        let removed_tracks = self.playlists[index].clear();
        self.db_manager.unassign_playlist_tracks(id)?;
        self.db_manager.delete_playlist(id)?;
        self.playlists.remove(index);

        if self.current_id.as_deref() == Some(id) {
            self.current_id = self
                .playlists
                .get(index)
                .or_else(|| self.playlists.last())
                .map(|playlist| playlist.id().to_string());
            debug!("remove: current playlist deleted, now {:?}", self.current_id);
        }

        Ok(removed_tracks)
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<(), Error> {
        self.db_manager.rename_playlist(id, name)?;
        if let Some(playlist) = self
            .playlists
            .iter_mut()
            .find(|playlist| playlist.id() == id)
        {
            playlist.set_name(name.to_string());
        }
        Ok(())
    }

    /// Repositions a playlist within the ordered set with drag-to-position
    /// semantics: the playlist lands exactly at `to` as the user sees it.
    pub fn move_playlist(&mut self, mut from: usize, mut to: usize) {
        if from >= self.playlists.len() || to >= self.playlists.len() {
            return;
        }

        let playlist = self.playlists[from].clone();
        if from > to {
            from += 1;
        } else {
            to += 1;
        }
        self.playlists.insert(to, playlist);
        self.playlists.remove(from);
    }

    /// Selects the current playlist; returns false for an unknown id.
    pub fn select(&mut self, id: &str) -> bool {
        if self.playlists.iter().any(|playlist| playlist.id() == id) {
            self.current_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&Playlist> {
        let id = self.current_id.as_deref()?;
        self.playlists.iter().find(|playlist| playlist.id() == id)
    }

    fn current_mut(&mut self) -> Option<&mut Playlist> {
        let id = self.current_id.clone()?;
        self.playlists
            .iter_mut()
            .find(|playlist| playlist.id() == id)
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn get(&self, index: usize) -> Option<&Playlist> {
        self.playlists.get(index)
    }

    pub fn infos(&self) -> Vec<PlaylistInfo> {
        self.playlists
            .iter()
            .enumerate()
            .map(|(position, playlist)| PlaylistInfo {
                id: playlist.id().to_string(),
                name: playlist.name().to_string(),
                position,
            })
            .collect()
    }

    /// Appends a track to the current playlist and persists it. Returns
    /// `None` when no playlist is current.
    pub fn add_track_to_current(
        &mut self,
        path: std::path::PathBuf,
    ) -> Result<Option<Track>, Error> {
        let Some(playlist_id) = self.current_id.clone() else {
            return Ok(None);
        };

        let track = Track {
            id: Uuid::new_v4().to_string(),
            path,
        };
        let position = self
            .current()
            .map(|playlist| playlist.num_tracks())
            .unwrap_or(0);
        self.db_manager.save_track(
            &track.id,
            &playlist_id,
            &track.path.to_string_lossy(),
            position,
        )?;

        if let Some(playlist) = self.current_mut() {
            playlist.add_track(track.clone());
        }
        Ok(Some(track))
    }

    /// Removes tracks from the current playlist, orphaning their persisted
    /// rows. Returns the ids actually removed so the caller can purge queue
    /// references.
    pub fn remove_tracks_from_current(&mut self, ids: &[String]) -> Result<Vec<String>, Error> {
        let Some(playlist) = self.current_mut() else {
            return Ok(Vec::new());
        };
        let removed = playlist.remove_tracks(ids);
        self.db_manager.unassign_tracks(&removed)?;
        Ok(removed)
    }

    /// Persists every playlist's order and contents, sweeps orphaned track
    /// rows, and records the current-playlist id into the configuration.
    pub fn save_all(&mut self, config: &mut Config) -> Result<(), Error> {
        for (position, playlist) in self.playlists.iter_mut().enumerate() {
            playlist.set_position(position);
            self.db_manager
                .save_playlist(playlist.id(), playlist.name(), position)?;
            for (track_position, track) in playlist.tracks().iter().enumerate() {
                self.db_manager.save_track(
                    &track.id,
                    playlist.id(),
                    &track.path.to_string_lossy(),
                    track_position,
                )?;
            }
        }

        let swept = self.db_manager.delete_unassigned_tracks()?;
        if swept > 0 {
            debug!("save_all: swept {} orphaned track rows", swept);
        }

        config.current_playlist_id = self.current_id.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn manager() -> PlaylistManager {
        PlaylistManager::new(DbManager::new_in_memory().expect("in-memory db"))
    }

    fn loaded_manager() -> PlaylistManager {
        let mut manager = manager();
        manager.load(&Config::default()).expect("load");
        manager
    }

    fn names(manager: &PlaylistManager) -> Vec<&str> {
        manager
            .playlists()
            .iter()
            .map(|playlist| playlist.name())
            .collect()
    }

    #[test]
    fn test_load_on_empty_store_creates_default_playlist() {
        let mut manager = manager();
        manager.load(&Config::default()).expect("load");

        assert_eq!(manager.playlists().len(), 1);
        let current = manager.current().expect("current playlist");
        assert_eq!(current.name(), DEFAULT_PLAYLIST_NAME);
    }

    #[test]
    fn test_load_selects_persisted_current_with_stale_fallback() {
        let mut manager = manager();
        manager.load(&Config::default()).expect("load");
        let second_id = manager.add("Second").expect("add").id().to_string();

        let config = Config {
            current_playlist_id: Some(second_id.clone()),
            ..Config::default()
        };
        manager.load(&config).expect("reload");
        assert_eq!(manager.current().expect("current").id(), second_id);

        let stale = Config {
            current_playlist_id: Some("no-such-playlist".to_string()),
            ..Config::default()
        };
        manager.load(&stale).expect("reload");
        assert_eq!(
            manager.current().expect("current").name(),
            DEFAULT_PLAYLIST_NAME
        );
    }

    #[test]
    fn test_move_playlist_matches_drag_to_position() {
        let mut manager = loaded_manager();
        // Start over with a deterministic set.
        let default_id = manager.current().expect("current").id().to_string();
        manager.remove(&default_id).expect("remove");
        for name in ["A", "B", "C", "D"] {
            manager.add(name).expect("add");
        }

        manager.move_playlist(0, 2);
        assert_eq!(names(&manager), vec!["B", "C", "A", "D"]);

        manager.move_playlist(3, 1);
        assert_eq!(names(&manager), vec!["B", "D", "C", "A"]);

        // Out-of-bounds moves are ignored.
        manager.move_playlist(9, 0);
        assert_eq!(names(&manager), vec!["B", "D", "C", "A"]);
    }

    #[test]
    fn test_remove_current_selects_a_sibling() {
        let mut manager = loaded_manager();
        let first_id = manager.current().expect("current").id().to_string();
        let second_id = manager.add("Second").expect("add").id().to_string();

        manager.remove(&first_id).expect("remove");
        assert_eq!(manager.current().expect("current").id(), second_id);

        manager.remove(&second_id).expect("remove");
        assert!(manager.current().is_none());
        assert!(manager.playlists().is_empty());
    }

    #[test]
    fn test_remove_reports_track_ids_for_queue_purge() {
        let mut manager = loaded_manager();
        let track = manager
            .add_track_to_current(PathBuf::from("/tmp/one.mp3"))
            .expect("add track")
            .expect("current playlist");
        let current_id = manager.current().expect("current").id().to_string();

        let removed = manager.remove(&current_id).expect("remove");
        assert_eq!(removed, vec![track.id]);
    }

    #[test]
    fn test_save_all_sweeps_orphans_and_records_current() {
        let mut manager = loaded_manager();
        let keep = manager
            .add_track_to_current(PathBuf::from("/tmp/keep.mp3"))
            .unwrap()
            .unwrap();
        let drop = manager
            .add_track_to_current(PathBuf::from("/tmp/drop.mp3"))
            .unwrap()
            .unwrap();

        manager
            .remove_tracks_from_current(&[drop.id.clone()])
            .expect("remove tracks");

        let mut config = Config::default();
        manager.save_all(&mut config).expect("save all");
        assert_eq!(
            config.current_playlist_id.as_deref(),
            manager.current().map(|playlist| playlist.id())
        );

        // Reload from the same store: the orphan must be gone.
        manager.load(&config).expect("reload");
        let tracks = manager.current().expect("current").tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, keep.id);
    }

    #[test]
    fn test_save_all_persists_reordered_positions() {
        let mut manager = loaded_manager();
        manager.add("Second").expect("add");
        manager.move_playlist(1, 0);

        let mut config = Config::default();
        manager.save_all(&mut config).expect("save all");

        manager.load(&config).expect("reload");
        assert_eq!(names(&manager), vec!["Second", DEFAULT_PLAYLIST_NAME]);
    }

    #[test]
    fn test_rename_is_persisted() {
        let mut manager = loaded_manager();
        let id = manager.current().expect("current").id().to_string();
        manager.rename(&id, "Road Trip").expect("rename");

        manager.load(&Config::default()).expect("reload");
        assert_eq!(manager.current().expect("current").name(), "Road Trip");
    }
}
