use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use crate::protocol::{PlaylistInfo, StoredTrack};

/// Sentinel playlist reference for track rows that no longer belong to any
/// playlist. Such rows are swept by [`DbManager::delete_unassigned_tracks`].
pub const UNASSIGNED_PLAYLIST_ID: &str = "";

pub struct DbManager {
    conn: Connection,
}

impl DbManager {
    pub fn new() -> Result<Self, rusqlite::Error> {
        let data_dir = dirs::data_dir()
            .expect("Could not find data directory")
            .join("segue");

        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir).expect("Could not create data directory");
        }

        Self::open(data_dir.join("playlists.db"))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let db_manager = Self { conn };
        db_manager.initialize_schema()?;
        Ok(db_manager)
    }

    pub fn new_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let db_manager = Self { conn };
        db_manager.initialize_schema()?;
        Ok(db_manager)
    }

    fn initialize_schema(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS playlists (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tracks (
                id TEXT PRIMARY KEY,
                playlist_id TEXT NOT NULL,
                path TEXT NOT NULL,
                position INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn create_playlist(
        &self,
        id: &str,
        name: &str,
        position: usize,
    ) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO playlists (id, name, position) VALUES (?1, ?2, ?3)",
            params![id, name, position as i64],
        )?;
        Ok(())
    }

    /// Upserts one playlist row, refreshing name and sibling position.
    pub fn save_playlist(
        &self,
        id: &str,
        name: &str,
        position: usize,
    ) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO playlists (id, name, position) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = ?2, position = ?3",
            params![id, name, position as i64],
        )?;
        Ok(())
    }

    pub fn rename_playlist(&self, id: &str, name: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE playlists SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(())
    }

    pub fn delete_playlist(&self, id: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM playlists WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn get_all_playlists(&self) -> Result<Vec<PlaylistInfo>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, position FROM playlists ORDER BY position ASC")?;
        let playlist_iter = stmt.query_map([], |row| {
            Ok(PlaylistInfo {
                id: row.get(0)?,
                name: row.get(1)?,
                position: row.get::<_, i64>(2)? as usize,
            })
        })?;

        let mut playlists = Vec::new();
        for playlist in playlist_iter {
            playlists.push(playlist?);
        }
        Ok(playlists)
    }

    /// Upserts one track row, refreshing its playlist assignment and position.
    pub fn save_track(
        &self,
        id: &str,
        playlist_id: &str,
        path: &str,
        position: usize,
    ) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO tracks (id, playlist_id, path, position) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET playlist_id = ?2, path = ?3, position = ?4",
            params![id, playlist_id, path, position as i64],
        )?;
        Ok(())
    }

    pub fn get_tracks_for_playlist(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<StoredTrack>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, path FROM tracks WHERE playlist_id = ?1 ORDER BY position ASC",
        )?;
        let track_iter = stmt.query_map(params![playlist_id], |row| {
            Ok(StoredTrack {
                id: row.get(0)?,
                path: PathBuf::from(row.get::<_, String>(1)?),
            })
        })?;

        let mut tracks = Vec::new();
        for track in track_iter {
            tracks.push(track?);
        }
        Ok(tracks)
    }

    /// Detaches the given track rows from their playlist without deleting
    /// them; they become eligible for the orphan sweep at the next save.
    pub fn unassign_tracks(&self, ids: &[String]) -> Result<(), rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("UPDATE tracks SET playlist_id = ?1 WHERE id = ?2")?;
        for id in ids {
            stmt.execute(params![UNASSIGNED_PLAYLIST_ID, id])?;
        }
        Ok(())
    }

    /// Detaches every track row of the given playlist.
    pub fn unassign_playlist_tracks(&self, playlist_id: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE tracks SET playlist_id = ?1 WHERE playlist_id = ?2",
            params![UNASSIGNED_PLAYLIST_ID, playlist_id],
        )?;
        Ok(())
    }

    /// Removes track rows that reference no playlist. Returns the number of
    /// rows swept.
    pub fn delete_unassigned_tracks(&self) -> Result<usize, rusqlite::Error> {
        self.conn.execute(
            "DELETE FROM tracks WHERE playlist_id = ?1",
            params![UNASSIGNED_PLAYLIST_ID],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlists_are_restored_in_position_order() {
        let db = DbManager::new_in_memory().expect("in-memory db");
        db.create_playlist("b", "Second", 1).unwrap();
        db.create_playlist("a", "First", 0).unwrap();

        let playlists = db.get_all_playlists().unwrap();
        assert_eq!(playlists.len(), 2);
        assert_eq!(playlists[0].id, "a");
        assert_eq!(playlists[1].id, "b");
    }

    #[test]
    fn test_save_playlist_upserts_name_and_position() {
        let db = DbManager::new_in_memory().expect("in-memory db");
        db.create_playlist("p", "Old", 0).unwrap();
        db.save_playlist("p", "New", 3).unwrap();

        let playlists = db.get_all_playlists().unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].name, "New");
        assert_eq!(playlists[0].position, 3);
    }

    #[test]
    fn test_tracks_are_restored_in_position_order() {
        let db = DbManager::new_in_memory().expect("in-memory db");
        db.create_playlist("p", "Default", 0).unwrap();
        db.save_track("t2", "p", "/tmp/two.mp3", 1).unwrap();
        db.save_track("t1", "p", "/tmp/one.mp3", 0).unwrap();

        let tracks = db.get_tracks_for_playlist("p").unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "t1");
        assert_eq!(tracks[1].id, "t2");
    }

    #[test]
    fn test_unassigned_tracks_are_swept() {
        let db = DbManager::new_in_memory().expect("in-memory db");
        db.create_playlist("p", "Default", 0).unwrap();
        db.save_track("t1", "p", "/tmp/one.mp3", 0).unwrap();
        db.save_track("t2", "p", "/tmp/two.mp3", 1).unwrap();

        db.unassign_tracks(&["t1".to_string()]).unwrap();
        let swept = db.delete_unassigned_tracks().unwrap();
        assert_eq!(swept, 1);

        let tracks = db.get_tracks_for_playlist("p").unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "t2");
    }

    #[test]
    fn test_deleting_playlist_orphans_its_tracks() {
        let db = DbManager::new_in_memory().expect("in-memory db");
        db.create_playlist("p", "Default", 0).unwrap();
        db.save_track("t1", "p", "/tmp/one.mp3", 0).unwrap();

        db.unassign_playlist_tracks("p").unwrap();
        db.delete_playlist("p").unwrap();

        assert!(db.get_all_playlists().unwrap().is_empty());
        assert!(db.get_tracks_for_playlist("p").unwrap().is_empty());
        assert_eq!(db.delete_unassigned_tracks().unwrap(), 1);
    }
}
