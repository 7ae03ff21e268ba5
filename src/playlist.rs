use std::path::PathBuf;

/// One addressable audio item. A track belongs to exactly one playlist;
/// the manual play queue only ever holds copies of the id/path pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub path: PathBuf,
}

/// Ordered, named collection of tracks with persistent identity.
#[derive(Debug, Clone)]
pub struct Playlist {
    id: String,
    name: String,
    position: usize,
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(id: String, name: String, position: usize) -> Playlist {
        Playlist {
            id,
            name,
            position,
            tracks: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn get_track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Position of the given track within this playlist's storage order.
    pub fn index_of(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|track| track.id == track_id)
    }

    pub fn find_track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == track_id)
    }

    /// Removes the given tracks and returns the ids actually removed.
    pub fn remove_tracks(&mut self, ids: &[String]) -> Vec<String> {
        let mut removed = Vec::new();
        self.tracks.retain(|track| {
            if ids.contains(&track.id) {
                removed.push(track.id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Drops every track and returns their ids.
    pub fn clear(&mut self) -> Vec<String> {
        self.tracks.drain(..).map(|track| track.id).collect()
    }
}
