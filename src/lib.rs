//! Playback sequencing engine for a desktop audio player.
//!
//! The crate decides which track plays next or previous, maintains a manual
//! play queue that preempts the automatic order, and manages a persistent
//! ordered collection of playlists. The actual audio pipeline and UI live in
//! other processes; they talk to this engine over a broadcast message bus
//! using the types in [`protocol`].
//!
//! A typical host spawns one [`engine::SequencerEngine`] on a dedicated
//! thread:
//!
//! ```no_run
//! use tokio::sync::broadcast;
//! use segue::{config, db_manager::DbManager, engine::SequencerEngine, protocol::Message};
//!
//! let (bus_producer, _) = broadcast::channel::<Message>(4096);
//! let bus_consumer = bus_producer.subscribe();
//! let db_manager = DbManager::new().expect("open playlist database");
//! let config_path = config::config_path();
//! let config = config::load_from(&config_path);
//!
//! std::thread::spawn(move || {
//!     let mut engine = SequencerEngine::new(
//!         bus_consumer,
//!         bus_producer,
//!         db_manager,
//!         config,
//!         Some(config_path),
//!     );
//!     engine.run();
//! });
//! ```

pub mod config;
pub mod db_manager;
pub mod engine;
pub mod error;
pub mod order;
pub mod playback_queue;
pub mod playlist;
pub mod playlist_manager;
pub mod protocol;
pub mod sequencer;
