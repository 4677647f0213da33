// Registry of running matches and the channels that reach them.

use crate::domain::tuning::MatchTuning;
use crate::domain::{MatchSnapshot, PlayerId};
use crate::use_cases::game::match_task;
use crate::use_cases::match_controller::MatchController;
use crate::use_cases::{MatchCommand, MatchUpdate};
use axum::extract::ws::Utf8Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Notify, RwLock, broadcast, mpsc, watch};
use tracing::info;

/// Shared configuration for spawning match loops.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    /// Capacity for inbound player commands.
    pub command_channel_capacity: usize,
    /// Capacity for broadcast match updates.
    pub update_broadcast_capacity: usize,
    /// Fixed tick interval for the match loop.
    pub tick_interval: Duration,
    /// Rules every new match starts with.
    pub tuning: MatchTuning,
    /// Fixed RNG seed; `None` draws a fresh one per match.
    pub seed: Option<u64>,
}

/// Errors returned by match registry operations.
#[derive(Debug, PartialEq, Eq)]
pub enum MatchError {
    /// Match already exists and cannot be re-created.
    AlreadyExists,
    /// No match is registered under that id.
    NotFound,
}

/// Per-match channels and access rules.
#[derive(Clone)]
pub struct MatchHandle {
    pub match_id: Arc<str>,
    /// Commands into the match loop.
    pub command_tx: mpsc::Sender<MatchCommand>,
    /// Raw per-tick diffs.
    pub update_tx: broadcast::Sender<MatchUpdate>,
    /// Serialized diffs, shared by every connection.
    pub update_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Latest full state, for late joiners and lag recovery.
    pub snapshot_tx: watch::Sender<Arc<MatchSnapshot>>,
    shutdown: Arc<Notify>,
    // Empty means anyone may play.
    allowed_players: Arc<HashSet<PlayerId>>,
    // Player ids currently driven by a live connection.
    seated: Arc<Mutex<HashSet<PlayerId>>>,
}

/// Exclusive claim on a player id for one connection; released on drop.
#[derive(Debug)]
pub struct Seat {
    player_id: PlayerId,
    seated: Arc<Mutex<HashSet<PlayerId>>>,
}

impl Drop for Seat {
    fn drop(&mut self) {
        self.seated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.player_id);
    }
}

impl MatchHandle {
    pub fn is_player_allowed(&self, player_id: PlayerId) -> bool {
        self.allowed_players.is_empty() || self.allowed_players.contains(&player_id)
    }

    /// Open matches hand out guest ids; restricted ones need a listed id.
    pub fn is_open(&self) -> bool {
        self.allowed_players.is_empty()
    }

    /// Claims `player_id` for one connection. `None` if another connection
    /// already holds it.
    pub fn claim_seat(&self, player_id: PlayerId) -> Option<Seat> {
        let mut seated = self
            .seated
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !seated.insert(player_id) {
            return None;
        }
        Some(Seat {
            player_id,
            seated: self.seated.clone(),
        })
    }
}

/// Thread-safe registry for running matches.
#[derive(Debug)]
pub struct MatchRegistry {
    settings: MatchSettings,
    matches: RwLock<HashMap<String, MatchHandle>>,
}

impl std::fmt::Debug for MatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchHandle")
            .field("match_id", &self.match_id)
            .field("allowed_players", &self.allowed_players.len())
            .field("seated", &self.seated.lock().map(|s| s.len()).ok())
            .finish_non_exhaustive()
    }
}

impl MatchRegistry {
    pub fn new(settings: MatchSettings) -> Self {
        Self {
            settings,
            matches: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a match and spawns its loop task.
    pub async fn create_match(
        &self,
        match_id: String,
        allowed_players: HashSet<PlayerId>,
    ) -> Result<MatchHandle, MatchError> {
        let mut matches = self.matches.write().await;
        if matches.contains_key(&match_id) {
            return Err(MatchError::AlreadyExists);
        }

        let seed = self.settings.seed.unwrap_or_else(rand::random);
        let controller = MatchController::new(self.settings.tuning, seed);

        let (command_tx, command_rx) =
            mpsc::channel::<MatchCommand>(self.settings.command_channel_capacity);
        let (update_tx, _update_rx) =
            broadcast::channel::<MatchUpdate>(self.settings.update_broadcast_capacity);
        let (update_bytes_tx, _update_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(self.settings.update_broadcast_capacity);
        let (snapshot_tx, _snapshot_rx) = watch::channel(Arc::new(controller.snapshot()));
        let shutdown = Arc::new(Notify::new());
        let match_id: Arc<str> = Arc::from(match_id);

        tokio::spawn(match_task(
            match_id.clone(),
            command_rx,
            update_tx.clone(),
            snapshot_tx.clone(),
            controller,
            self.settings.tick_interval,
            shutdown.clone(),
        ));

        let handle = MatchHandle {
            match_id: match_id.clone(),
            command_tx,
            update_tx,
            update_bytes_tx,
            snapshot_tx,
            shutdown,
            allowed_players: Arc::new(allowed_players),
            seated: Arc::new(Mutex::new(HashSet::new())),
        };

        matches.insert(match_id.to_string(), handle.clone());
        info!(%match_id, seed, "match created");
        Ok(handle)
    }

    pub async fn get_match(&self, match_id: &str) -> Option<MatchHandle> {
        let matches = self.matches.read().await;
        matches.get(match_id).cloned()
    }

    /// Unregisters a match and stops its loop.
    pub async fn remove_match(&self, match_id: &str) -> Result<(), MatchError> {
        let handle = self
            .matches
            .write()
            .await
            .remove(match_id)
            .ok_or(MatchError::NotFound)?;
        // notify_one keeps a permit, so the loop sees it even mid-tick.
        handle.shutdown.notify_one();
        info!(match_id, "match removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MatchRegistry {
        MatchRegistry::new(MatchSettings {
            command_channel_capacity: 8,
            update_broadcast_capacity: 8,
            tick_interval: Duration::from_millis(10),
            tuning: MatchTuning::default(),
            seed: Some(3),
        })
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let registry = registry();
        registry
            .create_match("m1".into(), HashSet::new())
            .await
            .unwrap();
        let again = registry.create_match("m1".into(), HashSet::new()).await;
        assert_eq!(again.err(), Some(MatchError::AlreadyExists));
    }

    #[tokio::test]
    async fn a_player_id_seats_one_connection_at_a_time() {
        let registry = registry();
        let handle = registry
            .create_match("m3".into(), HashSet::new())
            .await
            .unwrap();

        let first = handle.claim_seat(7).expect("free seat");
        assert!(handle.claim_seat(7).is_none());
        assert!(handle.claim_seat(8).is_some());

        drop(first);
        assert!(handle.claim_seat(7).is_some());
    }

    #[tokio::test]
    async fn removed_match_is_gone() {
        let registry = registry();
        registry
            .create_match("m2".into(), HashSet::from([4]))
            .await
            .unwrap();
        let handle = registry.get_match("m2").await.unwrap();
        assert!(handle.is_player_allowed(4));
        assert!(!handle.is_player_allowed(5));

        assert_eq!(registry.remove_match("m2").await, Ok(()));
        assert!(registry.get_match("m2").await.is_none());
        assert_eq!(
            registry.remove_match("m2").await,
            Err(MatchError::NotFound)
        );
    }
}
