use crate::use_cases::MatchRegistry;
use std::sync::Arc;

pub struct AppState {
    // Running matches, shared by every route.
    pub match_registry: Arc<MatchRegistry>,
    // Match used when a client connects without `match_id`.
    pub default_match_id: Arc<str>,
}
