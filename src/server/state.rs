use axum::extract::FromRef;

use crate::assignment::AssignmentSelector;
use crate::clip_store::ClipStore;
use crate::enrichment::AiEnrichmentClient;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedClipStore = Arc<dyn ClipStore>;
pub type GuardedUserManager = Arc<UserManager>;
pub type GuardedSelector = Arc<AssignmentSelector>;
pub type OptionalEnrichment = Option<Arc<AiEnrichmentClient>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub clip_store: GuardedClipStore,
    pub user_manager: GuardedUserManager,
    pub selector: GuardedSelector,
    pub enrichment: OptionalEnrichment,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedClipStore {
    fn from_ref(input: &ServerState) -> Self {
        input.clip_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedSelector {
    fn from_ref(input: &ServerState) -> Self {
        input.selector.clone()
    }
}

impl FromRef<ServerState> for OptionalEnrichment {
    fn from_ref(input: &ServerState) -> Self {
        input.enrichment.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
