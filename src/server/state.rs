use axum::extract::FromRef;

use crate::media::MediaProvider;
use crate::prediction::Predictor;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedPredictor = Arc<Predictor>;
pub type GuardedMediaProvider = Arc<dyn MediaProvider>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub predictor: GuardedPredictor,
    pub media: GuardedMediaProvider,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        predictor: GuardedPredictor,
        media: GuardedMediaProvider,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            predictor,
            media,
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedPredictor {
    fn from_ref(input: &ServerState) -> Self {
        input.predictor.clone()
    }
}

impl FromRef<ServerState> for GuardedMediaProvider {
    fn from_ref(input: &ServerState) -> Self {
        input.media.clone()
    }
}
