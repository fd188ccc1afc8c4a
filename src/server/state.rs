use axum::extract::FromRef;

use crate::gateway::Gateway;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type SharedGateway = Arc<Gateway>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub gateway: SharedGateway,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, gateway: SharedGateway) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            gateway,
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

impl FromRef<ServerState> for SharedGateway {
    fn from_ref(input: &ServerState) -> Self {
        input.gateway.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
