pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    auth_service::AuthService, broadcast_service::ChatBroadcaster, chat_service::ChatService,
    request_service::RequestService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth_service: AuthService,
    pub request_service: RequestService,
    pub chat_service: ChatService,
    pub broadcaster: ChatBroadcaster,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let auth_service = AuthService::new(pool.clone());
        let request_service = RequestService::new(pool.clone());
        let chat_service = ChatService::new(pool.clone());
        let broadcaster = ChatBroadcaster::new();

        Self {
            pool,
            auth_service,
            request_service,
            chat_service,
            broadcaster,
        }
    }
}
