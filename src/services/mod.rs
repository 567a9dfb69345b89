pub mod auth_service;
pub mod broadcast_service;
pub mod chat_service;
pub mod request_service;
