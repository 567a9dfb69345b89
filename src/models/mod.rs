pub mod message;
pub mod request;
pub mod user;
