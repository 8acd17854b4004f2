pub mod auth;
pub mod donation;
pub mod registration;
pub mod user;
