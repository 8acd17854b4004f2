pub mod admin;
pub mod auth;
pub mod payments;
pub mod users;
