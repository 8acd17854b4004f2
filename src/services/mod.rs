pub mod auth;
pub mod payhere;
pub mod payments;
