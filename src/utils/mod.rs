pub mod csv;
pub mod helpers;
