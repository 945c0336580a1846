pub mod auth;
pub mod raid;
