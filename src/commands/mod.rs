pub mod config;
pub mod raid;
