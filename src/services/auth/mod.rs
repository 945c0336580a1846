pub mod authorizer;

pub use authorizer::{Authorized, Caller, Decision, Grant, GuildScope, Policy};
