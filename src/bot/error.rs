use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Discord API error: {0}")]
    Serenity(#[from] serenity::Error),

    /// Detail is for logs only; callers see a generic message
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Guild {0} is not available")]
    GuildUnavailable(u64),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Error::Custom(msg.into())
    }

    /// Message shown to the invoking user
    pub fn user_message(&self) -> String {
        match self {
            Error::PermissionDenied(_) => {
                "You don't have permission to use this command.".to_string()
            }
            Error::Custom(msg) => msg.clone(),
            _ => "An unexpected error occurred.".to_string(),
        }
    }
}
