use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupercookieError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<toml::de::Error> for SupercookieError {
    fn from(e: toml::de::Error) -> Self {
        SupercookieError::Config(e.to_string())
    }
}
