use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown driver type: {0}")]
    UnknownDriver(String),

    #[error("Driver '{name}' could not be created: {source}")]
    Driver {
        name: String,
        #[source]
        source: hal_traits::HalError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Config(format!("Invalid configuration document: {}", error))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
