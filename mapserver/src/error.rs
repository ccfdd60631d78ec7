use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request failed")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to decode image")]
    Decode(#[from] image::ImageError),

    #[error("Invalid extent: {0:?}")]
    InvalidExtent(String),

    #[error("Invalid encoding")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("No extent given and none found in URL")]
    MissingExtent,
}

pub type Result<T> = std::result::Result<T, Error>;
