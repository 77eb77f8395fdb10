use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unsupported url scheme '{0}', expected http, https, ws or wss")]
    UnsupportedScheme(String),
    #[error("failed to connect transport: {0}")]
    TransportConnect(String),
    #[error("{0} not found")]
    NotFound(String),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
