use bskydl_engine::IdentifierError;
use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid blob endpoint `{endpoint}`")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to the blob endpoint failed")]
    Http(#[from] reqwest::Error),
    #[error("couldn't retrieve blob: HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to stage download in {dir}")]
    Stage {
        dir: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to save {path}")]
    Save {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download link clicked with nothing to save")]
    NothingToSave,
}

/// Everything that can end a single image download.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session request failed")]
    Http(#[from] reqwest::Error),
    #[error("unable to create session: HTTP {status}")]
    Create { status: u16 },
    #[error("authorized call to {url} failed: HTTP {status}")]
    Call { status: u16, url: String },
}
