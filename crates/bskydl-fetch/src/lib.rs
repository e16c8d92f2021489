//! Retrieval and delivery for discovered images.
//!
//! A click on a download button becomes a [`Downloader::click`]: the
//! image URL is reduced to its identifier pair, the blob is fetched from
//! the configured endpoint with [`BlobClient`], and the bytes are handed
//! to a [`Deliver`] implementation. [`FileDelivery`] saves through the
//! shared [`DownloadLink`].

mod blob;
mod delivery;
mod download;
mod error;
mod session;
#[cfg(test)]
mod testing;

pub use blob::Blob;
pub use blob::BlobClient;
pub use delivery::download_link;
pub use delivery::Deliver;
pub use delivery::Download;
pub use delivery::DownloadLink;
pub use delivery::FileDelivery;
pub use download::Downloader;
pub use error::DeliveryError;
pub use error::DownloadError;
pub use error::RetrievalError;
pub use error::SessionError;
pub use session::Session;
pub use session::CREATE_SESSION_ENDPOINT;
