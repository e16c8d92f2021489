use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomError {
    /// The page has no `#root` container to hang the download link on.
    #[error("document has no element with id \"root\"")]
    MissingRootContainer,

    #[error("cannot append a node to itself or one of its descendants")]
    Cycle,
}
