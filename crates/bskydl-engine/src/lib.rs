//! The association engine.
//!
//! Finds post images in a rendered feed, works out which post each one
//! belongs to and where it sits among that post's images, and attaches a
//! download button carrying the filename to save it under.
//!
//! ## Pipeline
//!
//! For each image found by a discovery pass:
//!
//! 1. [`classify`] the URL; only feed thumbnails continue
//! 2. [`resolve_post`] from the page location or the nearest post link
//! 3. [`resolve_ordinal`] within the post's image container
//! 4. render the [`FilenameTemplate`]
//! 5. attach an [`Affordance`] and mark the image processed
//!
//! Fetching the image is left to the caller: an affordance carries the
//! image URL, and [`parse_identifier`] turns that into the blob key.

mod affordance;
pub mod ancestry;
mod classify;
mod discovery;
mod engine;
mod filename;
mod identifier;
mod post;

pub use affordance::Affordance;
pub use affordance::AttachOutcome;
pub use affordance::BUTTON_CLASS;
pub use ancestry::find_post_link;
pub use ancestry::resolve_ordinal;
pub use ancestry::resolve_post;
pub use ancestry::LinkSearch;
pub use classify::classify;
pub use classify::ImageClass;
pub use classify::FULLSIZE_MARKER;
pub use classify::THUMBNAIL_MARKER;
pub use discovery::find_candidates;
pub use discovery::DiscoveryLoop;
pub use discovery::TickReport;
pub use discovery::PROCESSED_MARKER;
pub use engine::Engine;
pub use engine::EngineOptions;
pub use filename::now_millis;
pub use filename::FilenameTemplate;
pub use filename::ImageMetadata;
pub use identifier::parse_identifier;
pub use identifier::IdentifierError;
pub use identifier::IdentifierPair;
pub use post::is_post_path;
pub use post::PostReference;
