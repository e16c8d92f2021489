use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::post::PostReference;

pub const USERNAME_TOKEN: &str = "<%username>";
pub const SHORT_USERNAME_TOKEN: &str = "<%uname>";
pub const POST_ID_TOKEN: &str = "<%post_id>";
pub const TIMESTAMP_TOKEN: &str = "<%timestamp>";
pub const IMAGE_NUMBER_TOKEN: &str = "<%img_num>";

/// Everything a filename can be built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageMetadata {
    pub username: String,
    pub short_username: String,
    pub post_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u128,
    pub ordinal: usize,
}

impl ImageMetadata {
    #[must_use]
    pub fn new(post: &PostReference, ordinal: usize, timestamp: u128) -> Self {
        Self {
            username: post.username.clone(),
            short_username: post.short_username.clone(),
            post_id: post.post_id.clone(),
            timestamp,
            ordinal,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilenameTemplate(String);

impl FilenameTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute every recognized token. Anything else, including
    /// misspelled tokens, is kept as written.
    #[must_use]
    pub fn render(&self, metadata: &ImageMetadata) -> String {
        self.0
            .replace(USERNAME_TOKEN, &metadata.username)
            .replace(SHORT_USERNAME_TOKEN, &metadata.short_username)
            .replace(POST_ID_TOKEN, &metadata.post_id)
            .replace(TIMESTAMP_TOKEN, &metadata.timestamp.to_string())
            .replace(IMAGE_NUMBER_TOKEN, &metadata.ordinal.to_string())
    }
}

impl Default for FilenameTemplate {
    fn default() -> Self {
        Self::new(bskydl_conf::DEFAULT_FILENAME_TEMPLATE)
    }
}

/// Current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
