/// Path marker of the scaled-down rendition shown inline in feeds and posts.
pub const THUMBNAIL_MARKER: &str = "feed_thumbnail";
/// Path marker of the rendition loaded when an image is clicked to zoom.
pub const FULLSIZE_MARKER: &str = "feed_fullsize";

/// Which rendition an image URL points at.
///
/// Both renditions carry the same picture, but only a thumbnail sits in
/// the post's own subtree, so only a thumbnail can be tied back to its
/// post and position. Full-size images are left alone and unknown URLs
/// (avatars, banners, link cards) are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageClass {
    Thumbnail,
    Fullsize,
    Unknown,
}

impl ImageClass {
    #[must_use]
    pub fn is_thumbnail(self) -> bool {
        self == ImageClass::Thumbnail
    }
}

#[must_use]
pub fn classify(url: &str) -> ImageClass {
    if url.contains(THUMBNAIL_MARKER) {
        ImageClass::Thumbnail
    } else if url.contains(FULLSIZE_MARKER) {
        ImageClass::Fullsize
    } else {
        ImageClass::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID: &str = "did:plc:abc123/bafkreigh2akiscaildc@jpeg";

    #[test]
    fn test_thumbnail() {
        let url = format!("https://cdn.bsky.app/img/feed_thumbnail/plain/{CID}");
        assert_eq!(classify(&url), ImageClass::Thumbnail);
    }

    #[test]
    fn test_fullsize_same_picture() {
        let url = format!("https://cdn.bsky.app/img/feed_fullsize/plain/{CID}");
        assert_eq!(classify(&url), ImageClass::Fullsize);
    }

    #[test]
    fn test_avatar_is_unknown() {
        let url = format!("https://cdn.bsky.app/img/avatar_thumbnail/plain/{CID}");
        assert_eq!(classify(&url), ImageClass::Unknown);
        assert!(!classify(&url).is_thumbnail());
    }
}
