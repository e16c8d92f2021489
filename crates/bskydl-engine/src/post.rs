use std::sync::LazyLock;

use regex::Regex;

static POST_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/profile/(?P<username>[^/]+)/post/(?P<post_id>[A-Za-z0-9]+)")
        .expect("post path pattern is valid")
});

/// Whether `path` (or a full URL) points at a post detail page.
#[must_use]
pub fn is_post_path(path: &str) -> bool {
    POST_PATH.is_match(path)
}

/// The post an image belongs to.
///
/// Computed fresh every time it is needed; the page can restructure
/// between scans, so a reference is only trusted at the moment it was
/// derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostReference {
    /// Full handle, e.g. `oh8.bsky.social`.
    pub username: String,
    /// Handle up to its first `.`, e.g. `oh8`.
    pub short_username: String,
    pub post_id: String,
}

impl PostReference {
    /// Parse `/profile/{username}/post/{post_id}` out of a path or an
    /// absolute URL.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let captures = POST_PATH.captures(path)?;
        let username = captures.name("username")?.as_str();
        let post_id = captures.name("post_id")?.as_str();
        let short_username = username.split('.').next().unwrap_or(username);

        Some(Self {
            username: username.to_string(),
            short_username: short_username.to_string(),
            post_id: post_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        let post = PostReference::from_path("/profile/oh8.bsky.social/post/3krmccyl4722w").unwrap();
        assert_eq!(
            post,
            PostReference {
                username: "oh8.bsky.social".to_string(),
                short_username: "oh8".to_string(),
                post_id: "3krmccyl4722w".to_string(),
            }
        );
    }

    #[test]
    fn test_absolute_url() {
        let post =
            PostReference::from_path("https://bsky.app/profile/oh8.bsky.social/post/3krmccyl4722w")
                .unwrap();
        assert_eq!(post.username, "oh8.bsky.social");
        assert_eq!(post.post_id, "3krmccyl4722w");
    }

    #[test]
    fn test_custom_domain_handle() {
        let post = PostReference::from_path("/profile/example.com/post/abc").unwrap();
        assert_eq!(post.short_username, "example");
    }

    #[test]
    fn test_did_handle_has_no_dot() {
        let post = PostReference::from_path("/profile/did:plc:xyz/post/abc").unwrap();
        assert_eq!(post.short_username, "did:plc:xyz");
    }

    #[test]
    fn test_non_post_paths() {
        assert!(!is_post_path("/profile/oh8.bsky.social"));
        assert!(!is_post_path("/profile/oh8.bsky.social/post/"));
        assert!(!is_post_path("/"));
        assert!(PostReference::from_path("/hashtag/art").is_none());
    }

    #[test]
    fn test_post_path_suffixes_still_match() {
        assert!(is_post_path("/profile/oh8.bsky.social/post/3krmccyl4722w/liked-by"));
    }
}
