use thiserror::Error;

// `https://cdn.bsky.app/img/feed_thumbnail/plain/{did}/{cid}@jpeg` split on
// `/` puts the DID at index 6 and the CID at index 7.
const DID_SEGMENT: usize = 6;
const CID_SEGMENT: usize = 7;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("image URL `{url}` has no path segment {index}")]
    MissingSegment { url: String, index: usize },
}

/// The key the blob endpoint uses to locate an image: the repository it
/// was uploaded to and the content hash of the stored bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdentifierPair {
    pub did: String,
    pub cid: String,
}

/// Pull the repository and content identifiers out of a CDN image URL.
///
/// The shape of the segments is not checked; the classifier has already
/// narrowed candidates to CDN image URLs, and a wrong value simply makes
/// the blob request fail.
pub fn parse_identifier(url: &str) -> Result<IdentifierPair, IdentifierError> {
    let segments: Vec<&str> = url.split('/').collect();

    let segment = |index: usize| {
        segments
            .get(index)
            .copied()
            .ok_or_else(|| IdentifierError::MissingSegment {
                url: url.to_string(),
                index,
            })
    };

    let did = segment(DID_SEGMENT)?;
    let cid = segment(CID_SEGMENT)?;
    // Drop the `@jpeg` format suffix the CDN appends.
    let cid = cid.split('@').next().unwrap_or(cid);

    Ok(IdentifierPair {
        did: did.to_string(),
        cid: cid.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_url() {
        let pair = parse_identifier(
            "https://cdn.bsky.app/img/feed_thumbnail/plain/did:plc:ewvi7nxzyoun6zhxrhs64oiz/bafkreihwihm6kpd6zuwhhlro75p5qks5qtrcu55jp3gddbfjsieiv7wuka@jpeg",
        )
        .unwrap();
        assert_eq!(pair.did, "did:plc:ewvi7nxzyoun6zhxrhs64oiz");
        assert_eq!(
            pair.cid,
            "bafkreihwihm6kpd6zuwhhlro75p5qks5qtrcu55jp3gddbfjsieiv7wuka"
        );
    }

    #[test]
    fn test_without_format_suffix() {
        let pair =
            parse_identifier("https://cdn.bsky.app/img/feed_thumbnail/plain/did:plc:x/bafy")
                .unwrap();
        assert_eq!(pair.cid, "bafy");
    }

    #[test]
    fn test_short_url_is_an_error() {
        let err = parse_identifier("https://cdn.bsky.app/img/feed_thumbnail").unwrap_err();
        assert_eq!(
            err,
            IdentifierError::MissingSegment {
                url: "https://cdn.bsky.app/img/feed_thumbnail".to_string(),
                index: 6,
            }
        );
    }
}
