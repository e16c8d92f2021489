use bskydl_engine::IdentifierPair;
use url::Url;

use crate::error::RetrievalError;

/// Bytes of a stored image, as returned by the blob endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Client for `com.atproto.sync.getBlob`.
///
/// The endpoint serves the stored upload, which is still not the
/// original file (the service rescales on upload) but is less compressed
/// than the CDN renditions.
#[derive(Clone, Debug)]
pub struct BlobClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl BlobClient {
    pub fn new(endpoint: &str) -> Result<Self, RetrievalError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("bskydl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(http, endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: &str) -> Result<Self, RetrievalError> {
        let endpoint = Url::parse(endpoint).map_err(|source| RetrievalError::Endpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        Ok(Self { http, endpoint })
    }

    #[must_use]
    pub fn request_url(&self, pair: &IdentifierPair) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("did", &pair.did)
            .append_pair("cid", &pair.cid);
        url
    }

    /// Issue a single GET for the blob. Not retried; no timeout beyond
    /// the client's own.
    pub async fn fetch(&self, pair: &IdentifierPair) -> Result<Blob, RetrievalError> {
        let url = self.request_url(pair);
        tracing::debug!(%url, "fetching blob");

        let resp = self.http.get(url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(RetrievalError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?.to_vec();

        Ok(Blob {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::http_client;
    use crate::testing::serve_once;
    use crate::testing::CannedResponse;

    fn pair() -> IdentifierPair {
        IdentifierPair {
            did: "did:plc:ewvi7nxzyoun6zhxrhs64oiz".to_string(),
            cid: "bafkreihwihm6kpd6zuwhhlro75p5qks5qtrcu55jp3gddbfjsieiv7wuka".to_string(),
        }
    }

    #[test]
    fn test_request_url_carries_pair() {
        let client =
            BlobClient::new("https://bsky.social/xrpc/com.atproto.sync.getBlob").unwrap();
        let url = client.request_url(&pair());

        assert_eq!(url.path(), "/xrpc/com.atproto.sync.getBlob");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("did".to_string(), pair().did),
                ("cid".to_string(), pair().cid),
            ]
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            BlobClient::new("not a url"),
            Err(RetrievalError::Endpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let (base, server) =
            serve_once(CannedResponse::ok("image/jpeg", b"\xff\xd8jpeg".to_vec())).await;
        let client = BlobClient::with_client(http_client(), &format!("{base}/getBlob")).unwrap();

        let blob = client.fetch(&pair()).await.unwrap();
        assert_eq!(blob.bytes, b"\xff\xd8jpeg");
        assert_eq!(blob.content_type.as_deref(), Some("image/jpeg"));

        let request = server.await.unwrap();
        assert!(request
            .starts_with("GET /getBlob?did=did%3Aplc%3Aewvi7nxzyoun6zhxrhs64oiz&cid=bafkrei"));
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let (base, server) = serve_once(CannedResponse::not_found()).await;
        let client = BlobClient::with_client(http_client(), &format!("{base}/getBlob")).unwrap();

        let err = client.fetch(&pair()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Status { status: 404, .. }));
        server.await.unwrap();
    }
}
