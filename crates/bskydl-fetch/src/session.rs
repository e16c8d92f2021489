//! Authenticated API access.
//!
//! Downloading needs no account, so nothing in the download path uses
//! this. It is the pattern for calls that do: create a session from an
//! identifier and app password, then send the access token as a bearer
//! header.

use serde::Deserialize;
use serde::Serialize;

use crate::error::SessionError;

pub const CREATE_SESSION_ENDPOINT: &str =
    "https://bsky.social/xrpc/com.atproto.server.createSession";

#[derive(Serialize)]
struct Credentials<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    access_jwt: String,
    #[serde(default)]
    did: Option<String>,
    #[serde(default)]
    handle: Option<String>,
}

#[derive(Clone)]
pub struct Session {
    http: reqwest::Client,
    access_jwt: String,
    did: Option<String>,
    handle: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("did", &self.did)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub async fn create(
        http: reqwest::Client,
        endpoint: &str,
        identifier: &str,
        password: &str,
    ) -> Result<Self, SessionError> {
        let resp = http
            .post(endpoint)
            .json(&Credentials {
                identifier,
                password,
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SessionError::Create {
                status: resp.status().as_u16(),
            });
        }

        let body: CreateSessionResponse = resp.json().await?;
        tracing::debug!(handle = ?body.handle, "created session");

        Ok(Self {
            http,
            access_jwt: body.access_jwt,
            did: body.did,
            handle: body.handle,
        })
    }

    #[must_use]
    pub fn did(&self) -> Option<&str> {
        self.did.as_deref()
    }

    #[must_use]
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    /// GET `url` with the session's bearer token and decode the JSON body.
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, SessionError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.access_jwt)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SessionError::Call {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.json().await?)
    }
}
