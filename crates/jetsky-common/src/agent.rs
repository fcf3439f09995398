use std::fmt;
use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use jetsky_richtext::{Did, Facet, HandleLookup, ResolveError, XrpcHandleLookup};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use url::Url;

use crate::config::Config;
use crate::error::{AgentError, ConfigError};
use crate::timeline::{FeedViewPost, Timeline};

pub const CREATE_SESSION_NSID: &str = "com.atproto.server.createSession";
pub const CREATE_RECORD_NSID: &str = "com.atproto.repo.createRecord";
pub const GET_TIMELINE_NSID: &str = "app.bsky.feed.getTimeline";
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Holds (or fails to obtain) an authenticated session.
pub trait SessionProvider {
    fn has_session(&self) -> bool;

    fn login(
        &mut self,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<(), AgentError>>;
}

/// Destination for finished post records.
pub trait PostSink {
    /// PDS that mentions in outgoing posts are resolved against.
    fn pds_url(&self) -> &Url;

    fn create_post(&self, record: &PostRecord)
    -> impl Future<Output = Result<PostRef, AgentError>>;
}

pub trait TimelineSource {
    fn timeline(&self, limit: u8) -> impl Future<Output = Result<Vec<FeedViewPost>, AgentError>>;
}

/// An `app.bsky.feed.post` record as sent to `createRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub r#type: SmolStr,
    pub text: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,
}

impl PostRecord {
    pub fn new(text: impl Into<String>, facets: Vec<Facet>, created_at: DateTime<Utc>) -> Self {
        Self {
            r#type: SmolStr::new_static(POST_COLLECTION),
            text: text.into(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            facets,
        }
    }
}

/// Strong reference to a created record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostRef {
    pub uri: String,
    pub cid: String,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub did: Did,
    pub handle: SmolStr,
    pub access_jwt: String,
    pub refresh_jwt: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("did", &self.did)
            .field("handle", &self.handle)
            .field("access_jwt", &"<redacted>")
            .field("refresh_jwt", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct CreateSessionInput<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct CreateRecordInput<'a> {
    repo: &'a str,
    collection: &'static str,
    record: &'a PostRecord,
}

#[derive(Debug, Default, Deserialize)]
struct XrpcErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// XRPC client for one PDS, holding at most one session.
#[derive(Debug, Clone)]
pub struct XrpcAgent {
    client: reqwest::Client,
    service: Url,
    session: Option<Session>,
    resolver: XrpcHandleLookup,
}

impl XrpcAgent {
    pub fn new(service: Url) -> Self {
        let client = reqwest::Client::default();
        Self {
            resolver: XrpcHandleLookup::with_client(client.clone(), service.clone()),
            client,
            service,
            session: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(config.service_url()?))
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn endpoint(&self, nsid: &str) -> Result<Url, AgentError> {
        self.service
            .join(&format!("/xrpc/{nsid}"))
            .map_err(|source| AgentError::Url { source })
    }

    fn bearer(&self) -> Result<(&Session, String), AgentError> {
        let session = self.session.as_ref().ok_or(AgentError::NotAuthenticated)?;
        Ok((session, format!("Bearer {}", session.access_jwt)))
    }
}

/// Turn a non-2xx response into `AgentError::Status`, otherwise decode the body.
async fn check<T: DeserializeOwned>(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<T, AgentError> {
    let status = response.status();
    if !status.is_success() {
        let body: XrpcErrorBody = response.json().await.unwrap_or_default();
        return Err(AgentError::Status {
            endpoint,
            status: status.as_u16(),
            error: body.error,
            message: body.message,
        });
    }
    response
        .json()
        .await
        .map_err(|source| AgentError::Decode { endpoint, source })
}

impl SessionProvider for XrpcAgent {
    fn has_session(&self) -> bool {
        self.session.is_some()
    }

    async fn login(&mut self, identifier: &str, secret: &str) -> Result<(), AgentError> {
        let url = self.endpoint(CREATE_SESSION_NSID)?;
        let response = self
            .client
            .post(url)
            .json(&CreateSessionInput {
                identifier,
                password: secret,
            })
            .send()
            .await
            .map_err(|source| AgentError::Http {
                endpoint: CREATE_SESSION_NSID,
                source,
            })?;

        let session: Session = check(CREATE_SESSION_NSID, response).await?;
        tracing::info!(did = %session.did, handle = %session.handle, "session created");
        self.session = Some(session);
        Ok(())
    }
}

impl PostSink for XrpcAgent {
    fn pds_url(&self) -> &Url {
        &self.service
    }

    async fn create_post(&self, record: &PostRecord) -> Result<PostRef, AgentError> {
        let (session, auth) = self.bearer()?;
        let url = self.endpoint(CREATE_RECORD_NSID)?;
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&CreateRecordInput {
                repo: &session.did,
                collection: POST_COLLECTION,
                record,
            })
            .send()
            .await
            .map_err(|source| AgentError::Http {
                endpoint: CREATE_RECORD_NSID,
                source,
            })?;

        let post_ref: PostRef = check(CREATE_RECORD_NSID, response).await?;
        tracing::info!(uri = %post_ref.uri, facets = record.facets.len(), "post created");
        Ok(post_ref)
    }
}

impl TimelineSource for XrpcAgent {
    async fn timeline(&self, limit: u8) -> Result<Vec<FeedViewPost>, AgentError> {
        let (_, auth) = self.bearer()?;
        let mut url = self.endpoint(GET_TIMELINE_NSID)?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|source| AgentError::Http {
                endpoint: GET_TIMELINE_NSID,
                source,
            })?;

        let timeline: Timeline = check(GET_TIMELINE_NSID, response).await?;
        tracing::debug!(posts = timeline.feed.len(), "fetched timeline");
        Ok(timeline.feed)
    }
}

/// Mentions are resolved against the same PDS the agent talks to.
impl HandleLookup for XrpcAgent {
    async fn lookup(&self, handle: &str) -> Result<Did, ResolveError> {
        self.resolver.lookup(handle).await
    }
}
