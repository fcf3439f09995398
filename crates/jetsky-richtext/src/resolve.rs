//! Handle → DID resolution.
//!
//! Resolution happens in batches: each distinct handle is looked up once,
//! all lookups run concurrently, and the batch only returns after every one
//! of them has settled. A failed lookup leaves its handle unresolved and
//! never affects the others.

use serde::Deserialize;
use smol_str::SmolStr;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::error::ResolveError;

/// A decentralized identifier, e.g. `did:plc:abc123`.
pub type Did = SmolStr;

pub const RESOLVE_HANDLE_NSID: &str = "com.atproto.identity.resolveHandle";

/// Per-handle timeout used when the caller doesn't pick one.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can turn a single handle into a DID.
pub trait HandleLookup {
    fn lookup(&self, handle: &str) -> impl Future<Output = Result<Did, ResolveError>>;
}

/// Resolves handles against a PDS over XRPC.
#[derive(Debug, Clone)]
pub struct XrpcHandleLookup {
    client: reqwest::Client,
    pds_url: Url,
}

#[derive(Debug, Deserialize)]
struct ResolveHandleOutput {
    did: Option<Did>,
}

impl XrpcHandleLookup {
    pub fn new(pds_url: Url) -> Self {
        Self::with_client(reqwest::Client::default(), pds_url)
    }

    pub fn with_client(client: reqwest::Client, pds_url: Url) -> Self {
        Self { client, pds_url }
    }

    pub fn pds_url(&self) -> &Url {
        &self.pds_url
    }

    fn endpoint(&self, handle: &str) -> Result<Url, ResolveError> {
        let mut url = self
            .pds_url
            .join(&format!("/xrpc/{RESOLVE_HANDLE_NSID}"))
            .map_err(|source| ResolveError::Url {
                url: self.pds_url.to_string(),
                source,
            })?;
        url.query_pairs_mut().append_pair("handle", handle);
        Ok(url)
    }
}

impl HandleLookup for XrpcHandleLookup {
    async fn lookup(&self, handle: &str) -> Result<Did, ResolveError> {
        let url = self.endpoint(handle)?;

        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|source| ResolveError::Transport {
                    handle: handle.into(),
                    source,
                })?;

        let status = response.status();
        // the PDS answers 400 for handles it can't resolve
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(ResolveError::NotFound {
                handle: handle.into(),
            });
        }
        if !status.is_success() {
            return Err(ResolveError::Status {
                handle: handle.into(),
                status,
            });
        }

        let output: ResolveHandleOutput =
            response
                .json()
                .await
                .map_err(|source| ResolveError::Decode {
                    handle: handle.into(),
                    source,
                })?;

        output
            .did
            .filter(|did| !did.is_empty())
            .ok_or_else(|| ResolveError::MissingDid {
                handle: handle.into(),
            })
    }
}

/// Pre-resolved handles, e.g. from a cache. Unknown handles are not found.
impl HandleLookup for HashMap<SmolStr, Did> {
    async fn lookup(&self, handle: &str) -> Result<Did, ResolveError> {
        self.get(handle).cloned().ok_or_else(|| ResolveError::NotFound {
            handle: handle.into(),
        })
    }
}

/// Outcome of one resolution batch.
///
/// Every handle that was asked for is present as a key; the value is `None`
/// when its lookup failed for any reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandleResolutions {
    resolved: HashMap<SmolStr, Option<Did>>,
}

impl HandleResolutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for a handle.
    pub fn insert(&mut self, handle: impl Into<SmolStr>, did: Option<Did>) {
        self.resolved.insert(handle.into(), did);
    }

    /// The DID for `handle`, if it resolved.
    pub fn get(&self, handle: &str) -> Option<&Did> {
        self.resolved.get(handle).and_then(Option::as_ref)
    }

    /// True if `handle` was part of the batch, resolved or not.
    pub fn contains(&self, handle: &str) -> bool {
        self.resolved.contains_key(handle)
    }

    pub fn is_resolved(&self, handle: &str) -> bool {
        self.get(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, Option<&Did>)> {
        self.resolved.iter().map(|(h, d)| (h, d.as_ref()))
    }
}

impl FromIterator<(SmolStr, Option<Did>)> for HandleResolutions {
    fn from_iter<T: IntoIterator<Item = (SmolStr, Option<Did>)>>(iter: T) -> Self {
        Self {
            resolved: iter.into_iter().collect(),
        }
    }
}

/// Resolve every distinct handle in `handles` through `lookup`.
///
/// Lookups run concurrently and each one gets its own `timeout`. This never
/// fails as a whole: handles whose lookup errors or times out map to `None`.
pub async fn resolve_handles<L, I, H>(
    handles: I,
    lookup: &L,
    timeout: Duration,
) -> HandleResolutions
where
    L: HandleLookup,
    I: IntoIterator<Item = H>,
    H: Into<SmolStr>,
{
    let unique: BTreeSet<SmolStr> = handles.into_iter().map(Into::into).collect();

    let lookups = unique.into_iter().map(|handle| async move {
        let outcome = match tokio::time::timeout(timeout, lookup.lookup(&handle)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ResolveError::Timeout {
                handle: handle.clone(),
            }),
        };

        let did = match outcome {
            Ok(did) => {
                tracing::debug!(%handle, %did, "resolved handle");
                Some(did)
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(%handle, "handle could not be resolved, skipping mention");
                None
            }
            Err(e) => {
                tracing::error!(%handle, error = ?e, "failed to resolve handle");
                None
            }
        };
        (handle, did)
    });

    n0_future::join_all(lookups).await.into_iter().collect()
}

/// [`resolve_handles`] against the XRPC endpoint of the PDS at `pds_url`.
pub async fn resolve_handles_at<I, H>(
    handles: I,
    pds_url: Url,
    timeout: Duration,
) -> HandleResolutions
where
    I: IntoIterator<Item = H>,
    H: Into<SmolStr>,
{
    let lookup = XrpcHandleLookup::new(pds_url);
    resolve_handles(handles, &lookup, timeout).await
}
