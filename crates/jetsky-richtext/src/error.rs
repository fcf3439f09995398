use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

/// Why a single handle could not be resolved.
///
/// None of these abort a batch; [`crate::resolve_handles`] records the handle
/// as unresolved and carries on.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("handle {handle} could not be resolved")]
    #[diagnostic(code(jetsky::resolve::not_found))]
    NotFound { handle: SmolStr },

    #[error("failed to resolve handle {handle}: status {status}")]
    #[diagnostic(code(jetsky::resolve::status))]
    Status {
        handle: SmolStr,
        status: reqwest::StatusCode,
    },

    #[error("failed to resolve handle {handle}")]
    #[diagnostic(code(jetsky::resolve::transport))]
    Transport {
        handle: SmolStr,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed resolveHandle response for {handle}")]
    #[diagnostic(code(jetsky::resolve::decode))]
    Decode {
        handle: SmolStr,
        #[source]
        source: reqwest::Error,
    },

    #[error("no DID found in response for handle {handle}")]
    #[diagnostic(code(jetsky::resolve::missing_did))]
    MissingDid { handle: SmolStr },

    #[error("resolving handle {handle} timed out")]
    #[diagnostic(code(jetsky::resolve::timeout))]
    Timeout { handle: SmolStr },

    #[error("invalid PDS url {url}")]
    #[diagnostic(code(jetsky::resolve::url))]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl ResolveError {
    /// The remote side said the handle doesn't exist, as opposed to the lookup failing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}
