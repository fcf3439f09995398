//! User-facing login, post and timeline flows.
//!
//! Every outcome is reported through a [`Notifier`] with a short message and
//! also returned to the caller, so a CLI can print the message and still exit
//! non-zero.

use std::time::Duration;

use chrono::Utc;
use jetsky_richtext::{DEFAULT_RESOLVE_TIMEOUT, HandleLookup, prepare_post};

use crate::agent::{PostRecord, PostRef, PostSink, SessionProvider, TimelineSource};
use crate::error::PublishError;
use crate::timeline::render_timeline;

pub const MISSING_CREDENTIALS: &str = "Either identifier or app password don't exist";
pub const ALREADY_LOGGED_IN: &str = "You're already logged in";
pub const LOGIN_SUCCEEDED: &str = "Login succeed";
pub const LOGIN_FAILED: &str = "Login failed";
pub const NOT_AUTHENTICATED: &str = "(Error) not authenticated";
pub const NO_SELECTION: &str = "texts are not selected";
pub const POST_SUCCEEDED: &str = "Post message succeeded";
pub const POST_FAILED: &str = "Failed to post";
pub const TIMELINE_FAILED: &str = "Failed to get Timeline";

/// Receives short status messages meant for the user.
pub trait Notifier {
    fn notify(&self, message: &str);
}

impl<F: Fn(&str)> Notifier for F {
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// The text a user picked for posting.
pub trait Selection {
    /// Selected text, or None when nothing is selected.
    fn text(&self) -> Option<String>;

    /// Mark the selection as handled, e.g. by prepending a marker line.
    fn annotate(&mut self, marker: &str) -> std::io::Result<()>;
}

/// A selection held in memory. Annotating prepends the marker as its own line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSelection {
    text: Option<String>,
}

impl TextSelection {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn into_text(self) -> Option<String> {
        self.text
    }
}

impl Selection for TextSelection {
    fn text(&self) -> Option<String> {
        self.text.clone()
    }

    fn annotate(&mut self, marker: &str) -> std::io::Result<()> {
        if let Some(text) = self.text.as_mut() {
            text.insert_str(0, &format!("{marker}\n"));
        }
        Ok(())
    }
}

/// Marker written above a selection once it has been posted.
pub fn posted_marker(created_at: &str) -> String {
    format!("posted at {created_at}")
}

pub struct Publisher<A, N> {
    agent: A,
    notifier: N,
    resolve_timeout: Duration,
}

impl<A, N: Notifier> Publisher<A, N> {
    pub fn new(agent: A, notifier: N) -> Self {
        Self {
            agent,
            notifier,
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }

    /// Per-handle timeout for mention resolution.
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    fn fail(&self, message: &str, err: PublishError) -> PublishError {
        self.notifier.notify(message);
        err
    }
}

impl<A: SessionProvider, N: Notifier> Publisher<A, N> {
    /// Log in unless already logged in. Empty identifier or secret count as missing.
    pub async fn login(
        &mut self,
        identifier: &str,
        secret: Option<&str>,
    ) -> Result<(), PublishError> {
        let secret = match secret.filter(|s| !s.is_empty()) {
            Some(secret) if !identifier.is_empty() => secret,
            _ => return Err(self.fail(MISSING_CREDENTIALS, PublishError::MissingCredentials)),
        };
        if self.agent.has_session() {
            return Err(self.fail(ALREADY_LOGGED_IN, PublishError::AlreadyLoggedIn));
        }

        match self.agent.login(identifier, secret).await {
            Ok(()) => {
                self.notifier.notify(LOGIN_SUCCEEDED);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, identifier, "login failed");
                Err(self.fail(LOGIN_FAILED, PublishError::Login(e)))
            }
        }
    }
}

impl<A, N> Publisher<A, N>
where
    A: SessionProvider + PostSink + HandleLookup,
    N: Notifier,
{
    /// Post the selected text with link and mention facets.
    ///
    /// Mentions are resolved against the agent's PDS; ones that don't resolve
    /// stay plain text. On success the selection is annotated with a
    /// `posted at` marker. Nothing is retried.
    pub async fn post_selection<S: Selection>(
        &self,
        selection: &mut S,
    ) -> Result<PostRef, PublishError> {
        if !self.agent.has_session() {
            return Err(self.fail(NOT_AUTHENTICATED, PublishError::NotAuthenticated));
        }
        let text = match selection.text().filter(|text| !text.is_empty()) {
            Some(text) => text,
            None => return Err(self.fail(NO_SELECTION, PublishError::NoSelection)),
        };

        let prepared = prepare_post(&text, &self.agent, self.resolve_timeout).await;
        let record = PostRecord::new(prepared.text, prepared.facets, Utc::now());

        let post_ref = match self.agent.create_post(&record).await {
            Ok(post_ref) => post_ref,
            Err(e) => {
                tracing::error!(error = %e, pds = %self.agent.pds_url(), "post failed");
                return Err(self.fail(POST_FAILED, PublishError::Post(e)));
            }
        };
        self.notifier.notify(POST_SUCCEEDED);

        // the post already exists; a failed annotation is only logged
        if let Err(e) = selection.annotate(&posted_marker(&record.created_at)) {
            tracing::warn!(error = %e, uri = %post_ref.uri, "could not annotate selection");
        }
        Ok(post_ref)
    }
}

impl<A, N> Publisher<A, N>
where
    A: SessionProvider + TimelineSource,
    N: Notifier,
{
    /// One page of the home timeline rendered as markdown.
    pub async fn timeline_markdown(&self, limit: u8) -> Result<String, PublishError> {
        if !self.agent.has_session() {
            return Err(self.fail(NOT_AUTHENTICATED, PublishError::NotAuthenticated));
        }
        match self.agent.timeline(limit).await {
            Ok(feed) => Ok(render_timeline(&feed)),
            Err(e) => {
                tracing::error!(error = %e, limit, "timeline fetch failed");
                Err(self.fail(TIMELINE_FAILED, PublishError::Timeline(e)))
            }
        }
    }
}
