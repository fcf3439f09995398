//! Shared plumbing for jetsky: configuration, the PDS agent, and the
//! login/post/timeline flows built on `jetsky-richtext`.

pub mod agent;
pub mod config;
pub mod error;
pub mod publish;
pub mod telemetry;
pub mod timeline;

pub use agent::{PostRecord, PostRef, PostSink, SessionProvider, TimelineSource, XrpcAgent};
pub use config::{Config, CredentialStore, FileStore, Loader, Saver};
pub use error::{AgentError, ConfigError, JetskyError, PublishError};
pub use publish::{Notifier, Publisher, Selection, TextSelection};
pub use timeline::{FeedViewPost, render_timeline, timeline_file_name};
