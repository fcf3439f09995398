use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for jetsky operations
#[derive(Debug, Error, Diagnostic)]
pub enum JetskyError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Publish(#[from] PublishError),

    #[error("io error: {0}")]
    #[diagnostic(code(jetsky::io))]
    Io(#[from] std::io::Error),
}

/// Configuration and credential storage errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(jetsky::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", path.display())]
    #[diagnostic(code(jetsky::config::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    #[diagnostic(code(jetsky::config::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize configuration")]
    #[diagnostic(code(jetsky::config::serialize))]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported config file format: {}", path.display())]
    #[diagnostic(
        code(jetsky::config::format),
        help("use a file ending in .json")
    )]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid service url {url}: {message}")]
    #[diagnostic(code(jetsky::config::url))]
    UrlParse { url: String, message: String },

    #[error("could not determine the user config directory")]
    #[diagnostic(
        code(jetsky::config::no_dir),
        help("pass --config explicitly")
    )]
    NoConfigDir,
}

/// Errors talking to the PDS
#[derive(Debug, Error, Diagnostic)]
pub enum AgentError {
    #[error("request to {endpoint} failed")]
    #[diagnostic(code(jetsky::agent::http))]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {}", message.as_deref().or(error.as_deref()).unwrap_or("no details"))]
    #[diagnostic(code(jetsky::agent::status))]
    Status {
        endpoint: &'static str,
        status: u16,
        error: Option<String>,
        message: Option<String>,
    },

    #[error("malformed response from {endpoint}")]
    #[diagnostic(code(jetsky::agent::decode))]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid xrpc url")]
    #[diagnostic(code(jetsky::agent::url))]
    Url {
        #[source]
        source: url::ParseError,
    },

    #[error("not authenticated")]
    #[diagnostic(code(jetsky::agent::no_session), help("run `jetsky login` first"))]
    NotAuthenticated,
}

/// Reasons a login or post command stopped before or during submission
#[derive(Debug, Error, Diagnostic)]
pub enum PublishError {
    #[error("no text selected")]
    #[diagnostic(code(jetsky::publish::no_selection))]
    NoSelection,

    #[error("not authenticated")]
    #[diagnostic(code(jetsky::publish::not_authenticated), help("run `jetsky login` first"))]
    NotAuthenticated,

    #[error("already logged in")]
    #[diagnostic(code(jetsky::publish::already_logged_in))]
    AlreadyLoggedIn,

    #[error("identifier or app password missing")]
    #[diagnostic(
        code(jetsky::publish::missing_credentials),
        help("set an identifier with `jetsky config --identifier` and provide an app password")
    )]
    MissingCredentials,

    #[error("login failed")]
    #[diagnostic(code(jetsky::publish::login))]
    Login(#[source] AgentError),

    #[error("failed to post")]
    #[diagnostic(code(jetsky::publish::post))]
    Post(#[source] AgentError),

    #[error("failed to get timeline")]
    #[diagnostic(code(jetsky::publish::timeline))]
    Timeline(#[source] AgentError),
}
