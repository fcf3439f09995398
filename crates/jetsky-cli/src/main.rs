use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use jetsky_common::config::{APP_PASSWORD_ENV, default_config_path, password_path_for};
use jetsky_common::telemetry::{self, TelemetryConfig};
use jetsky_common::{
    Config, CredentialStore, FileStore, Notifier, Publisher, Selection, TextSelection,
    XrpcAgent, timeline_file_name,
};
use miette::{IntoDiagnostic, Result};

#[derive(Parser)]
#[command(version, about = "Jetsky - post to Bluesky with links and mentions", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// App password (overrides the stored one)
    #[arg(long, global = true, env = APP_PASSWORD_ENV, hide_env_values = true)]
    app_password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the app password for later commands
    Login,
    /// Post text with markdown links and @mentions
    Post {
        /// Text to post. Read from stdin when neither this nor --file is given
        text: Option<String>,

        /// Post the contents of a file, then mark the file as posted
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Seconds to wait for each mention's handle lookup
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        resolve_timeout: u64,
    },
    /// Save a page of the home timeline as markdown
    Timeline {
        /// Number of posts, defaults to the configured limit
        #[arg(long)]
        limit: Option<u8>,

        /// Directory to write the timeline file into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Forget the stored app password
    ClearPassword,
    /// Show or change settings
    Config {
        /// Handle or DID to log in with
        #[arg(long)]
        identifier: Option<String>,

        /// PDS base URL
        #[arg(long)]
        service: Option<String>,

        /// Posts per timeline page (1-50)
        #[arg(long)]
        timeline_limit: Option<u8>,
    },
}

struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("Jetsky: {message}");
    }
}

/// A file whose whole contents are posted. Annotating prepends the marker line.
struct FileSelection {
    path: PathBuf,
    text: String,
}

impl FileSelection {
    fn open(path: PathBuf) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(&path)?;
        Ok(Self { path, text })
    }
}

impl Selection for FileSelection {
    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn annotate(&mut self, marker: &str) -> std::io::Result<()> {
        self.text = format!("{marker}\n{}", self.text);
        std::fs::write(&self.path, &self.text)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    telemetry::init(TelemetryConfig::from_env("jetsky"));

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let store = FileStore::new(&config_path);
    let credentials = CredentialStore::new(password_path_for(&config_path));
    let config = Config::load(&store).await?;

    match cli.command {
        Commands::Login => {
            let secret = match cli.app_password {
                Some(secret) => Some(secret),
                None => credentials.load()?,
            };
            let mut publisher = Publisher::new(XrpcAgent::from_config(&config)?, StderrNotifier);
            publisher
                .login(&config.identifier, secret.as_deref())
                .await?;
            if let Some(secret) = secret {
                credentials.save(&secret)?;
            }
        }
        Commands::Post {
            text,
            file,
            resolve_timeout,
        } => {
            let publisher = logged_in(&config, &credentials, cli.app_password)
                .await?
                .with_resolve_timeout(Duration::from_secs(resolve_timeout));
            match file {
                Some(path) => {
                    let mut selection = FileSelection::open(path).into_diagnostic()?;
                    publisher.post_selection(&mut selection).await?;
                }
                None => {
                    let mut selection = match text {
                        Some(text) => TextSelection::new(text),
                        None => TextSelection::new(read_stdin()?),
                    };
                    let post_ref = publisher.post_selection(&mut selection).await?;
                    println!("{}", post_ref.uri);
                }
            }
        }
        Commands::Timeline { limit, out } => {
            let publisher = logged_in(&config, &credentials, cli.app_password).await?;
            let limit = limit
                .map(|limit| limit.clamp(1, jetsky_common::config::MAX_TIMELINE_LIMIT))
                .unwrap_or_else(|| config.effective_timeline_limit());
            let markdown = publisher.timeline_markdown(limit).await?;
            let path = write_timeline(&out, &markdown)?;
            println!("{}", path.display());
        }
        Commands::ClearPassword => {
            credentials.clear()?;
            StderrNotifier.notify("App password cleared");
        }
        Commands::Config {
            identifier,
            service,
            timeline_limit,
        } => {
            let changed = identifier.is_some() || service.is_some() || timeline_limit.is_some();
            let mut config = config;
            if let Some(identifier) = identifier {
                config.identifier = identifier;
            }
            if let Some(service) = service {
                config.service = service;
            }
            if let Some(limit) = timeline_limit {
                config.timeline_limit = limit;
            }
            if changed {
                // reject an unusable service before it is saved
                config.service_url()?;
                config.save(&store).await?;
                tracing::info!(path = %config_path.display(), "config saved");
            }
            println!("config: {}", config_path.display());
            println!("identifier: {}", config.identifier);
            println!("service: {}", config.service);
            println!("timeline limit: {}", config.effective_timeline_limit());
        }
    }

    Ok(())
}

/// Publisher with a session when credentials are available.
///
/// Without credentials this returns a logged-out publisher, and the command
/// itself reports that it is not authenticated.
async fn logged_in(
    config: &Config,
    credentials: &CredentialStore,
    app_password: Option<String>,
) -> Result<Publisher<XrpcAgent, StderrNotifier>> {
    let secret = match app_password {
        Some(secret) => Some(secret),
        None => credentials.load()?,
    };
    let mut publisher = Publisher::new(XrpcAgent::from_config(config)?, StderrNotifier);
    if let Some(secret) = secret.filter(|_| !config.identifier.is_empty()) {
        publisher.login(&config.identifier, Some(secret.as_str())).await?;
    }
    Ok(publisher)
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .into_diagnostic()?;
    // a trailing newline from the shell is not part of the post
    Ok(text.trim_end_matches(['\n', '\r']).to_owned())
}

fn write_timeline(dir: &Path, markdown: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).into_diagnostic()?;
    let path = dir.join(timeline_file_name(chrono::Local::now().naive_local()));
    std::fs::write(&path, markdown).into_diagnostic()?;
    Ok(path)
}

fn init_miette() {
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    miette::set_panic_hook();
}
