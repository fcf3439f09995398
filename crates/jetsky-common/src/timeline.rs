//! Exporting a page of the home timeline as markdown.

use chrono::NaiveDateTime;
use jetsky_richtext::{Did, Facet, render_faceted_markdown};
use serde::Deserialize;
use smol_str::SmolStr;

/// `app.bsky.feed.getTimeline` output.
#[derive(Debug, Clone, Deserialize)]
pub struct Timeline {
    pub feed: Vec<FeedViewPost>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedViewPost {
    pub post: PostView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: ProfileViewBasic,
    /// Left untyped since timelines can carry records we don't model.
    pub record: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileViewBasic {
    pub did: Did,
    pub handle: SmolStr,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl ProfileViewBasic {
    /// Display name, falling back to the handle when unset or blank.
    pub fn display(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.handle.as_str())
    }
}

/// The parts of a post record the export cares about.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedPostRecord {
    pub text: String,
    pub created_at: String,
    pub facets: Vec<Facet>,
}

impl PostView {
    /// Decode the record, treating anything unreadable as an empty post.
    pub fn post_record(&self) -> FeedPostRecord {
        match serde_json::from_value(self.record.clone()) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(uri = %self.uri, error = %e, "unreadable post record");
                FeedPostRecord::default()
            }
        }
    }
}

fn render_post(index: usize, view: &FeedViewPost) -> String {
    let post = &view.post;
    let record = post.post_record();
    let display = post.author.display();
    let body = render_faceted_markdown(&record.text, &record.facets)
        .unwrap_or_else(|_| record.text.clone());

    let separator = if index > 0 { "\n---\n" } else { "\n" };
    let mut out = format!("{separator}# Posted: {}\n\n## {display}\n", record.created_at);
    if let Some(avatar) = post.author.avatar.as_deref() {
        out.push_str(&format!("![{display}s icon|80x80]({avatar})\n"));
    }
    out.push_str(&format!("{body}\n\ncid: {}", post.cid));
    out
}

/// Render timeline posts as one markdown document, newest first as given.
pub fn render_timeline(feed: &[FeedViewPost]) -> String {
    feed.iter()
        .enumerate()
        .map(|(i, view)| render_post(i, view))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `timeline_YYYY-MM-DD-HH-MM-SS.md`
pub fn timeline_file_name(now: NaiveDateTime) -> String {
    format!("timeline_{}.md", now.format("%Y-%m-%d-%H-%M-%S"))
}
