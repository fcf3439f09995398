// Login, posting and timeline flows against an in-memory agent.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use jetsky_common::agent::Session;
use jetsky_common::publish::{
    ALREADY_LOGGED_IN, LOGIN_FAILED, LOGIN_SUCCEEDED, MISSING_CREDENTIALS, NO_SELECTION,
    NOT_AUTHENTICATED, POST_FAILED, POST_SUCCEEDED, TIMELINE_FAILED,
};
use jetsky_common::{
    AgentError, FeedViewPost, PostRecord, PostRef, PostSink, PublishError, Publisher,
    SessionProvider, TextSelection, TimelineSource,
};
use jetsky_richtext::{Did, FacetFeature, HandleLookup, ResolveError};
use smol_str::SmolStr;
use url::Url;

#[derive(Default)]
struct FakeAgent {
    session: Option<Session>,
    password: &'static str,
    handles: HashMap<SmolStr, Did>,
    posts: RefCell<Vec<PostRecord>>,
    fail_posts: bool,
    fail_timeline: bool,
    feed: Vec<FeedViewPost>,
    pds: Option<Url>,
}

impl FakeAgent {
    fn logged_in() -> Self {
        Self {
            session: Some(Session {
                did: "did:plc:me".into(),
                handle: "me.test".into(),
                access_jwt: "a".into(),
                refresh_jwt: "r".into(),
            }),
            handles: HashMap::from([(SmolStr::new("alice.test"), Did::new("did:plc:alice"))]),
            pds: Some(Url::parse("https://pds.test").unwrap()),
            ..Default::default()
        }
    }
}

impl SessionProvider for FakeAgent {
    fn has_session(&self) -> bool {
        self.session.is_some()
    }

    async fn login(&mut self, identifier: &str, secret: &str) -> Result<(), AgentError> {
        if secret != self.password {
            return Err(AgentError::Status {
                endpoint: "com.atproto.server.createSession",
                status: 401,
                error: Some("AuthenticationRequired".into()),
                message: Some("Invalid identifier or password".into()),
            });
        }
        self.session = Some(Session {
            did: "did:plc:me".into(),
            handle: identifier.into(),
            access_jwt: "a".into(),
            refresh_jwt: "r".into(),
        });
        Ok(())
    }
}

impl PostSink for FakeAgent {
    fn pds_url(&self) -> &Url {
        self.pds.as_ref().unwrap()
    }

    async fn create_post(&self, record: &PostRecord) -> Result<PostRef, AgentError> {
        if self.fail_posts {
            return Err(AgentError::Status {
                endpoint: "com.atproto.repo.createRecord",
                status: 500,
                error: None,
                message: None,
            });
        }
        self.posts.borrow_mut().push(record.clone());
        Ok(PostRef {
            uri: "at://did:plc:me/app.bsky.feed.post/1".into(),
            cid: "bafy".into(),
        })
    }
}

impl HandleLookup for FakeAgent {
    async fn lookup(&self, handle: &str) -> Result<Did, ResolveError> {
        self.handles.lookup(handle).await
    }
}

impl TimelineSource for FakeAgent {
    async fn timeline(&self, limit: u8) -> Result<Vec<FeedViewPost>, AgentError> {
        if self.fail_timeline {
            return Err(AgentError::Status {
                endpoint: "app.bsky.feed.getTimeline",
                status: 502,
                error: None,
                message: None,
            });
        }
        Ok(self.feed.iter().take(limit as usize).cloned().collect())
    }
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<String>>>);

impl Recorder {
    fn notifier(&self) -> impl Fn(&str) + use<> {
        let messages = self.0.clone();
        move |msg: &str| messages.borrow_mut().push(msg.to_owned())
    }

    fn messages(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

#[tokio::test]
async fn login_reports_each_outcome() {
    let recorder = Recorder::default();
    let agent = FakeAgent {
        password: "right",
        ..Default::default()
    };
    let mut publisher = Publisher::new(agent, recorder.notifier());

    let err = publisher.login("", Some("right")).await.unwrap_err();
    assert!(matches!(err, PublishError::MissingCredentials));

    let err = publisher.login("me.test", None).await.unwrap_err();
    assert!(matches!(err, PublishError::MissingCredentials));

    let err = publisher.login("me.test", Some("wrong")).await.unwrap_err();
    assert!(matches!(err, PublishError::Login(AgentError::Status { status: 401, .. })));

    publisher.login("me.test", Some("right")).await.unwrap();

    let err = publisher.login("me.test", Some("right")).await.unwrap_err();
    assert!(matches!(err, PublishError::AlreadyLoggedIn));

    assert_eq!(
        recorder.messages(),
        vec![
            MISSING_CREDENTIALS,
            MISSING_CREDENTIALS,
            LOGIN_FAILED,
            LOGIN_SUCCEEDED,
            ALREADY_LOGGED_IN
        ]
    );
}

#[tokio::test]
async fn post_requires_session() {
    let recorder = Recorder::default();
    let publisher = Publisher::new(FakeAgent::default(), recorder.notifier());

    let mut selection = TextSelection::new("hello");
    let err = publisher.post_selection(&mut selection).await.unwrap_err();
    assert!(matches!(err, PublishError::NotAuthenticated));
    assert_eq!(recorder.messages(), vec![NOT_AUTHENTICATED]);
    // untouched on failure
    assert_eq!(selection.into_text().as_deref(), Some("hello"));
}

#[tokio::test]
async fn post_requires_text() {
    let recorder = Recorder::default();
    let publisher = Publisher::new(FakeAgent::logged_in(), recorder.notifier());

    for mut selection in [TextSelection::empty(), TextSelection::new("")] {
        let err = publisher.post_selection(&mut selection).await.unwrap_err();
        assert!(matches!(err, PublishError::NoSelection));
    }
    assert_eq!(recorder.messages(), vec![NO_SELECTION, NO_SELECTION]);
    assert!(publisher.agent().posts.borrow().is_empty());
}

#[tokio::test]
async fn post_builds_facets_and_annotates() {
    let recorder = Recorder::default();
    let publisher = Publisher::new(FakeAgent::logged_in(), recorder.notifier());

    let mut selection =
        TextSelection::new("see [this](https://example.com) @alice.test @ghost.test");
    let post_ref = publisher.post_selection(&mut selection).await.unwrap();
    assert_eq!(post_ref.cid, "bafy");
    assert_eq!(recorder.messages(), vec![POST_SUCCEEDED]);

    let posts = publisher.agent().posts.borrow();
    let record = &posts[0];
    assert_eq!(record.text, "see this @alice.test @ghost.test");
    assert_eq!(record.facets.len(), 2);
    assert!(matches!(&record.facets[0].features[0], FacetFeature::Link { uri } if uri == "https://example.com"));
    assert!(matches!(&record.facets[1].features[0], FacetFeature::Mention { did } if did == "did:plc:alice"));

    let annotated = selection.into_text().unwrap();
    let (marker, rest) = annotated.split_once('\n').unwrap();
    assert_eq!(marker, format!("posted at {}", record.created_at));
    assert_eq!(rest, "see [this](https://example.com) @alice.test @ghost.test");
}

#[tokio::test]
async fn post_failure_is_reported_once() {
    let recorder = Recorder::default();
    let agent = FakeAgent {
        fail_posts: true,
        ..FakeAgent::logged_in()
    };
    let publisher = Publisher::new(agent, recorder.notifier());

    let mut selection = TextSelection::new("hello");
    let err = publisher.post_selection(&mut selection).await.unwrap_err();
    assert!(matches!(err, PublishError::Post(AgentError::Status { status: 500, .. })));
    assert_eq!(recorder.messages(), vec![POST_FAILED]);
    assert_eq!(selection.into_text().as_deref(), Some("hello"));
}

fn feed_post(cid: &str, text: &str) -> FeedViewPost {
    serde_json::from_value(serde_json::json!({
        "post": {
            "uri": format!("at://did:plc:alice/app.bsky.feed.post/{cid}"),
            "cid": cid,
            "author": {
                "did": "did:plc:alice",
                "handle": "alice.test",
                "displayName": "Alice",
            },
            "record": { "text": text, "createdAt": "2024-05-01T12:00:00.000Z" },
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn timeline_renders_requested_page() {
    let recorder = Recorder::default();
    let agent = FakeAgent {
        feed: vec![
            feed_post("cid1", "first"),
            feed_post("cid2", "second"),
            feed_post("cid3", "third"),
        ],
        ..FakeAgent::logged_in()
    };
    let publisher = Publisher::new(agent, recorder.notifier());

    let markdown = publisher.timeline_markdown(2).await.unwrap();
    assert!(markdown.starts_with("\n# Posted: 2024-05-01T12:00:00.000Z\n\n## Alice\nfirst"));
    assert!(markdown.contains("\n---\n"));
    assert!(markdown.ends_with("second\n\ncid: cid2"));
    assert!(!markdown.contains("third"));
    assert!(recorder.messages().is_empty());
}

#[tokio::test]
async fn timeline_requires_session() {
    let recorder = Recorder::default();
    let publisher = Publisher::new(FakeAgent::default(), recorder.notifier());

    let err = publisher.timeline_markdown(10).await.unwrap_err();
    assert!(matches!(err, PublishError::NotAuthenticated));
    assert_eq!(recorder.messages(), vec![NOT_AUTHENTICATED]);
}

#[tokio::test]
async fn timeline_failure_is_reported() {
    let recorder = Recorder::default();
    let agent = FakeAgent {
        fail_timeline: true,
        ..FakeAgent::logged_in()
    };
    let publisher = Publisher::new(agent, recorder.notifier());

    let err = publisher.timeline_markdown(10).await.unwrap_err();
    assert!(matches!(err, PublishError::Timeline(AgentError::Status { status: 502, .. })));
    assert_eq!(recorder.messages(), vec![TIMELINE_FAILED]);
}
