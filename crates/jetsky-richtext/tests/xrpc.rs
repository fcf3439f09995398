// Handle resolution over real HTTP against a local server that answers
// resolveHandle with canned responses.

use jetsky_richtext::{
    DEFAULT_RESOLVE_TIMEOUT, HandleLookup, ResolveError, XrpcHandleLookup, resolve_handles_at,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

fn canned_response(handle: &str) -> (&'static str, &'static str) {
    match handle {
        "a.test" => ("200 OK", r#"{"did":"did:plc:1"}"#),
        "b.test" => (
            "400 Bad Request",
            r#"{"error":"InvalidRequest","message":"Unable to resolve handle"}"#,
        ),
        "c.test" => ("200 OK", "{}"),
        "d.test" => ("200 OK", "not json"),
        _ => ("500 Internal Server Error", r#"{"error":"InternalServerError"}"#),
    }
}

/// Serve canned resolveHandle answers, one connection per request.
async fn serve_pds() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        return;
                    }
                    request.extend_from_slice(&chunk[..n]);
                }

                let head = String::from_utf8_lossy(&request);
                let handle = head
                    .split_whitespace()
                    .nth(1)
                    .and_then(|target| target.split("handle=").nth(1))
                    .unwrap_or_default();
                let (status, body) = canned_response(handle);

                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            });
        }
    });

    Url::parse(&format!("http://{addr}")).unwrap()
}

#[tokio::test]
async fn lookup_maps_each_response_to_its_reason() {
    let lookup = XrpcHandleLookup::new(serve_pds().await);

    assert_eq!(lookup.lookup("a.test").await.unwrap(), "did:plc:1");

    let err = lookup.lookup("b.test").await.unwrap_err();
    assert!(matches!(&err, ResolveError::NotFound { handle } if handle == "b.test"));
    assert!(err.is_not_found());

    let err = lookup.lookup("c.test").await.unwrap_err();
    assert!(matches!(err, ResolveError::MissingDid { .. }));
    assert!(!err.is_not_found());

    let err = lookup.lookup("d.test").await.unwrap_err();
    assert!(matches!(err, ResolveError::Decode { .. }));

    let err = lookup.lookup("e.test").await.unwrap_err();
    assert!(matches!(&err, ResolveError::Status { status, .. } if status.as_u16() == 500));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn batch_against_pds_keeps_only_resolved_handles() {
    let pds = serve_pds().await;

    let resolutions = resolve_handles_at(
        ["a.test", "b.test", "e.test", "a.test"],
        pds,
        DEFAULT_RESOLVE_TIMEOUT,
    )
    .await;

    assert_eq!(resolutions.len(), 3);
    assert_eq!(resolutions.get("a.test").map(|d| d.as_str()), Some("did:plc:1"));
    assert!(resolutions.contains("b.test"));
    assert!(!resolutions.is_resolved("b.test"));
    assert!(resolutions.contains("e.test"));
    assert!(!resolutions.is_resolved("e.test"));
}
