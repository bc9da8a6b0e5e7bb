//! HTTP client and end-to-end dispatcher tests against a throwaway local server

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rbt_live_search::render::TextView;
use rbt_live_search::{
    LiveSearchClient, LiveSearchConfig, LiveSearchError, Scope, SearchBackend, SearchDispatcher, SearchOutcome,
    SearchQuery, SearchType,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Canned response: status line suffix, content type, body
type Responder = Arc<dyn Fn(&str) -> (&'static str, &'static str, String) + Send + Sync>;

/// How long the server holds a request before answering
type Delay = Arc<dyn Fn(&str) -> Duration + Send + Sync>;

/// Request targets, as seen by the server
type Targets = Arc<Mutex<Vec<String>>>;

/// Minimal HTTP/1.1 server. Records each request target and answers via `respond`.
async fn serve(respond: Responder) -> (String, Targets) {
    let (base, seen, _) = serve_delayed(respond, Arc::new(|_: &str| Duration::ZERO)).await;
    (base, seen)
}

/// Like [`serve`], but holds each response for `delay`. Targets whose client
/// hangs up while held are recorded in the third element and never answered.
async fn serve_delayed(respond: Responder, delay: Delay) -> (String, Targets, Targets) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let seen: Targets = Arc::default();
    let closed: Targets = Arc::default();
    let seen_by_server = Arc::clone(&seen);
    let closed_by_server = Arc::clone(&closed);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let respond = Arc::clone(&respond);
            let delay = Arc::clone(&delay);
            let seen = Arc::clone(&seen_by_server);
            let closed = Arc::clone(&closed_by_server);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request).to_string();
                let target = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or_default()
                    .to_string();
                seen.lock().push(target.clone());

                let hold = delay(&target);
                if !hold.is_zero() {
                    tokio::select! {
                        _ = tokio::time::sleep(hold) => {}
                        read = socket.read(&mut buf) => {
                            if matches!(read, Ok(0) | Err(_)) {
                                closed.lock().push(target);
                                return;
                            }
                        }
                    }
                }

                let (status, content_type, body) = respond(&target);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    content_type,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (base, seen, closed)
}

fn client_for(base: &str) -> LiveSearchClient {
    let config = LiveSearchConfig::default().with_base_url(base).unwrap();
    LiveSearchClient::new(&config).unwrap()
}

const LIGHT_BODY: &str = r#"{
    "query": "light", "scope": "ot", "type": "keyword", "total": 3,
    "script_detected": {"hebrew": false, "greek": false, "latin": true},
    "results": {
        "references": [],
        "ot_verses": [{"book": "Genesis", "chapter": 1, "verse": 3, "text": "Let there be <mark>light</mark>"}],
        "ot_hebrew": [{"book": "Genesis", "chapter": "1", "verse": "3", "english": "light", "hebrew": "אור"}],
        "nt_verses": [], "nt_greek": [],
        "footnotes": [{"book": "Genesis", "chapter": "1", "verse": "4", "text": "light and darkness"}]
    },
    "counts": {"references": 0, "ot_verses": 1, "ot_hebrew": 1, "nt_verses": 0, "nt_greek": 0, "footnotes": 1},
    "page": 1, "limit": 50, "has_more": false
}"#;

#[tokio::test]
async fn test_live_search_decodes_categorized_results() {
    let (base, seen) = serve(Arc::new(|_: &str| ("200 OK", "application/json", LIGHT_BODY.to_string()))).await;
    let client = client_for(&base);

    let query = SearchQuery::new(" light ", Scope::OldTestament, SearchType::Keyword);
    let set = client.live_search(&query).await.unwrap();

    assert_eq!(set.total, 3);
    assert_eq!(set.query, "light");
    assert_eq!(set.ot_verses.count, 1);
    assert_eq!(set.ot_hebrew.shown[0].english.as_deref(), Some("light"));
    assert_eq!(set.footnotes.shown.len(), 1);
    assert_eq!(
        seen.lock().as_slice(),
        ["/api/live/?q=light&scope=ot&limit=50&type=keyword"]
    );
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let (base, _) = serve(Arc::new(|_: &str| {
        ("502 Bad Gateway", "text/html", "<html>bad gateway</html>".to_string())
    }))
    .await;

    let query = SearchQuery::new("light", Scope::All, SearchType::Keyword);
    let err = client_for(&base).live_search(&query).await.unwrap_err();
    assert!(matches!(err, LiveSearchError::Status(502)), "got {:?}", err);
}

#[tokio::test]
async fn test_error_body_surfaces_server_message() {
    let (base, _) = serve(Arc::new(|_: &str| {
        (
            "429 Too Many Requests",
            "application/json",
            r#"{"error": "Too many searches, slow down"}"#.to_string(),
        )
    }))
    .await;

    let query = SearchQuery::new("light", Scope::All, SearchType::Keyword);
    let err = client_for(&base).live_search(&query).await.unwrap_err();
    assert!(matches!(err, LiveSearchError::Server(ref m) if m == "Too many searches, slow down"));
}

#[tokio::test]
async fn test_malformed_json_is_a_decode_error() {
    let (base, _) = serve(Arc::new(|_: &str| ("200 OK", "application/json", "{\"total\": ".to_string()))).await;

    let query = SearchQuery::new("light", Scope::All, SearchType::Keyword);
    let err = client_for(&base).live_search(&query).await.unwrap_err();
    assert!(matches!(err, LiveSearchError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let query = SearchQuery::new("light", Scope::All, SearchType::Keyword);
    let err = client_for(&base).live_search(&query).await.unwrap_err();
    assert!(matches!(err, LiveSearchError::Transport(_)), "got {:?}", err);
}

/// Writer shared between the view and the test
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).to_string()
    }
}

#[tokio::test]
async fn test_typing_burst_renders_one_search_end_to_end() {
    let (base, seen) = serve(Arc::new(|_: &str| ("200 OK", "application/json", LIGHT_BODY.to_string()))).await;
    let config = LiveSearchConfig::default()
        .with_base_url(&base)
        .unwrap()
        .with_debounce(Duration::from_millis(100));
    let client = LiveSearchClient::new(&config).unwrap();
    let out = SharedBuf::default();
    let dispatcher = SearchDispatcher::new(Arc::new(client), Arc::new(TextView::new(out.clone())), config);

    for text in ["l", "li", "lig", "ligh", "light"] {
        dispatcher.on_input(text);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert_eq!(seen.lock().len(), 1);
    let rendered = out.contents();
    assert!(rendered.contains("3 results found"));
    assert!(rendered.contains("Genesis 1:3 [OT]"));
    assert!(rendered.contains("Let there be light"));
    assert!(rendered.contains("English: light"));
}

#[tokio::test]
async fn test_superseded_request_is_dropped_on_the_wire() {
    let (base, seen, closed) = serve_delayed(
        Arc::new(|_: &str| ("200 OK", "application/json", LIGHT_BODY.to_string())),
        Arc::new(|target: &str| {
            if target.contains("q=darkness") {
                Duration::from_secs(5)
            } else {
                Duration::ZERO
            }
        }),
    )
    .await;
    let config = LiveSearchConfig::default().with_base_url(&base).unwrap();
    let client = LiveSearchClient::new(&config).unwrap();
    let out = SharedBuf::default();
    let dispatcher = SearchDispatcher::new(Arc::new(client), Arc::new(TextView::new(out.clone())), config);

    let (first, second) = tokio::join!(
        dispatcher.search("darkness", Scope::All, SearchType::Keyword),
        async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            dispatcher.search("light", Scope::All, SearchType::Keyword).await
        }
    );

    assert_eq!(first, SearchOutcome::Cancelled);
    assert_eq!(second, SearchOutcome::Rendered);

    // Give the server a moment to notice the dropped connection
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(seen.lock().len(), 2);
    assert_eq!(
        closed.lock().as_slice(),
        ["/api/live/?q=darkness&scope=all&limit=50&type=keyword"]
    );
    let rendered = out.contents();
    assert!(rendered.contains("3 results found"));
    assert_eq!(rendered.matches("results found").count(), 1);
}
