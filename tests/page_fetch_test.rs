//! HTTP behaviour of the page fetcher.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use colloquy::{ColloquyError, PageFetcher};

const THREAD_HTML: &str = r#"<html>
<head><title>Show HN</title><style>.c { color: #828282 }</style></head>
<body>
  <table><tr><td class="title">Show HN: A thing &amp; another</td></tr>
  <tr><td class="comment"><span>First!</span></td></tr></table>
  <script>window.hn = {};</script>
</body>
</html>"#;

#[tokio::test]
async fn fetch_returns_visible_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .and(query_param("id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(THREAD_HTML))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/item?id=42", server.uri());
    let page = PageFetcher::new().fetch(&url).await.unwrap();

    assert_eq!(page.url, url);
    assert_eq!(page.text, "Show HN Show HN: A thing & another First!");
}

#[tokio::test]
async fn non_success_status_is_a_communication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = PageFetcher::new()
        .fetch(&format!("{}/item?id=1", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, ColloquyError::CommunicationFailure(ref m) if m.contains("503")));
}

#[tokio::test]
async fn unreachable_host_is_a_communication_failure() {
    // Port 9 (discard) on localhost is closed in test environments.
    let err = PageFetcher::new()
        .fetch("http://127.0.0.1:9/item?id=1")
        .await
        .unwrap_err();

    assert!(matches!(err, ColloquyError::CommunicationFailure(_)));
}
