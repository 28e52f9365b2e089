//! End-to-end tests of the access log layer through an Axum router.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDateTime};
use tower::Service;

use twlog::http::{AccessLogLayer, ClientAddr};
use twlog::sink::{Buffer, MemoryStream};

mod common;

fn app(format: &str) -> (Router, MemoryStream) {
    let memory = MemoryStream::new();
    let layer = AccessLogLayer::builder()
        .format(format)
        .stream(memory.clone())
        .build()
        .unwrap();
    (routes().layer(layer), memory)
}

fn routes() -> Router {
    Router::new()
        .route("/", get(|| async { ([("x-sent", "true")], "hello") }))
        .route("/chunked", get(|| async { Response::new(common::ChunkedBody::new("ok")) }))
        .route(
            "/boom",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "stack trace here").into_response() }),
        )
        .route(
            "/hang",
            get(|| async {
                std::future::pending::<()>().await;
                "never"
            }),
        )
}

fn get_request(uri: &str) -> axum::http::request::Builder {
    Request::get(uri)
}

fn line(memory: &MemoryStream) -> String {
    let writes = memory.writes();
    assert_eq!(writes.len(), 1, "expected exactly one write, got {:?}", writes);
    writes[0].clone()
}

#[tokio::test]
async fn test_method_and_url() {
    let (mut app, memory) = app(":method :url");
    common::send(&mut app, get_request("/").body(Body::empty()).unwrap()).await;
    assert_eq!(line(&memory), "GET /\n");
}

#[tokio::test]
async fn test_default_format_is_used() {
    let memory = MemoryStream::new();
    let layer = AccessLogLayer::builder().stream(memory.clone()).build().unwrap();
    let mut app = routes().layer(layer);

    common::send(&mut app, get_request("/").body(Body::empty()).unwrap()).await;

    let line = line(&memory);
    assert!(line.starts_with("- - - ["), "{}", line);
    assert!(line.contains(" GMT] \"GET / HTTP/1.1\" 200 5 \"-\" \"-\"\n"), "{}", line);
}

#[tokio::test]
async fn test_request_and_response_headers() {
    let (mut app, memory) = app(":request[x-from-string] :response[X-Sent]");
    let request = get_request("/")
        .header("x-from-string", "me")
        .body(Body::empty())
        .unwrap();
    common::send(&mut app, request).await;
    assert_eq!(line(&memory), "me true\n");
}

#[tokio::test]
async fn test_date_formats() {
    let (mut app, memory) = app(":date|:date[web]|:date[clf]|:date[iso]");
    common::send(&mut app, get_request("/").body(Body::empty()).unwrap()).await;

    let line = line(&memory);
    let parts: Vec<&str> = line.trim_end().split('|').collect();
    assert_eq!(parts.len(), 4);

    let (plain, web, clf, iso) = (parts[0], parts[1], parts[2], parts[3]);
    assert!(DateTime::parse_from_rfc2822(plain).is_ok(), "{}", plain);
    assert!(web.ends_with(" GMT"), "{}", web);
    assert!(DateTime::parse_from_rfc2822(web).is_ok(), "{}", web);

    let clf_time = clf.strip_suffix(" +0000").expect(clf);
    assert!(NaiveDateTime::parse_from_str(clf_time, "%d/%b/%Y:%H:%M:%S").is_ok(), "{}", clf);

    assert!(iso.ends_with('Z'), "{}", iso);
    assert_eq!(iso.len(), "2016-06-07T10:15:03.000Z".len(), "{}", iso);
    assert!(DateTime::parse_from_rfc3339(iso).is_ok(), "{}", iso);
}

#[tokio::test]
async fn test_remote_user() {
    let cases = [
        (Some(format!("Basic {}", STANDARD.encode("tj:"))), "tj\n"),
        (Some(format!("Basic {}", STANDARD.encode(":pass"))), "-\n"),
        (Some("Basic !!!".to_string()), "-\n"),
        (None, "-\n"),
    ];

    for (authorization, expected) in cases {
        let (mut app, memory) = app(":remoteUser");
        let mut request = get_request("/");
        if let Some(value) = authorization {
            request = request.header("authorization", value);
        }
        common::send(&mut app, request.body(Body::empty()).unwrap()).await;
        assert_eq!(line(&memory), expected);
    }
}

#[tokio::test]
async fn test_remote_addr_from_connect_info_and_override() {
    let (mut app, memory) = app(":remoteAddr");
    let peer: SocketAddr = "192.0.2.10:40000".parse().unwrap();

    let mut request = get_request("/").body(Body::empty()).unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    common::send(&mut app, request).await;

    let mut request = get_request("/").body(Body::empty()).unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
        .extensions_mut()
        .insert(ClientAddr("198.51.100.1".parse().unwrap()));
    common::send(&mut app, request).await;

    assert_eq!(memory.writes(), vec!["192.0.2.10\n", "198.51.100.1\n"]);
}

#[tokio::test]
async fn test_combined_preset() {
    let (mut app, memory) = app("combined");
    let mut request = get_request("/chunked")
        .header("authorization", format!("Basic {}", STANDARD.encode("tj:")))
        .header("referer", "http://localhost/")
        .header("user-agent", "my-ua")
        .body(Body::empty())
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo("127.0.0.1:5555".parse::<SocketAddr>().unwrap()));

    common::send(&mut app, request).await;

    let line = line(&memory);
    let (head, rest) = line.split_once(" [").unwrap();
    let (date, tail) = rest.split_once("] ").unwrap();

    assert_eq!(head, "127.0.0.1 - tj");
    assert!(date.ends_with(" +0000"), "{}", date);
    assert_eq!(tail, "\"GET /chunked HTTP/1.1\" 200 - \"http://localhost/\" \"my-ua\"\n");
}

#[tokio::test]
async fn test_response_time_bounded_by_elapsed() {
    let (mut app, memory) = app(":responseTime");

    let before = Instant::now();
    common::send(&mut app, get_request("/").body(Body::empty()).unwrap()).await;
    let elapsed_ms = before.elapsed().as_secs_f64() * 1e3;

    let line = line(&memory);
    let (whole, fraction) = line.trim_end().split_once('.').unwrap();
    assert_eq!(fraction.len(), 3);
    assert!(!whole.is_empty());

    let ms: f64 = line.trim_end().parse().unwrap();
    assert!(ms >= 0.0);
    assert!(ms <= elapsed_ms, "{} > {}", ms, elapsed_ms);
}

#[tokio::test]
async fn test_skip_writes_nothing() {
    let memory = MemoryStream::new();
    let layer = AccessLogLayer::builder()
        .format(":url :status")
        .stream(memory.clone())
        .skip(|_req, res| res.status() == Some(StatusCode::OK))
        .build()
        .unwrap();
    let mut app = routes().layer(layer);

    common::send(&mut app, get_request("/").body(Body::empty()).unwrap()).await;
    assert!(memory.writes().is_empty());

    common::send(&mut app, get_request("/boom").body(Body::empty()).unwrap()).await;
    assert_eq!(memory.writes(), vec!["/boom 500\n"]);
}

#[tokio::test]
async fn test_original_url_under_nested_router() {
    let memory = MemoryStream::new();
    let layer = AccessLogLayer::builder()
        .format(":url")
        .stream(memory.clone())
        .build()
        .unwrap();
    let inner = Router::new().route("/items", get(|| async { "items" })).layer(layer);
    let mut app = Router::new().nest("/api", inner);

    common::send(&mut app, get_request("/api/items?page=2").body(Body::empty()).unwrap()).await;
    assert_eq!(line(&memory), "/api/items?page=2\n");
}

#[tokio::test]
async fn test_dropped_body_still_logged_once() {
    let (mut app, memory) = app(":url :status");

    let response = app.call(get_request("/").body(Body::empty()).unwrap()).await.unwrap();
    assert!(memory.writes().is_empty());
    drop(response);

    assert_eq!(memory.writes(), vec!["/ 200\n"]);
}

#[tokio::test]
async fn test_abandoned_handler_logged_without_status() {
    let (mut app, memory) = app(":url :status :responseTime");

    let call = app.call(get_request("/hang").body(Body::empty()).unwrap());
    let result = tokio::time::timeout(Duration::from_millis(20), call).await;
    assert!(result.is_err());

    assert_eq!(memory.writes(), vec!["/hang - -\n"]);
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let memory = MemoryStream::new();
    let (notifier, services) = common::recording_notifier();
    let layer = AccessLogLayer::builder()
        .format(":status")
        .stream(memory.clone())
        .notifier(notifier)
        .error_heading("Server down: ")
        .build()
        .unwrap();
    let mut app = routes().layer(layer);

    let (response, body) =
        common::send(&mut app, get_request("/boom").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "stack trace here");
    assert_eq!(memory.writes(), vec!["500\n"]);

    assert!(common::wait_for(|| !services.posted.lock().unwrap().is_empty()).await);
    assert_eq!(*services.stored.lock().unwrap(), vec!["stack trace here"]);
    assert_eq!(
        *services.shortened.lock().unwrap(),
        vec!["https://gist.github.com/deadbeef"]
    );
    assert_eq!(
        *services.posted.lock().unwrap(),
        vec!["Server down: https://sho.rt/abc"]
    );
}

#[tokio::test]
async fn test_success_is_not_reported() {
    let (notifier, services) = common::recording_notifier();
    let layer = AccessLogLayer::builder()
        .format(":status")
        .stream(MemoryStream::new())
        .notifier(notifier)
        .build()
        .unwrap();
    let mut app = routes().layer(layer);

    common::send(&mut app, get_request("/").body(Body::empty()).unwrap()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(services.stored.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_buffered_requests_flush_together() {
    let memory = MemoryStream::new();
    let layer = AccessLogLayer::builder()
        .format(":url")
        .stream(memory.clone())
        .buffer(Buffer::Interval(Duration::from_millis(500)))
        .build()
        .unwrap();
    let mut app = routes().layer(layer);

    common::send(&mut app, get_request("/").body(Body::empty()).unwrap()).await;
    common::send(&mut app, get_request("/chunked").body(Body::empty()).unwrap()).await;
    assert!(memory.writes().is_empty());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(memory.writes(), vec!["/\n/chunked\n"]);
}
