use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::*;
use crate::config::Credential;

/// A canned response for requests whose path matches exactly and whose
/// query contains `query` (when set).
struct Route {
    path: String,
    query: Option<&'static str>,
    status: u16,
    body: String,
}

fn route(path: &str, status: u16, body: &str) -> Route {
    Route {
        path: path.to_string(),
        query: None,
        status,
        body: body.to_string(),
    }
}

#[derive(Debug, Clone)]
struct Seen {
    target: String,
    head: String,
}

/// Minimal HTTP/1.1 responder on an ephemeral port, one request per connection.
async fn serve(routes: Vec<Route>) -> (SocketAddr, Arc<Mutex<Vec<Seen>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let head = String::from_utf8_lossy(&buf).to_string();
            let target = head
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/")
                .to_string();
            log.lock().unwrap().push(Seen {
                target: target.clone(),
                head: head.to_lowercase(),
            });

            let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
            let (status, body) = routes
                .iter()
                .find(|r| r.path == path && r.query.map_or(true, |q| query.contains(q)))
                .map(|r| (r.status, r.body.clone()))
                .unwrap_or((404, r#"{"detail":"not found"}"#.to_string()));

            let response = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (addr, seen)
}

fn client(addr: SocketAddr, project_id: Option<&str>) -> PlaneClient {
    PlaneClient::with_base(
        format!("http://{addr}/api/v1"),
        "infra".into(),
        project_id.map(String::from),
        Credential::new("test-key"),
    )
    .with_http_client(
        reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("http client"),
    )
}

fn project(id: &str) -> Project {
    Project {
        id: id.into(),
        name: format!("Project {id}"),
        identifier: id.to_uppercase(),
    }
}

#[tokio::test]
async fn current_user_sends_key_and_builds_display_name() {
    let (addr, seen) = serve(vec![route(
        "/api/v1/users/me/",
        200,
        r#"{"id":"u1","first_name":"Ada","last_name":"Lovelace"}"#,
    )])
    .await;

    let user = client(addr, None).current_user().await.unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.display_name(), "Ada Lovelace");

    let seen = seen.lock().unwrap();
    assert!(seen[0].head.contains("x-api-key: test-key"));
    assert!(seen[0].head.contains("content-type: application/json"));
}

#[tokio::test]
async fn current_user_is_absent_on_error_status() {
    let (addr, _) = serve(vec![route("/api/v1/users/me/", 401, r#"{"detail":"no"}"#)]).await;
    let plane = client(addr, None);

    assert!(plane.current_user().await.is_none());
    let err = plane.try_current_user().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status, .. } if status.as_u16() == 401));
}

#[tokio::test]
async fn transport_failure_degrades_to_empty() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let plane = client(addr, None);
    assert!(plane.current_user().await.is_none());
    assert!(plane.list_projects().await.is_empty());
    assert!(plane.state_lookup(&project("p1")).await.is_empty());
    assert!(plane.work_items(&project("p1"), "u1").await.is_empty());
    assert!(matches!(
        plane.try_project_index().await,
        Err(ApiError::Transport { .. })
    ));
}

#[tokio::test]
async fn projects_unwrap_results_envelope() {
    let (addr, _) = serve(vec![route(
        "/api/v1/workspaces/infra/projects/",
        200,
        r#"{"results":[{"id":"p1","name":"Alpha","identifier":"ALP"},{"id":"p2","name":"Beta","identifier":"BET"}]}"#,
    )])
    .await;

    let projects = client(addr, None).list_projects().await;
    let names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);
}

#[tokio::test]
async fn projects_accept_bare_list() {
    let (addr, _) = serve(vec![route(
        "/api/v1/workspaces/infra/projects/",
        200,
        r#"[{"id":"p1","name":"Alpha","identifier":"ALP"}]"#,
    )])
    .await;

    assert_eq!(client(addr, None).list_projects().await.len(), 1);
}

#[tokio::test]
async fn configured_project_is_fetched_alone() {
    let (addr, seen) = serve(vec![route(
        "/api/v1/workspaces/infra/projects/p9/",
        200,
        r#"{"id":"p9","name":"Solo","identifier":"SOL"}"#,
    )])
    .await;

    let plane = client(addr, Some("p9"));
    let projects = plane.list_projects().await;
    assert_eq!(projects, vec![Project {
        id: "p9".into(),
        name: "Solo".into(),
        identifier: "SOL".into(),
    }]);
    assert_eq!(seen.lock().unwrap()[0].target, "/api/v1/workspaces/infra/projects/p9/");
}

#[tokio::test]
async fn configured_project_failure_is_empty() {
    let (addr, _) = serve(vec![]).await;
    assert!(client(addr, Some("missing")).list_projects().await.is_empty());
}

#[tokio::test]
async fn state_lookup_maps_ids_to_names() {
    let (addr, _) = serve(vec![route(
        "/api/v1/workspaces/infra/projects/p1/states/",
        200,
        r#"{"results":[{"id":"s1","name":"Todo"},{"id":"s2","name":"Done"}]}"#,
    )])
    .await;

    let states = client(addr, None).state_lookup(&project("p1")).await;
    assert_eq!(states.get("s1").map(String::as_str), Some("Todo"));
    assert_eq!(states.get("s2").map(String::as_str), Some("Done"));
}

#[tokio::test]
async fn work_items_request_assignee_filter() {
    let (addr, seen) = serve(vec![route(
        "/api/v1/workspaces/infra/projects/p1/work-items/",
        200,
        r#"{"results":[{"id":"w1","name":"Fix bug","state":"s1","assignees":["u1"]}],"next_cursor":"100:1:0","next_page_results":false}"#,
    )])
    .await;

    let items = client(addr, None).work_items(&project("p1"), "u1").await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Fix bug");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].target.contains("assignees=u1"));
    assert!(seen[0].target.contains("per_page=100"));
}

#[tokio::test]
async fn work_items_follow_cursor_pages() {
    let path = "/api/v1/workspaces/infra/projects/p1/work-items/";
    let (addr, seen) = serve(vec![
        Route {
            path: path.into(),
            query: Some("cursor=100%3A1%3A0"),
            status: 200,
            body: r#"{"results":[{"id":"w2","name":"Second"}],"next_cursor":"100:2:0","next_page_results":false}"#.into(),
        },
        route(
            path,
            200,
            r#"{"results":[{"id":"w1","name":"First"}],"next_cursor":"100:1:0","next_page_results":true}"#,
        ),
    ])
    .await;

    let items = client(addr, None).work_items(&project("p1"), "u1").await;
    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let (addr, _) = serve(vec![route("/api/v1/workspaces/infra/projects/", 200, "<html>")]).await;
    let plane = client(addr, None);

    assert!(matches!(
        plane.try_project_index().await,
        Err(ApiError::Decode { .. })
    ));
    assert!(plane.list_projects().await.is_empty());
}

#[tokio::test]
async fn wiki_page_is_fetched_by_id() {
    let (addr, _) = serve(vec![route(
        "/api/v1/workspaces/infra/pages/pg-1/",
        200,
        r#"{"id":"pg-1","name":"Runbook","created_by":"u1","description_html":"<p>steps</p>"}"#,
    )])
    .await;

    let page = client(addr, None).page("pg-1").await.unwrap();
    assert_eq!(page.title(), "Runbook");
    assert_eq!(page.author(), "u1");
    assert_eq!(page.content().as_deref(), Some("<p>steps</p>"));
}
