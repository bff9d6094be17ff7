// tests/dev_server.rs

use std::error::Error;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tungstenite::stream::MaybeTlsStream;

use sitewatch::config::ServeSection;
use sitewatch::pipeline::ReloadNotifier;
use sitewatch::serve::inject::{live_reload_script, maybe_inject_live_reload, RELOAD_MESSAGE};
use sitewatch::serve::mime;
use sitewatch::serve::path::resolve_path;
use sitewatch::DevServer;
use sitewatch_test_utils::builders::{ConfigFileBuilder, ProjectDir};
use sitewatch_test_utils::{init_tracing, wait_until};

type TestResult = Result<(), Box<dyn Error>>;

fn site() -> Result<ProjectDir, Box<dyn Error>> {
    let project = ProjectDir::new()?;
    project.write("_site/index.html", "<html><body><h1>Home</h1></body></html>")?;
    project.write("_site/about/index.html", "<html><BODY>About</BODY></html>")?;
    project.write("_site/assets/css/main.css", "body{margin:0}")?;
    project.write("_site/hello world.txt", "hi")?;
    project.write("secret.txt", "outside the site")?;
    Ok(project)
}

/// Plain HTTP/1.1 request; returns the whole response as text.
fn http(addr: SocketAddr, method: &str, path: &str) -> Result<String, Box<dyn Error>> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    write!(
        stream,
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"
    )?;
    let mut response = String::new();
    stream.read_to_string(&mut response)?;
    Ok(response)
}

fn serve_config(live_reload: bool) -> ServeSection {
    ConfigFileBuilder::new().live_reload(live_reload).build().serve
}

#[test]
fn urls_resolve_inside_the_site_only() -> TestResult {
    let project = site()?;
    let root = project.join("_site");
    let canon = |rel: &str| project.join(rel).canonicalize();

    assert_eq!(resolve_path("/", &root), Some(canon("_site/index.html")?));
    assert_eq!(resolve_path("/about", &root), Some(canon("_site/about/index.html")?));
    assert_eq!(resolve_path("/about/", &root), Some(canon("_site/about/index.html")?));
    assert_eq!(
        resolve_path("/assets/css/main.css?v=3#top", &root),
        Some(canon("_site/assets/css/main.css")?)
    );
    assert_eq!(
        resolve_path("/hello%20world.txt", &root),
        Some(canon("_site/hello world.txt")?)
    );

    assert_eq!(resolve_path("/missing.html", &root), None);
    assert_eq!(resolve_path("/assets", &root), None);
    assert_eq!(resolve_path("/../secret.txt", &root), None);
    assert_eq!(resolve_path("/about/../../secret.txt", &root), None);
    assert_eq!(resolve_path("/%2e%2e/secret.txt", &root), None);
    Ok(())
}

#[test]
fn reload_client_goes_before_the_closing_body_tag() -> TestResult {
    let script = live_reload_script(35729);
    assert!(script.contains(":35729"));

    let html = b"<html><body><p>x</p></BODY></html>".to_vec();
    let out = String::from_utf8(maybe_inject_live_reload(html, mime::types::HTML, Some(35729)))?;
    assert!(out.starts_with("<html><body><p>x</p><script>"));
    assert!(out.ends_with("</script></BODY></html>"));

    // No closing tag: appended.
    let fragment = b"<p>partial".to_vec();
    let out = String::from_utf8(maybe_inject_live_reload(fragment, mime::types::HTML, Some(1)))?;
    assert!(out.starts_with("<p>partial<script>"));

    // Only the last closing tag counts.
    let twice = b"<body></body><body></body>".to_vec();
    let out = String::from_utf8(maybe_inject_live_reload(twice, mime::types::HTML, Some(1)))?;
    assert!(out.starts_with("<body></body><body><script>"));
    Ok(())
}

#[test]
fn non_html_and_disabled_reload_are_left_alone() -> TestResult {
    let css = b"body{}".to_vec();
    assert_eq!(maybe_inject_live_reload(css.clone(), mime::types::CSS, Some(1)), css);

    let html = b"<body></body>".to_vec();
    assert_eq!(maybe_inject_live_reload(html.clone(), mime::types::HTML, None), html);
    Ok(())
}

#[test]
fn content_types_follow_the_extension() -> TestResult {
    use std::path::Path;
    assert_eq!(mime::from_path(Path::new("a/index.html")), mime::types::HTML);
    assert_eq!(mime::from_path(Path::new("main.CSS")), mime::types::CSS);
    assert_eq!(mime::from_path(Path::new("main.js")), mime::types::JAVASCRIPT);
    assert_eq!(mime::from_path(Path::new("logo.svg")), mime::types::SVG);
    assert_eq!(mime::from_path(Path::new("blob")), mime::types::OCTET_STREAM);
    Ok(())
}

#[test]
fn serves_pages_with_the_reload_client() -> TestResult {
    init_tracing();
    let project = site()?;
    let server = DevServer::start(&serve_config(true), &project.join("_site"))?;
    let ws_port = server.ws_port().ok_or("live reload should be on")?;
    assert_ne!(server.addr().port(), 0);
    assert_eq!(server.url(), format!("http://{}", server.addr()));

    let page = http(server.addr(), "GET", "/")?;
    assert!(page.starts_with("HTTP/1.1 200"), "{page}");
    assert!(page.contains("<h1>Home</h1>"));
    assert!(page.contains(&format!(":{ws_port}")));

    let css = http(server.addr(), "GET", "/assets/css/main.css")?;
    assert!(css.starts_with("HTTP/1.1 200"));
    assert!(css.contains("body{margin:0}"));
    assert!(!css.contains("<script>"));

    let missing = http(server.addr(), "GET", "/nope")?;
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

    let escape = http(server.addr(), "GET", "/../secret.txt")?;
    assert!(escape.starts_with("HTTP/1.1 404"));
    assert!(!escape.contains("outside the site"));

    let post = http(server.addr(), "POST", "/")?;
    assert!(post.starts_with("HTTP/1.1 405"));
    Ok(())
}

#[test]
fn site_404_page_is_used_when_present() -> TestResult {
    let project = site()?;
    project.write("_site/404.html", "<body>lost</body>")?;
    let server = DevServer::start(&serve_config(false), &project.join("_site"))?;
    assert_eq!(server.ws_port(), None);

    let missing = http(server.addr(), "GET", "/nope")?;
    assert!(missing.starts_with("HTTP/1.1 404"));
    assert!(missing.contains("lost"));
    assert!(!missing.contains("<script>"));
    Ok(())
}

#[test]
fn reload_reaches_connected_clients() -> TestResult {
    init_tracing();
    let project = site()?;
    let server = DevServer::start(&serve_config(true), &project.join("_site"))?;
    let ws_port = server.ws_port().ok_or("live reload should be on")?;
    let handle = server.reload_handle();

    // Nobody listening yet.
    assert_eq!(handle.reload(), 0);

    let (mut client, _) = tungstenite::connect(format!("ws://127.0.0.1:{ws_port}"))?;
    if let MaybeTlsStream::Plain(stream) = client.get_ref() {
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    }

    if !wait_until(|| handle.client_count() == 1) {
        return Err("reload client was never registered".into());
    }

    assert_eq!(handle.reload(), 1);
    let message = client.read()?;
    assert_eq!(message.to_text()?, RELOAD_MESSAGE);

    // A closed client is dropped on the next broadcast.
    drop(client);
    if !wait_until(|| handle.reload() == 0) {
        return Err("closed client was never dropped".into());
    }
    assert_eq!(handle.client_count(), 0);
    Ok(())
}

#[test]
fn silent_connection_does_not_hold_up_other_clients() -> TestResult {
    init_tracing();
    let project = site()?;
    let server = DevServer::start(&serve_config(true), &project.join("_site"))?;
    let ws_port = server.ws_port().ok_or("live reload should be on")?;
    let handle = server.reload_handle();

    // Connects but never sends a handshake.
    let _silent = TcpStream::connect(("127.0.0.1", ws_port))?;

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = tungstenite::connect(format!("ws://127.0.0.1:{ws_port}")).map(|(ws, _)| ws);
        let _ = tx.send(result);
    });
    let _client = rx.recv_timeout(Duration::from_secs(5))??;

    if !wait_until(|| handle.client_count() == 1) {
        return Err("reload client was never registered".into());
    }
    Ok(())
}

#[test]
fn shutdown_finishes_with_a_stalled_connection_open() -> TestResult {
    let project = site()?;
    let server = DevServer::start(&serve_config(true), &project.join("_site"))?;
    let ws_port = server.ws_port().ok_or("live reload should be on")?;

    let _stalled = TcpStream::connect(("127.0.0.1", ws_port))?;
    thread::sleep(Duration::from_millis(100));

    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        drop(server);
        let _ = done_tx.send(());
    });
    done_rx.recv_timeout(Duration::from_secs(5))?;
    Ok(())
}

#[test]
fn busy_port_moves_to_the_next_one() -> TestResult {
    use std::net::{IpAddr, Ipv4Addr, TcpListener};
    use sitewatch::serve::http::bind_with_retry;

    let taken = TcpListener::bind("127.0.0.1:0")?;
    let port = taken.local_addr()?.port();

    let (_server, addr) = bind_with_retry(IpAddr::V4(Ipv4Addr::LOCALHOST), port)?;
    assert_ne!(addr.port(), port);
    assert!(addr.port() > port && addr.port() < port.saturating_add(10));
    Ok(())
}
