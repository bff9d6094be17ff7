// src/serve/http.rs

//! Static-file HTTP handling.

use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info};

use super::inject::maybe_inject_live_reload;
use super::mime::{self, types};
use super::path::resolve_path;

/// Number of consecutive ports tried when the configured one is taken.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind `interface:base_port`, moving up one port at a time while the port
/// is in use.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let requested = SocketAddr::new(interface, port);

        match Server::http(requested) {
            Ok(server) => {
                if offset > 0 {
                    info!(base_port, port, "port in use; using the next free one");
                }
                let addr = server.server_addr().to_ip().unwrap_or(requested);
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "failed to bind after {MAX_PORT_RETRIES} attempts (ports {base_port}-{}): {}",
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Serve requests until the server is unblocked.
pub(crate) fn run_request_loop(server: &Server, site_dir: &Path, ws_port: Option<u16>) {
    for request in server.incoming_requests() {
        let url = request.url().to_string();
        if let Err(e) = handle_request(request, site_dir, ws_port) {
            debug!(%url, error = %format!("{e:#}"), "request error");
        }
    }
}

fn handle_request(request: Request, site_dir: &Path, ws_port: Option<u16>) -> Result<()> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return send_body(request, 405, types::PLAIN, b"405 Method Not Allowed".to_vec());
    }

    match resolve_path(request.url(), site_dir) {
        Some(path) => respond_file(request, &path, ws_port),
        None => respond_not_found(request, site_dir, ws_port),
    }
}

fn respond_file(request: Request, path: &Path, ws_port: Option<u16>) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let body = maybe_inject_live_reload(body, content_type, ws_port);
    send_body(request, 200, content_type, body)
}

/// 404, using the site's own `404.html` when it has one.
fn respond_not_found(request: Request, site_dir: &Path, ws_port: Option<u16>) -> Result<()> {
    let custom = site_dir.join("404.html");

    if is_head_request(&request) {
        let mime = if custom.is_file() { types::HTML } else { types::PLAIN };
        return send_head(request, 404, mime);
    }

    if let Ok(body) = fs::read(&custom) {
        let body = maybe_inject_live_reload(body, types::HTML, ws_port);
        return send_body(request, 404, types::HTML, body);
    }

    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(content_type_header(content_type)?);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(content_type_header(content_type)?)
        .with_header(header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

fn content_type_header(value: &str) -> Result<Header> {
    header("Content-Type", value)
}

fn header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow!("invalid header {key}: {value}"))
}
