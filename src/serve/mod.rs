// src/serve/mod.rs

//! Development server with live reload.
//!
//! - [`http`] serves the generated site directory over HTTP.
//! - [`reload`] keeps the WebSocket clients and broadcasts reloads.
//! - [`inject`] adds the reload client to every served HTML page.
//!
//! The server runs on plain threads; the async side only ever touches the
//! [`ReloadHandle`].

pub mod http;
pub mod inject;
pub mod mime;
pub mod path;
pub mod reload;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use tiny_http::Server;
use tracing::{debug, info};

use crate::config::ServeSection;

pub use reload::ReloadHandle;
use reload::ReloadListener;

/// A running dev server. Dropping it stops both listeners.
pub struct DevServer {
    addr: SocketAddr,
    reload: ReloadHandle,
    reload_listener: Option<ReloadListener>,
    server: Arc<Server>,
    http_thread: Option<JoinHandle<()>>,
}

impl DevServer {
    /// Bind and start serving `site_dir`.
    ///
    /// With `live_reload` on, a WebSocket listener is started on `ws_port`
    /// and every HTML response gets the reload client injected.
    pub fn start(cfg: &ServeSection, site_dir: &Path) -> Result<Self> {
        let (server, addr) = http::bind_with_retry(cfg.interface, cfg.port)?;
        let server = Arc::new(server);

        let reload = ReloadHandle::default();
        let reload_listener = if cfg.live_reload {
            Some(ReloadListener::spawn(cfg.interface, cfg.ws_port, reload.clone())?)
        } else {
            None
        };
        let ws_port = reload_listener.as_ref().map(ReloadListener::port);

        let http_thread = {
            let server = Arc::clone(&server);
            let site_dir = site_dir.to_path_buf();
            thread::Builder::new()
                .name("sitewatch-http".into())
                .spawn(move || http::run_request_loop(&server, &site_dir, ws_port))?
        };

        info!(url = %format!("http://{addr}"), site = ?site_dir, "dev server listening");
        if let Some(port) = ws_port {
            debug!(port, "live reload enabled");
        }

        Ok(Self {
            addr,
            reload,
            reload_listener,
            server,
            http_thread: Some(http_thread),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Port of the live-reload socket, if enabled.
    pub fn ws_port(&self) -> Option<u16> {
        self.reload_listener.as_ref().map(ReloadListener::port)
    }

    /// Handle for broadcasting reloads to connected browsers.
    pub fn reload_handle(&self) -> ReloadHandle {
        self.reload.clone()
    }
}

impl Drop for DevServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(thread) = self.http_thread.take() {
            let _ = thread.join();
        }
        self.reload_listener.take();
        debug!("dev server stopped");
    }
}
