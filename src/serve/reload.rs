// src/serve/reload.rs

//! WebSocket clients waiting for reload notifications.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{debug, warn};
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::inject::RELOAD_MESSAGE;
use crate::pipeline::ReloadNotifier;

const ACCEPT_POLL: Duration = Duration::from_millis(50);
/// Longest a single connection may hold up the accept thread, both during
/// the handshake and when a broadcast write blocks.
const CLIENT_IO_TIMEOUT: Duration = Duration::from_secs(1);

/// Shared, cloneable handle used to broadcast reloads.
#[derive(Clone, Default)]
pub struct ReloadHandle {
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
}

impl ReloadHandle {
    /// Number of currently registered clients.
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    fn add_client(&self, stream: TcpStream) {
        match tungstenite::accept(stream) {
            Ok(ws) => {
                let mut clients = self.clients.lock();
                clients.push(ws);
                debug!(total = clients.len(), "reload client connected");
            }
            Err(e) => debug!(error = %e, "websocket handshake failed"),
        }
    }

    /// Send the reload message to every client, dropping those that fail.
    pub fn broadcast_reload(&self) -> usize {
        let mut clients = self.clients.lock();
        let mut sent = 0;
        clients.retain_mut(|ws| match ws.send(Message::Text(RELOAD_MESSAGE.to_string().into())) {
            Ok(()) => {
                sent += 1;
                true
            }
            Err(e) => {
                debug!(error = %e, "reload client disconnected");
                false
            }
        });
        sent
    }
}

impl ReloadNotifier for ReloadHandle {
    fn reload(&self) -> usize {
        self.broadcast_reload()
    }
}

/// Accept loop for the reload socket, running on its own thread.
pub(crate) struct ReloadListener {
    port: u16,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReloadListener {
    pub(crate) fn spawn(interface: IpAddr, port: u16, handle: ReloadHandle) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(interface, port))
            .with_context(|| format!("binding live-reload socket on port {port}"))?;
        let port = listener.local_addr()?.port();
        listener.set_nonblocking(true)?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("sitewatch-reload".into())
            .spawn(move || accept_loop(listener, handle, stop_flag))?;

        Ok(Self {
            port,
            stop,
            thread: Some(thread),
        })
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for ReloadListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn accept_loop(listener: TcpListener, handle: ReloadHandle, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "reload connection");
                // Handshake in blocking mode with bounded I/O.
                let configured = stream
                    .set_nonblocking(false)
                    .and_then(|()| stream.set_read_timeout(Some(CLIENT_IO_TIMEOUT)))
                    .and_then(|()| stream.set_write_timeout(Some(CLIENT_IO_TIMEOUT)));
                if let Err(e) = configured {
                    warn!(error = %e, "could not configure reload connection");
                    continue;
                }
                handle.add_client(stream);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                warn!(error = %e, "reload accept failed");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}
