// src/serve/inject.rs

//! Live-reload client injection into served HTML.

/// JSON message broadcast to browsers when the site was rebuilt.
pub const RELOAD_MESSAGE: &str = r#"{"type":"reload"}"#;

/// The client snippet: connect back to the reload socket on the page's own
/// host and reload on a reload message.
pub fn live_reload_script(ws_port: u16) -> String {
    format!(
        r#"<script>
(function () {{
  var ws = new WebSocket("ws://" + location.hostname + ":{ws_port}");
  ws.onmessage = function (event) {{
    try {{
      if (JSON.parse(event.data).type === "reload") location.reload();
    }} catch (_) {{}}
  }};
}})();
</script>"#
    )
}

/// Inject the client into `body` when it is HTML and live reload is on.
pub fn maybe_inject_live_reload(
    body: Vec<u8>,
    content_type: &str,
    ws_port: Option<u16>,
) -> Vec<u8> {
    match (content_type.starts_with("text/html"), ws_port) {
        (true, Some(port)) => inject_before_body_end(&body, live_reload_script(port).as_bytes()),
        _ => body,
    }
}

/// Insert `snippet` before the last `</body>` (any case), or append it.
fn inject_before_body_end(content: &[u8], snippet: &[u8]) -> Vec<u8> {
    const CLOSING: &[u8] = b"</body>";

    let pos = content
        .windows(CLOSING.len())
        .rposition(|w| w.eq_ignore_ascii_case(CLOSING))
        .unwrap_or(content.len());

    let mut out = Vec::with_capacity(content.len() + snippet.len());
    out.extend_from_slice(&content[..pos]);
    out.extend_from_slice(snippet);
    out.extend_from_slice(&content[pos..]);
    out
}
