// src/config/model.rs

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// Every section is optional; the defaults reproduce the classic layout of a
/// generator-driven site:
///
/// ```toml
/// [config]
/// triggered_while_running = "queue"
///
/// [styles]
/// source_dir = "src/styles"
/// output_dir = "assets/css"
///
/// [scripts]
/// source_dir = "src/js"
/// output_dir = "assets/js"
/// bundle_name = "main.js"
///
/// [site]
/// generator = "jekyll"
/// args = ["build"]
/// output_dir = "_site"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Runtime behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub images: ImagesSection,

    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub serve: ServeSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Behaviour when an action is triggered again while it is still running.
///
/// - `Queue`: remember one re-run and start it when the current invocation
///   finishes. Further triggers coalesce into that single pending re-run.
/// - `Cancel`: abort the running invocation and start a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running: {other} (expected \"queue\" or \"cancel\")"
            )),
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    #[serde(default)]
    pub triggered_while_running: TriggerWhileRunningBehaviour,

    /// Quiet period used to coalesce bursts of filesystem events.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Skip a trigger when the content of the group's files did not change.
    #[serde(default)]
    pub use_hash: bool,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running: TriggerWhileRunningBehaviour::default(),
            debounce_ms: default_debounce_ms(),
            use_hash: false,
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    #[serde(default = "default_styles_source")]
    pub source_dir: String,
    #[serde(default = "default_styles_output")]
    pub output_dir: String,
    #[serde(default = "default_styles_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_true")]
    pub minify: bool,
}

fn default_styles_source() -> String {
    "src/styles".to_string()
}

fn default_styles_output() -> String {
    "assets/css".to_string()
}

fn default_styles_extensions() -> Vec<String> {
    vec!["scss".to_string()]
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            source_dir: default_styles_source(),
            output_dir: default_styles_output(),
            extensions: default_styles_extensions(),
            minify: true,
        }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    #[serde(default = "default_scripts_source")]
    pub source_dir: String,
    #[serde(default = "default_scripts_output")]
    pub output_dir: String,
    /// Name of the single concatenated output file.
    #[serde(default = "default_bundle_name")]
    pub bundle_name: String,
    #[serde(default = "default_scripts_extensions")]
    pub extensions: Vec<String>,
    /// Files (relative to `source_dir`) that must come first in the bundle,
    /// in this order. Everything else follows in lexical path order.
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default = "default_true")]
    pub minify: bool,
}

fn default_scripts_source() -> String {
    "src/js".to_string()
}

fn default_scripts_output() -> String {
    "assets/js".to_string()
}

fn default_bundle_name() -> String {
    "main.js".to_string()
}

fn default_scripts_extensions() -> Vec<String> {
    vec!["js".to_string()]
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            source_dir: default_scripts_source(),
            output_dir: default_scripts_output(),
            bundle_name: default_bundle_name(),
            extensions: default_scripts_extensions(),
            order: Vec::new(),
            minify: true,
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    #[serde(default = "default_images_source")]
    pub source_dir: String,
    #[serde(default = "default_images_output")]
    pub output_dir: String,
    #[serde(default = "default_images_extensions")]
    pub extensions: Vec<String>,
}

fn default_images_source() -> String {
    "src/img".to_string()
}

fn default_images_output() -> String {
    "assets/img".to_string()
}

fn default_images_extensions() -> Vec<String> {
    ["jpg", "png", "gif", "svg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            source_dir: default_images_source(),
            output_dir: default_images_output(),
            extensions: default_images_extensions(),
        }
    }
}

/// `[site]` section: the external static-site generator.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSection {
    /// Base executable name. On Windows `.bat` is appended.
    #[serde(default = "default_generator")]
    pub generator: String,
    #[serde(default = "default_generator_args")]
    pub args: Vec<String>,
    /// Directory the generator writes to; served by the dev server.
    #[serde(default = "default_site_output")]
    pub output_dir: String,
    /// Markup patterns that trigger a full rebuild + reload.
    #[serde(default = "default_site_watch")]
    pub watch: Vec<String>,
    /// Reload browsers even when the generator exits unsuccessfully.
    #[serde(default)]
    pub reload_on_failure: bool,
}

fn default_generator() -> String {
    "jekyll".to_string()
}

fn default_generator_args() -> Vec<String> {
    vec!["build".to_string()]
}

fn default_site_output() -> String {
    "_site".to_string()
}

fn default_site_watch() -> Vec<String> {
    ["*.html", "_includes/*.html", "_layouts/*.html"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            generator: default_generator(),
            args: default_generator_args(),
            output_dir: default_site_output(),
            watch: default_site_watch(),
            reload_on_failure: false,
        }
    }
}

/// `[serve]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    #[serde(default = "default_interface")]
    pub interface: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub live_reload: bool,
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
}

fn default_interface() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    3000
}

fn default_ws_port() -> u16 {
    35729
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            port: default_port(),
            live_reload: true,
            ws_port: default_ws_port(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Patterns ignored by every watch group.
    #[serde(default = "default_watch_exclude")]
    pub exclude: Vec<String>,
}

fn default_watch_exclude() -> Vec<String> {
    ["_site/**", ".git/**", "node_modules/**", ".sass-cache/**"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            exclude: default_watch_exclude(),
        }
    }
}

fn default_true() -> bool {
    true
}
