// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::ConfigFile;
use crate::engine::Action;

/// One pattern group and the action it triggers.
///
/// Patterns are relative to the project root and use `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRegistration {
    pub action: Action,
    pub patterns: Vec<String>,
}

/// The four registrations derived from a config:
///
/// ```text
/// styles   <styles.source_dir>/**/*.<ext>   -> Styles
/// scripts  <scripts.source_dir>/**/*.<ext>  -> Scripts
/// images   <images.source_dir>/**/*.<ext>   -> Images
/// markup   site.watch                       -> SiteRebuild
/// ```
pub fn registrations_from_config(cfg: &ConfigFile) -> Vec<WatchRegistration> {
    vec![
        WatchRegistration {
            action: Action::Styles,
            patterns: tree_patterns(&cfg.styles.source_dir, &cfg.styles.extensions),
        },
        WatchRegistration {
            action: Action::Scripts,
            patterns: tree_patterns(&cfg.scripts.source_dir, &cfg.scripts.extensions),
        },
        WatchRegistration {
            action: Action::Images,
            patterns: tree_patterns(&cfg.images.source_dir, &cfg.images.extensions),
        },
        WatchRegistration {
            action: Action::SiteRebuild,
            patterns: cfg.site.watch.clone(),
        },
    ]
}

fn tree_patterns(dir: &str, extensions: &[String]) -> Vec<String> {
    let dir = dir.trim_start_matches("./").trim_end_matches('/');
    extensions
        .iter()
        .map(|ext| {
            if dir.is_empty() || dir == "." {
                format!("**/*.{ext}")
            } else {
                format!("{dir}/**/*.{ext}")
            }
        })
        .collect()
}

struct WatchGroup {
    registration: WatchRegistration,
    set: GlobSet,
}

/// Compiled watch table: pattern groups plus the global exclude list.
///
/// Built once at start-up and shared read-only with the watcher.
pub struct WatchTable {
    groups: Vec<WatchGroup>,
    exclude: GlobSet,
}

impl fmt::Debug for WatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchTable")
            .field(
                "groups",
                &self
                    .groups
                    .iter()
                    .map(|g| &g.registration)
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl WatchTable {
    pub fn new(registrations: Vec<WatchRegistration>, exclude: &[String]) -> Result<Self> {
        let mut groups = Vec::with_capacity(registrations.len());
        for registration in registrations {
            let set = build_globset(&registration.patterns).with_context(|| {
                format!("building watch globset for {}", registration.action)
            })?;
            groups.push(WatchGroup { registration, set });
        }

        let exclude = build_globset(exclude).context("building exclude globset")?;
        Ok(Self { groups, exclude })
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Self::new(registrations_from_config(cfg), &cfg.watch.exclude)
    }

    pub fn registrations(&self) -> impl Iterator<Item = &WatchRegistration> {
        self.groups.iter().map(|g| &g.registration)
    }

    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.exclude.is_match(rel_path)
    }

    /// True if `rel_path` belongs to the group registered for `action`.
    pub fn matches(&self, action: Action, rel_path: &str) -> bool {
        !self.is_excluded(rel_path)
            && self
                .groups
                .iter()
                .any(|g| g.registration.action == action && g.set.is_match(rel_path))
    }

    /// Actions whose group matches `rel_path`, each at most once, in
    /// registration order.
    pub fn actions_for(&self, rel_path: &str) -> Vec<Action> {
        if self.is_excluded(rel_path) {
            return Vec::new();
        }

        let mut actions = Vec::new();
        for group in &self.groups {
            let action = group.registration.action;
            if !actions.contains(&action) && group.set.is_match(rel_path) {
                actions.push(action);
            }
        }
        actions
    }
}

/// `*` and `?` never match `/`; `**` spans directories.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
