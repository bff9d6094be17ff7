// tests/watch_table.rs

use std::error::Error;
use std::path::Path;

use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind};
use notify::{Event, EventKind};

use sitewatch::engine::Action;
use sitewatch::watch::{
    actions_for_event, registrations_from_config, GroupFingerprints, WatchRegistration, WatchTable,
};
use sitewatch_test_utils::builders::{ConfigFileBuilder, ProjectDir};

type TestResult = Result<(), Box<dyn Error>>;

fn default_table() -> Result<WatchTable, Box<dyn Error>> {
    Ok(WatchTable::from_config(&ConfigFileBuilder::new().build())?)
}

#[test]
fn default_groups_map_to_their_actions() -> TestResult {
    let table = default_table()?;

    assert_eq!(table.actions_for("src/styles/main.scss"), vec![Action::Styles]);
    assert_eq!(table.actions_for("src/styles/a/b.scss"), vec![Action::Styles]);
    assert_eq!(table.actions_for("src/js/app.js"), vec![Action::Scripts]);
    assert_eq!(table.actions_for("src/img/icons/x.svg"), vec![Action::Images]);

    assert_eq!(table.actions_for("index.html"), vec![Action::SiteRebuild]);
    assert_eq!(table.actions_for("_layouts/default.html"), vec![Action::SiteRebuild]);
    assert_eq!(table.actions_for("_includes/nav.html"), vec![Action::SiteRebuild]);

    // `*` does not cross directories.
    assert!(table.actions_for("_layouts/sub/x.html").is_empty());
    assert!(table.actions_for("blog/post.html").is_empty());

    // Wrong extension for the group.
    assert!(table.actions_for("src/styles/readme.md").is_empty());
    assert!(table.actions_for("src/js/app.ts").is_empty());
    Ok(())
}

#[test]
fn generator_output_is_never_watched() -> TestResult {
    let table = default_table()?;
    assert!(table.is_excluded("_site/index.html"));
    assert!(table.actions_for("_site/index.html").is_empty());
    assert!(!table.matches(Action::SiteRebuild, "_site/index.html"));
    assert!(table.actions_for(".git/HEAD").is_empty());
    Ok(())
}

#[test]
fn extra_patterns_and_excludes_come_from_config() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .site_watch("_posts/**/*.md")
        .exclude("src/styles/vendor/**")
        .build();
    let table = WatchTable::from_config(&cfg)?;

    assert_eq!(table.actions_for("_posts/2024/hello.md"), vec![Action::SiteRebuild]);
    assert!(table.actions_for("src/styles/vendor/reset.scss").is_empty());
    assert_eq!(table.actions_for("src/styles/site.scss"), vec![Action::Styles]);
    Ok(())
}

#[test]
fn overlapping_groups_trigger_each_action_once() -> TestResult {
    let table = WatchTable::new(
        vec![
            WatchRegistration {
                action: Action::SiteRebuild,
                patterns: vec!["**/*.html".into()],
            },
            WatchRegistration {
                action: Action::Images,
                patterns: vec!["assets/**".into()],
            },
            WatchRegistration {
                action: Action::SiteRebuild,
                patterns: vec!["assets/*.html".into()],
            },
        ],
        &[],
    )?;

    assert_eq!(
        table.actions_for("assets/page.html"),
        vec![Action::SiteRebuild, Action::Images]
    );
    Ok(())
}

#[test]
fn invalid_pattern_is_rejected() -> TestResult {
    let bad = WatchTable::new(
        vec![WatchRegistration {
            action: Action::Styles,
            patterns: vec!["src/[".into()],
        }],
        &[],
    );
    assert!(bad.is_err());
    Ok(())
}

#[test]
fn registrations_follow_source_dirs_and_extensions() -> TestResult {
    let cfg = ConfigFileBuilder::new().build();
    let regs = registrations_from_config(&cfg);

    let actions: Vec<Action> = regs.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![Action::Styles, Action::Scripts, Action::Images, Action::SiteRebuild]
    );
    for ext in &cfg.styles.extensions {
        assert!(regs[0]
            .patterns
            .contains(&format!("{}/**/*.{ext}", cfg.styles.source_dir)));
    }
    assert_eq!(regs[3].patterns, cfg.site.watch);
    Ok(())
}

#[test]
fn event_kinds_that_do_not_change_content_are_ignored() -> TestResult {
    let table = default_table()?;
    let root = Path::new("/project");
    let path = root.join("src/styles/main.scss");

    let access = Event::new(EventKind::Access(AccessKind::Any)).add_path(path.clone());
    assert!(actions_for_event(root, &table, &access).is_empty());

    let chmod = Event::new(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)))
        .add_path(path.clone());
    assert!(actions_for_event(root, &table, &chmod).is_empty());

    let write = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
        .add_path(path.clone());
    assert_eq!(
        actions_for_event(root, &table, &write).into_iter().collect::<Vec<_>>(),
        vec![Action::Styles]
    );
    Ok(())
}

#[test]
fn one_event_with_many_paths_yields_a_set() -> TestResult {
    let table = default_table()?;
    let root = Path::new("/project");

    let event = Event::new(EventKind::Create(CreateKind::File))
        .add_path(root.join("src/js/a.js"))
        .add_path(root.join("src/js/b.js"))
        .add_path(root.join("about.html"))
        .add_path(root.join("_site/about.html"))
        .add_path("/elsewhere/x.scss".into());

    let actions: Vec<Action> = actions_for_event(root, &table, &event).into_iter().collect();
    assert_eq!(actions, vec![Action::Scripts, Action::SiteRebuild]);
    Ok(())
}

#[test]
fn fingerprints_track_content_not_touches() -> TestResult {
    let project = ProjectDir::new()?;
    project.write("src/styles/main.scss", "a { color: red; }")?;
    project.write("src/js/app.js", "var a = 1;")?;
    // Excluded output must not affect any fingerprint.
    project.write("_site/index.html", "<p>old</p>")?;
    project.write("index.html", "<p>hi</p>")?;

    let table = default_table()?;
    let mut prints = GroupFingerprints::default();
    prints.prime(project.path(), &table)?;

    // Nothing changed since priming.
    assert!(!prints.refresh(project.path(), &table, Action::Styles)?);
    assert!(!prints.refresh(project.path(), &table, Action::SiteRebuild)?);

    // Rewriting identical content is not a change.
    project.write("src/styles/main.scss", "a { color: red; }")?;
    assert!(!prints.refresh(project.path(), &table, Action::Styles)?);

    project.write("src/styles/main.scss", "a { color: blue; }")?;
    assert!(prints.refresh(project.path(), &table, Action::Styles)?);
    assert!(!prints.refresh(project.path(), &table, Action::Styles)?);

    // Other groups are unaffected.
    assert!(!prints.refresh(project.path(), &table, Action::Scripts)?);

    project.write("_site/index.html", "<p>new</p>")?;
    assert!(!prints.refresh(project.path(), &table, Action::SiteRebuild)?);

    // A new file counts as a change even if empty.
    project.write("src/js/extra.js", "")?;
    assert!(prints.refresh(project.path(), &table, Action::Scripts)?);

    // So does a removal.
    std::fs::remove_file(project.join("src/js/extra.js"))?;
    assert!(prints.refresh(project.path(), &table, Action::Scripts)?);
    Ok(())
}
