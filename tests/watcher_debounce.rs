// tests/watcher_debounce.rs

use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration, Instant};

use sitewatch::engine::{Action, RuntimeEvent, TriggerReason};
use sitewatch::watch::{spawn_watcher, WatchOptions, WatchTable, WatcherHandle};
use sitewatch_test_utils::builders::{ConfigFileBuilder, ProjectDir};
use sitewatch_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Source tree with every watched directory already in place, so the
/// recursive watch covers them from the start.
fn project() -> Result<ProjectDir, Box<dyn Error>> {
    let project = ProjectDir::new()?;
    project.write("src/styles/main.scss", "body { margin: 0; }")?;
    project.write("src/styles/partials/_nav.scss", "nav { color: red; }")?;
    project.write("src/js/app.js", "function app() {}")?;
    project.write("src/img/logo.svg", "<svg/>")?;
    project.write("_site/index.html", "<html></html>")?;
    Ok(project)
}

fn watch(
    project: &ProjectDir,
    use_hash: bool,
) -> Result<(WatcherHandle, mpsc::Receiver<RuntimeEvent>), Box<dyn Error>> {
    let cfg = ConfigFileBuilder::new().use_hash(use_hash).build();
    let table = Arc::new(WatchTable::from_config(&cfg)?);
    let (tx, rx) = mpsc::channel(64);
    let handle = spawn_watcher(
        project.path(),
        table,
        tx,
        WatchOptions {
            debounce: DEBOUNCE,
            use_hash,
        },
    )?;
    Ok((handle, rx))
}

/// Actions triggered within `window`, in arrival order.
async fn triggers(rx: &mut mpsc::Receiver<RuntimeEvent>, window: Duration) -> Vec<Action> {
    let deadline = Instant::now() + window;
    let mut seen = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        if let RuntimeEvent::ActionTriggered { action, reason } = event {
            assert_eq!(reason, TriggerReason::FileWatch);
            seen.push(action);
        }
    }
    seen
}

fn sorted(mut actions: Vec<Action>) -> Vec<Action> {
    actions.sort();
    actions
}

#[tokio::test]
async fn burst_of_writes_triggers_each_action_once() -> TestResult {
    init_tracing();
    let project = project()?;
    let (_handle, mut rx) = watch(&project, false)?;
    sleep(Duration::from_millis(300)).await;

    for i in 0..5 {
        project.write("src/styles/main.scss", format!("body {{ margin: {i}px; }}"))?;
        project.write(&format!("src/styles/partials/_extra{i}.scss"), "a { b: c; }")?;
        sleep(Duration::from_millis(30)).await;
    }
    project.write("src/js/app.js", "function app() { return 1; }")?;
    // Excluded output never triggers.
    project.write("_site/index.html", "<html>rebuilt</html>")?;

    let seen = triggers(&mut rx, Duration::from_secs(2)).await;
    assert_eq!(sorted(seen), vec![Action::Styles, Action::Scripts]);
    Ok(())
}

#[tokio::test]
async fn separate_bursts_trigger_separately() -> TestResult {
    init_tracing();
    let project = project()?;
    let (_handle, mut rx) = watch(&project, false)?;
    sleep(Duration::from_millis(300)).await;

    project.write("src/img/logo.svg", "<svg>1</svg>")?;
    assert_eq!(triggers(&mut rx, Duration::from_secs(1)).await, vec![Action::Images]);

    project.write("src/img/logo.svg", "<svg>2</svg>")?;
    assert_eq!(triggers(&mut rx, Duration::from_secs(1)).await, vec![Action::Images]);
    Ok(())
}

#[tokio::test]
async fn unchanged_content_is_suppressed_with_hashing() -> TestResult {
    init_tracing();
    let project = project()?;
    let (_handle, mut rx) = watch(&project, true)?;
    sleep(Duration::from_millis(500)).await;

    // Same bytes rewritten.
    project.write("src/styles/main.scss", "body { margin: 0; }")?;
    assert!(triggers(&mut rx, Duration::from_secs(1)).await.is_empty());

    project.write("src/styles/main.scss", "body { margin: 1px; }")?;
    assert_eq!(triggers(&mut rx, Duration::from_secs(1)).await, vec![Action::Styles]);
    Ok(())
}

#[tokio::test]
async fn files_outside_every_group_are_ignored() -> TestResult {
    let project = project()?;
    let (_handle, mut rx) = watch(&project, false)?;
    sleep(Duration::from_millis(300)).await;

    project.write("README.md", "# notes")?;
    project.write("src/styles/notes.txt", "not a stylesheet")?;
    assert!(triggers(&mut rx, Duration::from_millis(800)).await.is_empty());
    Ok(())
}
