// tests/copy_images.rs

use std::error::Error;

use sitewatch::compile::{AssetCopier, CancelFlag};
use sitewatch_test_utils::builders::{ConfigFileBuilder, ProjectDir};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn images_are_copied_byte_for_byte() -> TestResult {
    let project = ProjectDir::new()?;
    let png: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
    project.write("src/img/logo.png", &png)?;
    project.write("src/img/icons/arrow.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>")?;
    project.write("src/img/PHOTO.JPG", [0xff, 0xd8, 0xff, 0xe0])?;
    project.write("src/img/readme.md", "# not an image")?;
    project.write("src/img/raw.psd", [1, 2, 3])?;

    let cfg = ConfigFileBuilder::new().build();
    let copier = AssetCopier::from_config(project.path(), &cfg.images);
    let report = copier.copy_all()?;

    assert!(report.is_clean());
    assert_eq!(report.written.len(), 3);
    assert_eq!(project.read("assets/img/logo.png")?, png);
    assert_eq!(
        project.read("assets/img/icons/arrow.svg")?,
        project.read("src/img/icons/arrow.svg")?
    );
    assert!(project.exists("assets/img/PHOTO.JPG"));
    assert!(!project.exists("assets/img/readme.md"));
    assert!(!project.exists("assets/img/raw.psd"));
    assert_eq!(copier.output_dir(), project.join("assets/img"));
    Ok(())
}

#[test]
fn unchanged_images_are_not_rewritten() -> TestResult {
    let project = ProjectDir::new()?;
    project.write("src/img/a.gif", b"GIF89a")?;

    let cfg = ConfigFileBuilder::new().build();
    let copier = AssetCopier::from_config(project.path(), &cfg.images);

    assert_eq!(copier.copy_all()?.written.len(), 1);
    let again = copier.copy_all()?;
    assert!(again.written.is_empty());
    assert_eq!(again.outputs().count(), 1);

    project.write("src/img/a.gif", b"GIF89b")?;
    assert_eq!(copier.copy_all()?.written.len(), 1);
    assert_eq!(project.read("assets/img/a.gif")?, b"GIF89b");
    Ok(())
}

#[test]
fn cancelled_copy_writes_nothing() -> TestResult {
    let project = ProjectDir::new()?;
    project.write("src/img/a.png", [1u8, 2, 3])?;
    project.write("src/img/b.png", [4u8, 5, 6])?;

    let cfg = ConfigFileBuilder::new().build();
    let copier = AssetCopier::from_config(project.path(), &cfg.images);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = copier.copy_until(&cancel)?;
    assert!(report.cancelled);
    assert!(report.written.is_empty());
    assert!(!project.exists("assets/img/a.png"));

    // A fresh flag copies everything.
    let report = copier.copy_until(&CancelFlag::new())?;
    assert!(!report.cancelled);
    assert_eq!(report.written.len(), 2);
    Ok(())
}
