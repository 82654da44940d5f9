//! Integration tests for folder processing.

mod common;

use common::*;
use specimen_scan::batch::{collect_images, process_folder};

#[tokio::test]
async fn folder_run_reports_every_image_in_name_order() -> anyhow::Result<()> {
    let input_dir = tempfile::TempDir::new()?;
    let output_dir = tempfile::TempDir::new()?;
    write_png(input_dir.path(), "b_disk.png", &disk_image(200, 50, 230));
    write_png(input_dir.path(), "a_dark.png", &flat_image(200, [0, 0, 0]));
    write_broken_image(input_dir.path(), "c_broken.jpg");
    std::fs::write(input_dir.path().join("notes.txt"), "not an image")?;

    let summary = process_folder(input_dir.path(), output_dir.path(), three_level_config(), 2).await?;

    let names: Vec<&str> = summary.files.iter().map(|f| f.original.as_str()).collect();
    assert_eq!(names, vec!["a_dark.png", "b_disk.png", "c_broken.jpg"]);

    for outcome in &summary.files[..2] {
        let report = outcome.report.as_ref().expect("valid image should have a report");
        assert_eq!(report.records.len(), 3);
        assert!(outcome.error.is_none());
    }
    let broken = &summary.files[2];
    assert!(broken.report.is_none());
    assert!(broken.error.as_deref().unwrap_or_default().contains("c_broken.jpg"));
    assert_eq!(summary.failed_files().count(), 1);

    // Two images times three levels times two outputs
    assert_eq!(file_names(output_dir.path()).len(), 12);
    assert_eq!(summary.started_at.len(), "2024-01-01 00:00:00".len());

    Ok(())
}

#[tokio::test]
async fn invalid_configuration_fails_the_whole_batch() -> anyhow::Result<()> {
    let input_dir = tempfile::TempDir::new()?;
    let output_dir = tempfile::TempDir::new()?;
    write_png(input_dir.path(), "disk.png", &disk_image(100, 30, 230));

    let config = PipelineConfig {
        levels: 0,
        ..three_level_config()
    };
    let result = process_folder(input_dir.path(), output_dir.path(), config, 1).await;

    assert!(matches!(result, Err(Error::InvalidLevelCount(0))));
    assert!(file_names(output_dir.path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn each_scan_gets_its_own_id() -> anyhow::Result<()> {
    let input_dir = tempfile::TempDir::new()?;
    let output_dir = tempfile::TempDir::new()?;

    let first = process_folder(input_dir.path(), output_dir.path(), three_level_config(), 1).await?;
    let second = process_folder(input_dir.path(), output_dir.path(), three_level_config(), 1).await?;

    assert!(first.files.is_empty());
    assert_ne!(first.scan_id, second.scan_id);
    Ok(())
}

#[test]
fn accepted_extensions_are_case_insensitive() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    for name in ["one.PNG", "two.jpeg", "three.Gif", "four.bmp", "five"] {
        std::fs::write(dir.path().join(name), b"")?;
    }
    std::fs::create_dir(dir.path().join("six.png"))?;

    let files = collect_images(dir.path())?;
    let names: Vec<String> = files
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(names, vec!["one.PNG", "three.Gif", "two.jpeg"]);
    Ok(())
}
