use knobs_logger::{FileOutput, LogFormat, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn json_file_logging_writes_events() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("integration-file-logging")
        .console(false)
        .format(LogFormat::Json)
        .env_filter("info")
        .file(FileOutput::new(&log_dir).max_files(2))
        .init()?;

    assert!(logger.writes_to_file());
    tracing::info!(option = "domain", "hello from integration test");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    assert!(contents.contains("hello from integration test"));
    assert!(contents.contains("\"option\":\"domain\""));

    Ok(())
}
