//! End-to-end tests of the svault binary

mod common;

use anyhow::Result;
use std::fs;
use tempfile::TempDir;

fn root_arg(dir: &TempDir) -> String {
    dir.path().to_string_lossy().into_owned()
}

#[test]
fn test_example_config_is_loadable() -> Result<()> {
    let dir = TempDir::new()?;
    let result = svault!(dir.path(), "example-config").assert_success()?;
    assert!(result.contains_stdout("[watch]"));

    // The printed file is accepted by --config (root given on the command line)
    let config_path = dir.path().join("svault.toml");
    fs::write(&config_path, &result.stdout)?;
    let config_arg = config_path.to_string_lossy().into_owned();
    let root = root_arg(&dir);
    svault!(dir.path(), "status", &root, "--config", &config_arg).assert_success()?;
    Ok(())
}

#[test]
fn test_status_lists_profiles_and_archives() -> Result<()> {
    let dir = TempDir::new()?;
    fs::create_dir(dir.path().join("12345"))?;
    fs::write(dir.path().join("12345_2024-03-01-09.zip"), b"zip")?;
    fs::write(dir.path().join("12345_2024-03-01-10.zip"), b"zip")?;
    fs::create_dir(dir.path().join("67890"))?;

    let root = root_arg(&dir);
    let result = svault!(dir.path(), "status", &root, "--limit", "5").assert_success()?;

    assert!(result.contains_stdout("12345"));
    assert!(result.contains_stdout("(2/5)"));
    assert!(result.contains_stdout("12345_2024-03-01-09.zip"));
    assert!(result.contains_stdout("12345_2024-03-01-10.zip"));
    assert!(result.contains_stdout("(0/5)"));
    assert!(result.contains_stdout("Not running"));
    Ok(())
}

#[test]
fn test_status_empty_root() -> Result<()> {
    let dir = TempDir::new()?;
    let root = root_arg(&dir);
    let result = svault!(dir.path(), "status", &root).assert_success()?;
    assert!(result.contains_stdout("No profiles found"));
    Ok(())
}

#[test]
fn test_watch_missing_root_fails() -> Result<()> {
    let dir = TempDir::new()?;
    let missing = dir.path().join("missing").to_string_lossy().into_owned();
    let result = svault!(dir.path(), "watch", &missing).assert_failure()?;
    assert!(result.contains_stderr("missing"));
    Ok(())
}

#[test]
fn test_zero_limit_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let root = root_arg(&dir);
    svault!(dir.path(), "status", &root, "--limit", "0").assert_failure()?;
    Ok(())
}

#[test]
fn test_unknown_interval_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let root = root_arg(&dir);
    let result = svault!(dir.path(), "status", &root, "--interval", "week").assert_failure()?;
    assert!(result.contains_stderr("week"));
    Ok(())
}
