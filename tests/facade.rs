//! Facade smoke tests

use tempfile::TempDir;
use toolswap::{init_logging, process_with_config, Config, ScriptSettings};

#[test]
fn test_init_logging_twice() {
    init_logging().unwrap();
    init_logging().unwrap();
}

#[test]
fn test_process_with_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut config = Config::new();
    config.add_script("filament_change").unwrap();
    config.save_to_file(&path).unwrap();

    let mut layers = vec![
        "T0\nG1 X1 E1\n".to_string(),
        "T1\nG1 X2 E2\n".to_string(),
    ];
    let reports = process_with_config(&path, &mut layers).unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].processor, "filament_change");
    assert!(layers[1].starts_with("M600 E-30.00 L-300.00 U-300.00 X0.00 Y0.00 Z10.00"));
    assert!(matches!(config.scripts[0], ScriptSettings::FilamentChange { .. }));
}

#[test]
fn test_process_with_missing_config() {
    let dir = TempDir::new().unwrap();
    let mut layers = vec!["T0\n".to_string(), "T1\n".to_string()];

    let err = process_with_config(&dir.path().join("absent.toml"), &mut layers).unwrap_err();

    assert!(err.to_string().contains("absent.toml"));
    assert_eq!(layers[1], "T1\n");
}
