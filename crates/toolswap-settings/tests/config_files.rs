//! Round trips of configuration files on disk

use tempfile::TempDir;
use toolswap_core::{FirmwareContext, FirmwareDialect};
use toolswap_postproc::{FilamentChangeParams, PauseSwapParams};
use toolswap_settings::{Config, ScriptSettings, SettingsError};

fn sample_config() -> Config {
    Config {
        firmware: FirmwareContext {
            firmware_retract: true,
            control_temperatures: false,
        },
        scripts: vec![
            ScriptSettings::PauseAtToolChange {
                enabled: true,
                params: PauseSwapParams {
                    dialect: FirmwareDialect::Repetier,
                    head_park_x: 10.0,
                    unload_amount: Some(450.0),
                    display_text: "Swap to the next color".to_string(),
                    custom_gcode_before_pause: "M300 S440 P200".to_string(),
                    ..PauseSwapParams::default()
                },
            },
            ScriptSettings::FilamentChange {
                enabled: false,
                params: FilamentChangeParams::default(),
            },
        ],
    }
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = sample_config();
    config.save_to_file(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("script = \"pause_at_tool_change\""));
    assert!(content.contains("dialect = \"repetier\""));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_unset_distances_survive_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let config = Config {
        firmware: FirmwareContext::default(),
        scripts: vec![
            ScriptSettings::FilamentChange {
                enabled: true,
                params: FilamentChangeParams {
                    initial_retract: Some(30.0),
                    later_retract: None,
                    x_position: None,
                    y_position: Some(12.0),
                },
            },
            ScriptSettings::PauseAtToolChange {
                enabled: true,
                params: PauseSwapParams {
                    unload_amount: None,
                    load_amount: None,
                    ..PauseSwapParams::default()
                },
            },
        ],
    };
    config.save_to_file(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("later_retract = false"));
    assert!(content.contains("unload_amount = false"));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);

    let pipeline = loaded.build_pipeline().unwrap();
    let mut layers = vec!["T0\n".to_string(), "T1\n".to_string(), "T0\n".to_string()];
    pipeline.process_layers(&mut layers);
    assert!(layers[1].starts_with(
        "M600 E-30.00 Y12.00 Z10.00 ; Generated by FilamentChangeOnToolChange plugin\n"
    ));

    let pause_only = Config {
        firmware: loaded.firmware,
        scripts: vec![loaded.scripts[1].clone()],
    };
    let mut layers = vec!["T0\n".to_string(), "T1\n".to_string()];
    pause_only.build_pipeline().unwrap().process_layers(&mut layers);
    assert!(layers[1].contains("M0 ; Do the actual pause\n"));
    assert!(!layers[1].contains("G1 E"));
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let config = sample_config();
    config.save_to_file(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_hand_written_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[firmware]
control_temperatures = true

[[scripts]]
script = "pause_at_tool_change"
dialect = "RepRap"
head_park_x = 5
retraction_amount = 1.5
standby_temperature = 150
"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert!(config.firmware.control_temperatures);
    assert!(!config.firmware.firmware_retract);

    let ScriptSettings::PauseAtToolChange { enabled, params } = &config.scripts[0] else {
        panic!("expected a pause script");
    };
    assert!(*enabled);
    assert_eq!(params.dialect, FirmwareDialect::RepRap);
    assert_eq!(params.head_park_x, 5.0);
    assert_eq!(params.retraction_amount, 1.5);
    assert_eq!(params.standby_temperature, 150);
    assert_eq!(params.load_amount, Some(300.0));

    let pipeline = config.build_pipeline().unwrap();
    let mut layers = vec!["T0\nG1 Z2\n".to_string(), "T1\n".to_string()];
    let reports = pipeline.process_layers(&mut layers);
    assert_eq!(reports[0].summary.markers_replaced, 1);
    assert!(layers[1].contains("M226 ; Do the actual pause\n"));
    assert!(layers[1].contains("M104 S150 ; standby temperature\n"));
}

#[test]
fn test_load_errors() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.toml");
    assert!(matches!(
        Config::load_from_file(&missing),
        Err(SettingsError::LoadError(_))
    ));
    assert_eq!(Config::load_or_default(&missing).unwrap(), Config::default());

    let yaml = dir.path().join("config.yaml");
    std::fs::write(&yaml, "scripts: []").unwrap();
    assert!(matches!(
        Config::load_from_file(&yaml),
        Err(SettingsError::UnsupportedFormat(_))
    ));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ \"scripts\": [ { \"script\": \"purge\" } ] }").unwrap();
    assert!(matches!(
        Config::load_from_file(&broken),
        Err(SettingsError::Json(_))
    ));
}
