#![cfg(feature = "std")]

use mbrtu::{Error, Result, RtuConfig, Thresholds};

#[test]
fn save_and_load_roundtrip() -> Result<()> {
    let path = std::env::temp_dir().join("mbrtu_config_roundtrip.json");
    if path.exists() {
        std::fs::remove_file(&path)?;
    }

    let config = RtuConfig {
        baud_rate: 19_200,
        slave_address: 17,
        register_base: 0x6B,
        register_count: 3,
        heap_budget: Some(1_024),
        ..RtuConfig::default()
    };
    let path_str = path.to_str().expect("utf-8 temp path");
    config.save_to_file(path_str)?;
    let loaded = RtuConfig::from_json_file(path_str)?;
    assert_eq!(loaded, config);
    assert_eq!(
        loaded.thresholds(),
        Thresholds {
            char_gap_us: 860,
            frame_gap_us: 2_006
        }
    );

    std::fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn missing_fields_take_defaults() -> Result<()> {
    let config = RtuConfig::from_json_str(r#"{ "slave_address": 5 }"#)?;
    assert_eq!(config.slave_address, 5);
    assert_eq!(config.baud_rate, 9_600);
    assert_eq!(config.rx_capacity, 256);
    assert_eq!(config.heap_budget, None);
    Ok(())
}

#[test]
fn invalid_documents_are_rejected() {
    assert!(matches!(
        RtuConfig::from_json_str(r#"{ "slave_address": 0 }"#),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        RtuConfig::from_json_str(r#"{ "baud_rate": "fast" }"#),
        Err(Error::Json(_))
    ));
    assert!(matches!(
        RtuConfig::from_json_file("/nonexistent/mbrtu.json"),
        Err(Error::IOError(_))
    ));
}
