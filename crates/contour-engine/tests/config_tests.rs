//! Tests for loading and overriding pipeline configuration.

use contour_engine::{
    BoundingBox, ContourConfig, ContourError, ContourMode, FitPolicy, Threshold,
};
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ============================================================================
// File and JSON loading
// ============================================================================

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"{
            "thresholds": { "levels": [0.0, 1.0, 2.0], "mode": "isobands" },
            "extract": { "close_frame": true },
            "fit": { "policy": "cardinal", "tension": 0.5 },
            "timeout_ms": 5000
        }"#,
    );

    let config = ContourConfig::from_file(file.path()).unwrap();
    assert_eq!(config.thresholds.mode, ContourMode::Isobands);
    assert!(config.extract.close_frame);
    assert_eq!(config.fit.policy, FitPolicy::Cardinal);
    assert_eq!(config.fit.tension, 0.5);
    // Unspecified fields keep their defaults
    assert_eq!(config.fit.tolerance, 0.1);
    assert!(config.repair.enabled);
    assert_eq!(config.timeout().map(|d| d.as_millis()), Some(5000));

    let thresholds = config.thresholds.resolve(0.0, 2.0).unwrap();
    assert_eq!(
        thresholds,
        vec![Threshold::band(0.0, 1.0), Threshold::band(1.0, 2.0)]
    );
}

#[test]
fn test_empty_object_is_default() {
    let config = ContourConfig::from_json("{}").unwrap();
    assert_eq!(config, ContourConfig::default());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ContourConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ContourError::Io(_)));
}

#[test]
fn test_malformed_json_is_json_error() {
    let file = write_config("{ \"fit\": ");
    let err = ContourConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ContourError::Json(_)));
}

#[test]
fn test_invalid_values_rejected() {
    for json in [
        r#"{ "fit": { "tolerance": 0 } }"#,
        r#"{ "fit": { "tension": 1.5 } }"#,
        r#"{ "fit": { "corner_angle_deg": 180 } }"#,
        r#"{ "thresholds": { "interval": -1 } }"#,
        r#"{ "thresholds": { "levels": [2, 1], "mode": "isobands" } }"#,
        r#"{ "repair": { "clip": { "min_x": 5, "min_y": 0, "max_x": 5, "max_y": 10 } } }"#,
        r#"{ "timeout_ms": 0 }"#,
    ] {
        let err = ContourConfig::from_json(json).unwrap_err();
        assert!(matches!(err, ContourError::Config(_)), "{} gave {:?}", json, err);
    }
}

#[test]
fn test_serialize_round_trip() {
    let mut config = ContourConfig::default();
    config.repair.clip = Some(BoundingBox::new(-10.0, -5.0, 10.0, 5.0));
    config.fit.policy = FitPolicy::Tight;
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(ContourConfig::from_json(&json).unwrap(), config);
}

// ============================================================================
// Variable overrides
// ============================================================================

#[test]
fn test_variable_overrides() {
    let vars: HashMap<&str, &str> = [
        ("CONTOUR_INTERVAL", "2.5"),
        ("CONTOUR_CLOSE_FRAME", "yes"),
        ("CONTOUR_REPAIR", "false"),
        ("CONTOUR_FIT_TENSION", "0.25"),
        ("CONTOUR_CORNER_ANGLE", "45"),
    ]
    .into_iter()
    .collect();

    let mut config = ContourConfig::default();
    config.apply_vars(|key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(config.thresholds.interval, Some(2.5));
    assert!(config.extract.close_frame);
    assert!(!config.repair.enabled);
    assert_eq!(config.fit.tension, 0.25);
    assert_eq!(config.fit.corner_angle_deg, 45.0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_unparseable_overrides_ignored() {
    let vars: HashMap<&str, &str> = [
        ("CONTOUR_MODE", "contours"),
        ("CONTOUR_FIT_POLICY", "bspline"),
        ("CONTOUR_CLIP_BBOX", "1,2,3"),
        ("CONTOUR_TIMEOUT_MS", "soon"),
    ]
    .into_iter()
    .collect();

    let mut config = ContourConfig::default();
    config.apply_vars(|key| vars.get(key).map(|v| v.to_string()));
    assert_eq!(config, ContourConfig::default());
}

#[test]
fn test_overrides_apply_on_top_of_file() {
    let file = write_config(r#"{ "fit": { "policy": "cardinal" } }"#);
    let mut config = ContourConfig::from_file(file.path()).unwrap();
    config.apply_vars(|key| (key == "CONTOUR_FIT_POLICY").then(|| "approximate".to_string()));
    assert_eq!(config.fit.policy, FitPolicy::Approximate);
}
