use bandsweep::{ScanConfig, ScanError};
use serde_json::json;
use tempfile::NamedTempFile;

#[test]
fn test_load_from_file() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"{
            "start_frequency": 144000000.0,
            "end_frequency": 146000000.0,
            "fine_bandwidth": 12500.0,
            "csv_path": "/tmp/two-meter.csv"
        }"#,
    )
    .unwrap();

    let config = ScanConfig::load(file.path()).unwrap();
    assert_eq!(config.start_frequency, 144e6);
    assert_eq!(config.coarse_bandwidth(), 100_000.0);
    assert_eq!(config.csv_path.as_deref(), Some(std::path::Path::new("/tmp/two-meter.csv")));

    let params = config.resolve().unwrap();
    assert_eq!(params.end_frequency, 146e6);
    assert_eq!(params.sample_width(), 1000.0);
}

#[test]
fn test_explicit_step_and_coarse_override_defaults() {
    let config = ScanConfig::from_json(json!({
        "step": 250000.0,
        "coarse_bandwidth": 150000.0,
        "threshold": 4.5
    }))
    .unwrap();

    let params = config.resolve().unwrap();
    assert_eq!(params.step, 250_000.0);
    assert_eq!(params.coarse_bandwidth, 150_000.0);
    assert_eq!(params.threshold, 4.5);
}

#[test]
fn test_invalid_settings_rejected() {
    let cases = [
        json!({ "average_size": 0 }),
        json!({ "sample_rate": 0.0 }),
        json!({ "fft_width": -1.0 }),
        json!({ "sample_rate": 1000.0, "fft_width": 1000.0 }),
        json!({ "step": -5.0 }),
        json!({ "spread": -1.0 }),
        json!({ "dwell_seconds": -1.0 }),
        json!({ "channel_capacity": 0 }),
        json!({ "threshold": 0.0 }),
        json!({ "threshold": -2.5 }),
    ];

    for case in cases {
        let config = ScanConfig::from_json(case.clone()).unwrap();
        assert!(
            matches!(config.resolve(), Err(ScanError::InvalidConfig(_))),
            "{} should be rejected",
            case
        );
    }
}

#[test]
fn test_unknown_field_type_is_a_parse_error() {
    assert!(ScanConfig::from_json(json!({ "average_size": "many" })).is_err());
}
