//! Configuration serialisation.

use gsf_vertex_rs::{MergerConfig, SmootherConfig};

#[test]
fn test_smoother_config_json() {
    let config = SmootherConfig::new(true).with_flat_prior_variance(2_500.0);
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("limit_components"));

    let back: SmootherConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_merger_config_from_json() {
    let config: MergerConfig =
        serde_json::from_str(r#"{"max_components": 6, "merge_threshold": 4.0}"#).unwrap();
    assert_eq!(config, MergerConfig::new(6).with_merge_threshold(4.0));
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_merger_config_round_trips() {
    let config = MergerConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""merge_threshold":null"#));

    let back: MergerConfig = serde_json::from_str(&json).unwrap();
    assert!(back.merge_threshold.is_infinite());
    assert_eq!(back, config);
}

#[test]
fn test_merger_config_threshold_may_be_omitted() {
    let config: MergerConfig = serde_json::from_str(r#"{"max_components": 2}"#).unwrap();
    assert_eq!(config, MergerConfig::new(2));
}
