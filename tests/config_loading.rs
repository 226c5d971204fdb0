//! Integration tests for config loading across all file formats.

use std::path::Path;

use cf_realip::config::model::Config;
use cf_realip::config::sources::{load_file, parse_config_str};
use cf_realip::config::validation::validate;
use cf_realip::error::Error;
use cf_realip::trust::TrustEvaluator;

fn load_example(name: &str) -> String {
    let path = format!("example/{name}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

#[test]
fn yaml_example_loads_and_validates() {
    let content = load_example("cf-realip.yaml");
    let config = parse_config_str("yaml", &content, "cf-realip.yaml").unwrap();
    validate(&config).unwrap();
    assert!(config.trust.include_default);
    assert_eq!(config.trust.trusted_proxies, vec!["203.0.113.0/24"]);
}

#[test]
fn yaml_full_example_builds_an_evaluator() {
    let content = load_example("full.yaml");
    let config = parse_config_str("yaml", &content, "full.yaml").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.upstream.timeout, 2500);

    let evaluator = TrustEvaluator::from_config(&config.trust).unwrap();
    assert_eq!(evaluator.ranges().len(), 26 + 3);
    assert!(evaluator.evaluate("198.51.100.20:4000").is_trusted());
    assert!(!evaluator.evaluate("198.51.100.32:4000").is_trusted());
}

#[test]
fn invalid_example_reports_every_problem() {
    let content = load_example("invalid.yaml");
    let config = parse_config_str("yaml", &content, "invalid.yaml").unwrap();
    let errors = validate(&config).unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["trusted_proxies[1]", "trusted_proxies[2]", "url"]);

    // The evaluator itself refuses the same list at the first bad entry.
    assert!(matches!(
        TrustEvaluator::from_config(&config.trust),
        Err(Error::InvalidTrustedProxy { index: 1, .. })
    ));
}

#[tokio::test]
async fn load_file_rejects_invalid_config() {
    let err = load_file(Path::new("example/invalid.yaml")).await.unwrap_err();
    match err {
        Error::ConfigValidation { errors } => assert_eq!(errors.len(), 3),
        other => panic!("expected validation error, got {other}"),
    }
}

#[tokio::test]
async fn load_file_records_digest() {
    let loaded = load_file(Path::new("example/cf-realip.yaml")).await.unwrap();
    assert_eq!(loaded.digest.len(), 64);
    assert_eq!(loaded.path, Path::new("example/cf-realip.yaml"));
}

#[cfg(feature = "json")]
#[test]
fn json_example_loads_and_validates() {
    let content = load_example("cf-realip.json");
    let config = parse_config_str("json", &content, "cf-realip.json").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.trust.trusted_proxies.len(), 1);
}

#[cfg(feature = "toml")]
#[test]
fn toml_example_loads_and_validates() {
    let content = load_example("cf-realip.toml");
    let config = parse_config_str("toml", &content, "cf-realip.toml").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.trust.trusted_proxies.len(), 1);
}

#[cfg(all(feature = "json", feature = "toml"))]
#[test]
fn all_formats_produce_equivalent_configs() {
    let yaml_config = parse_config_str("yaml", &load_example("cf-realip.yaml"), "yaml").unwrap();
    let json_config = parse_config_str("json", &load_example("cf-realip.json"), "json").unwrap();
    let toml_config = parse_config_str("toml", &load_example("cf-realip.toml"), "toml").unwrap();

    assert_eq!(yaml_config.trust, json_config.trust);
    assert_eq!(yaml_config.trust, toml_config.trust);
    assert_eq!(yaml_config.upstream.url, json_config.upstream.url);
    assert_eq!(yaml_config.upstream.url, toml_config.upstream.url);
}

#[test]
fn unsupported_format_returns_error() {
    let result = parse_config_str("xml", "{}", "test.xml");
    assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
}

#[test]
fn missing_upstream_fails_to_parse() {
    let result: Result<Config, _> = serde_json::from_str(r#"{"trust": {}}"#);
    assert!(result.is_err());
}
