use std::io::Write;

use vireo_core::config::AppConfig;
use vireo_core::error::VireoError;

#[test]
fn test_load_full_config_from_file() {
    let toml_content = r#"
[engine]
default_result_count = 5
default_temperature = 0.3
fallback_models = ["gemini-2.5-pro"]
turn_timeout_secs = 30
retrieval_fanout = 8
strict_validation = true

[model]
provider = "gemini"
model_id = "gemini-2.5-flash"
api_key = "${GEMINI_API_KEY}"

[embedding]
base_url = "http://localhost:11434/v1"
model = "nomic-embed-text"
dimensions = 768

[store]
db_path = "/tmp/vireo-test/vireo.db"
index_path = "/tmp/vireo-test/index.db"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.engine.default_result_count, 5);
    assert_eq!(config.engine.default_temperature, 0.3);
    assert_eq!(config.engine.fallback_models, vec!["gemini-2.5-pro"]);
    assert_eq!(config.engine.turn_timeout_secs, 30);
    assert_eq!(config.engine.retrieval_fanout, 8);
    assert!(config.engine.strict_validation);

    assert_eq!(config.model.provider, "gemini");
    assert_eq!(config.model.api_key, Some("${GEMINI_API_KEY}".to_string()));

    let embedding = config.embedding.expect("embedding section");
    assert_eq!(embedding.model, "nomic-embed-text");
    assert_eq!(embedding.dimensions, 768);

    assert_eq!(config.store.db_path, "/tmp/vireo-test/vireo.db");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let toml_content = r#"
[model]
provider = "ollama"
model_id = "llama3.2"
base_url = "http://localhost:11434/v1"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.engine.default_result_count, 3);
    assert_eq!(config.engine.turn_timeout_secs, 120);
    assert!(!config.engine.strict_validation);
    assert!(config.embedding.is_none());
    assert_eq!(config.store.db_path, "vireo.db");
    assert_eq!(config.store.index_path, "vireo-index.db");
}

#[test]
fn test_missing_config_file() {
    let err = AppConfig::load(std::path::Path::new("/nonexistent/vireo.toml")).unwrap_err();
    assert!(matches!(err, VireoError::ConfigNotFound(_)));
}

#[test]
fn test_malformed_config_file() {
    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(b"[model\nprovider = ").expect("write toml");

    let err = AppConfig::load(tmp.path()).unwrap_err();
    assert!(matches!(err, VireoError::Config(_)));
}
