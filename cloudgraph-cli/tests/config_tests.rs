use clap::Parser;
use cloudgraph_cli::{Args, CliConfig, DGRAPH_HOST_ENV, dgraph_host, resolve_dgraph_host};
use cloudgraph_types::{ProviderName, Region, ServiceType};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::path::{Path, PathBuf};

fn config(json: &str) -> CliConfig {
    serde_json::from_str(json).unwrap()
}

// ── Arguments ───────────────────────────────────────────────────

#[test]
fn args_defaults() {
    let args = Args::try_parse_from(["cloudgraph"]).unwrap();
    assert!(args.providers.is_empty());
    assert_eq!(args.config, PathBuf::from(".cloud-graphrc.json"));
    assert_eq!(args.data_dir, PathBuf::from("cg-data"));
    assert_eq!(args.timeout_secs, 300);
    assert_eq!(args.retries, 0);
    assert_eq!(args.concurrency, 4);
    assert!(args.dgraph.is_none());
}

#[test]
fn args_flags() {
    let args = Args::try_parse_from([
        "cloudgraph", "aws", "azure", "-d", "http://dgraph:8080", "--dev", "--retries", "3",
    ])
    .unwrap();
    assert_eq!(args.providers, vec!["aws", "azure"]);
    assert_eq!(args.dgraph.as_deref(), Some("http://dgraph:8080"));
    assert!(args.dev);
    assert_eq!(args.retries, 3);
}

#[test]
fn zero_timeout_is_rejected() {
    assert!(Args::try_parse_from(["cloudgraph", "--timeout-secs", "0"]).is_err());
    let args = Args::try_parse_from(["cloudgraph", "--timeout-secs", "1"]).unwrap();
    assert_eq!(args.timeout_secs, 1);
}

// ── Config file ─────────────────────────────────────────────────

#[test]
fn provider_sections_exclude_cloudgraph() {
    let cfg = config(
        r#"{
            "cloudGraph": {"dgraphHost": "http://cfg:8080"},
            "aws": {"regions": "us-east-1", "resources": "alb,ec2"},
            "azure": {}
        }"#,
    );
    assert_eq!(cfg.cloud_graph.dgraph_host.as_deref(), Some("http://cfg:8080"));
    assert_eq!(
        cfg.providers_to_scan(&[]),
        vec![ProviderName::new("aws"), ProviderName::new("azure")]
    );
    assert_eq!(
        cfg.providers_to_scan(&["k8s".to_string()]),
        vec![ProviderName::new("k8s")]
    );
}

#[test]
fn repeated_requested_providers_collapse() {
    let cfg = CliConfig::default();
    let requested = ["aws", "azure", "aws", " azure "].map(String::from);
    assert_eq!(
        cfg.providers_to_scan(&requested),
        vec![ProviderName::new("aws"), ProviderName::new("azure")]
    );
}

#[test]
fn no_providers_anywhere() {
    let cfg = config(r#"{"cloudGraph": {}}"#);
    assert!(cfg.providers_to_scan(&[]).is_empty());
}

#[test]
fn selector_from_section() {
    let cfg = config(r#"{"aws": {"regions": "us-east-1, us-west-2", "resources": "ec2"}, "azure": {}}"#);
    let selector = cfg.selector(&ProviderName::new("aws")).unwrap();
    assert_eq!(
        selector.regions,
        vec![Region::new("us-east-1"), Region::new("us-west-2")]
    );
    assert_eq!(selector.resource_types, vec![ServiceType::new("ec2")]);
    assert!(cfg.selector(&ProviderName::new("azure")).is_none());
    assert!(cfg.selector(&ProviderName::new("gcp")).is_none());
}

#[test]
fn inventory_paths_resolve_against_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rc.json");
    std::fs::write(&path, r#"{"aws": {"inventory": "inv/aws-prod.json"}}"#).unwrap();
    let cfg = CliConfig::load(&path).unwrap();

    assert_eq!(
        cfg.inventory_path(&ProviderName::new("aws")),
        dir.path().join("inv/aws-prod.json")
    );
    assert_eq!(
        cfg.inventory_path(&ProviderName::new("azure")),
        dir.path().join("azure.json")
    );
}

#[test]
fn missing_config_file_is_empty() {
    let cfg = CliConfig::load(Path::new("/definitely/not/here/.cloud-graphrc.json")).unwrap();
    assert!(cfg.providers.is_empty());
}

#[test]
fn malformed_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rc.json");
    std::fs::write(&path, "{").unwrap();
    let err = CliConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}

// ── Dgraph host precedence ──────────────────────────────────────

#[test]
fn host_precedence() {
    let with_cfg = config(r#"{"cloudGraph": {"dgraphHost": "http://cfg:8080"}}"#);
    let without = CliConfig::default();

    assert_eq!(
        resolve_dgraph_host(Some("http://flag:8080"), Some("http://env:8080"), &with_cfg),
        "http://flag:8080"
    );
    assert_eq!(
        resolve_dgraph_host(None, Some("http://env:8080"), &with_cfg),
        "http://env:8080"
    );
    assert_eq!(resolve_dgraph_host(None, None, &with_cfg), "http://cfg:8080");
    assert_eq!(resolve_dgraph_host(None, Some(" "), &without), "http://localhost:8080");
}

#[test]
#[serial]
fn host_from_process_environment() {
    // SAFETY: serialised with the other environment tests.
    unsafe { std::env::set_var(DGRAPH_HOST_ENV, "http://from-env:8080") };
    let host = dgraph_host(None, &CliConfig::default());
    unsafe { std::env::remove_var(DGRAPH_HOST_ENV) };
    assert_eq!(host, "http://from-env:8080");
}

#[test]
#[serial]
fn flag_beats_process_environment() {
    unsafe { std::env::set_var(DGRAPH_HOST_ENV, "http://from-env:8080") };
    let host = dgraph_host(Some("http://flag:8080"), &CliConfig::default());
    unsafe { std::env::remove_var(DGRAPH_HOST_ENV) };
    assert_eq!(host, "http://flag:8080");
}
