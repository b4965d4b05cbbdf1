//! Integration tests for loading configuration documents.
//!
//! Test coverage:
//! - Local files with comments, includes and include fallbacks
//! - Embedded resources, optional and mandatory
//! - Registered default resources
//! - Loading through a non-local filesystem

use std::path::{Path, PathBuf};

use strata_config::{
    ConfigError, EmbeddedResources, Location, MemoryFileSystem, ResourceNamespace,
    load_defaults, load_from_embedded_resource, load_from_local_file, load_from_path,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("conf")
        .join(name)
}

fn resources() -> ResourceNamespace {
    ResourceNamespace::new(
        EmbeddedResources::new()
            .with_static("defaults.xml", include_bytes!("fixtures/conf/defaults.xml"))
            .with_static("site.xml", include_bytes!("fixtures/conf/site.xml")),
    )
}

#[test]
fn test_local_file_with_comments_and_includes() {
    let path = fixture("site.xml");
    let set = load_from_local_file(&path).expect("fixture should load");

    assert_eq!(
        set.sorted_keys(),
        vec![
            "cluster.name",
            "cluster.optional",
            "cluster.replication",
            "network.bind",
            "network.port",
        ]
    );
    assert_eq!(set.get("network.port"), Some("8020"));
    assert_eq!(set.get("cluster.optional"), Some("fallback"));
    assert!(set.is_final("cluster.replication"));

    // Included values are attributed to the document that was loaded, not to
    // the fragment or to what the fragment claims.
    let origin = path.display().to_string();
    for key in set.sorted_keys() {
        assert_eq!(set.origins_of(key), [origin.clone()], "origin of {key}");
    }
}

#[test]
fn test_missing_local_file() {
    let err = load_from_local_file(&fixture("absent.xml")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
    assert!(err.subject().ends_with("absent.xml"));
}

#[test]
fn test_optional_resource_miss_is_empty() {
    let set = load_from_embedded_resource(&resources(), "missing.xml", false)
        .expect("optional miss should not fail");
    assert!(set.is_empty());
}

#[test]
fn test_mandatory_resource_miss_is_not_found() {
    let err = load_from_embedded_resource(&resources(), "missing.xml", true).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
    assert_eq!(err.subject(), "missing.xml");
}

#[test]
fn test_relative_include_in_resource_is_parse_error() {
    let err = load_from_embedded_resource(&resources(), "site.xml", true).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("fragments/network.xml"));
}

#[test]
fn test_registered_defaults() {
    let ns = resources();
    assert!(ns.register_default("defaults.xml"));
    assert!(!ns.register_default("missing.xml"));

    let set = load_defaults(&ns).unwrap();
    assert_eq!(set.get("cluster.name"), Some("default"));
    assert_eq!(set.origins_of("cluster.replication"), ["defaults.xml"]);
}

#[test]
fn test_includes_across_uri_locations() {
    let fs = MemoryFileSystem::new();
    fs.insert(
        "hdfs://nn:8020/deploy/conf/site.xml",
        r#"<configuration xmlns:xi="http://www.w3.org/2001/XInclude">
             <xi:include href="../shared/net.xml"/>
           </configuration>"#,
    );
    fs.insert(
        "hdfs://nn:8020/deploy/shared/net.xml",
        "<configuration><property><name>port</name><value>8020</value></property></configuration>",
    );

    let path = Location::new("hdfs://nn:8020/deploy/conf/site.xml");
    let set = load_from_path(&fs, &path).unwrap();
    assert_eq!(set.get("port"), Some("8020"));
    assert_eq!(set.origins_of("port"), ["hdfs://nn:8020/deploy/conf/site.xml"]);
}
