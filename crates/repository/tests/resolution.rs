//! End-to-end resolution over an in-memory registry.
//!
//! Builds a small npm-shaped fixture (left-pad with a transitive wcwidth
//! dependency) and walks it, checking which versions resolve, what the
//! descriptors carry and what lands in the cache.

use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use webmod_registry::{PackageId, RegistryPackageRoot, StaticRegistry, build_tarball, sha1_hex};
use webmod_repository::{
    ENTRY_POINT_ATTRIBUTE, EXTENDER_NAMESPACE, FORMAT_ATTRIBUTE, ID_ATTRIBUTE, RESOURCE_ROOT,
    RESOURCE_ROOT_ATTRIBUTE, Repository, RepositoryConfig, VERSION_ATTRIBUTE,
    WEB_MODULE_NAMESPACE,
};
use webmod_semver::Range;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn tarball_url(name: &str, version: &str) -> String {
    format!("https://registry.test/{name}/-/{name}-{version}.tgz")
}

fn id(s: &str) -> PackageId {
    s.parse().unwrap()
}

fn range(s: &str) -> Range {
    s.parse().unwrap()
}

/// A registry serving left-pad (four versions, 1.1.0 depending on
/// wcwidth) and wcwidth (one version, published without a checksum).
/// Returns the registry and the checksum of the left-pad 1.1.0 tarball.
fn fixture() -> (StaticRegistry, String) {
    let mut registry = StaticRegistry::new();
    let mut left_pad_versions = serde_json::Map::new();
    let mut left_pad_checksum = String::new();

    let versions: [(&str, Value, Value); 4] = [
        (
            "1.0.0",
            json!({ "name": "left-pad", "version": "1.0.0", "main": "index.js" }),
            json!({}),
        ),
        (
            "1.1.0",
            json!({ "name": "left-pad", "version": "1.1.0", "main": "./lib/index.js" }),
            json!({ "wcwidth": "^0.1.0" }),
        ),
        (
            "1.1.0-rc.1",
            json!({ "name": "left-pad", "version": "1.1.0-rc.1", "main": "index.js" }),
            json!({}),
        ),
        (
            "2.0.0",
            json!({
                "name": "left-pad",
                "version": "2.0.0",
                "main": "index.js",
                "module": "esm/index.js"
            }),
            json!({}),
        ),
    ];
    for (version, metadata, dependencies) in versions {
        let tarball = build_tarball(&[
            ("package/package.json", metadata.to_string().as_bytes()),
            ("package/lib/index.js", b"module.exports = leftPad;"),
        ])
        .unwrap();
        let checksum = sha1_hex(&tarball);
        if version == "1.1.0" {
            left_pad_checksum = checksum.clone();
        }
        let url = tarball_url("left-pad", version);
        registry.publish_resource(url.clone(), tarball);
        // Registries publish shasums in lowercase hex.
        left_pad_versions.insert(
            version.to_string(),
            json!({
                "dependencies": dependencies,
                "dist": { "tarball": url, "shasum": checksum.to_lowercase() }
            }),
        );
    }
    registry.publish_root(
        RegistryPackageRoot::from_document(id("left-pad"), &json!({ "versions": left_pad_versions }))
            .unwrap(),
    );

    let metadata = json!({ "name": "wcwidth", "version": "0.1.7", "main": "index.js" });
    let tarball =
        build_tarball(&[("package/package.json", metadata.to_string().as_bytes())]).unwrap();
    registry.publish_resource(tarball_url("wcwidth", "0.1.7"), tarball);
    registry.publish_root(
        RegistryPackageRoot::from_document(
            id("wcwidth"),
            &json!({
                "versions": {
                    "0.1.7": { "dist": { "tarball": tarball_url("wcwidth", "0.1.7") } }
                }
            }),
        )
        .unwrap(),
    );

    (registry, left_pad_checksum)
}

fn repository(registry: StaticRegistry, cache: &TempDir, config: &str) -> Repository {
    init_logging();
    Repository::new(
        Arc::new(registry),
        RepositoryConfig::from_json(config).unwrap(),
        cache.path(),
        "web.modules",
    )
    .unwrap()
}

fn resolved_versions(repository: &Repository, package: &str, requested: &str) -> Vec<String> {
    repository
        .find_providers(&id(package), &range(requested))
        .iter()
        .map(|provider| provider.version().to_string())
        .collect()
}

#[test]
fn test_walk_resolves_matches_and_transitive_dependencies() {
    let (registry, _checksum) = fixture();
    let cache = TempDir::new().unwrap();
    let repository = repository(registry, &cache, r#"{ "dependencies": { "left-pad": "^1.0.0" } }"#);

    repository.resolve();

    // 1.1.0-rc.1 is invisible to a release range, 2.0.0 is out of range.
    assert_eq!(
        resolved_versions(&repository, "left-pad", "^1.0.0"),
        ["1.0.0", "1.1.0"]
    );
    // left-pad 1.1.0 pulled wcwidth in.
    assert_eq!(repository.packages(), [id("left-pad"), id("wcwidth")]);
    assert_eq!(
        resolved_versions(&repository, "wcwidth", "^0.1.0"),
        ["0.1.7"]
    );
}

#[test]
fn test_repeated_walks_resolve_nothing_new() {
    let (registry, _checksum) = fixture();
    let cache = TempDir::new().unwrap();
    let repository = repository(registry, &cache, r#"{ "dependencies": { "left-pad": "^1.0.0" } }"#);

    repository.resolve();
    let bundle = repository.bundle(&id("left-pad")).unwrap();
    let resolved = bundle.versions().len();

    repository.resolve();
    assert!(Arc::ptr_eq(&bundle, &repository.bundle(&id("left-pad")).unwrap()));
    assert_eq!(bundle.versions().len(), resolved);
    assert_eq!(repository.bundles().len(), 2);
}

#[test]
fn test_pre_release_range_sees_tagged_versions() {
    let (registry, _checksum) = fixture();
    let cache = TempDir::new().unwrap();
    let repository = repository(
        registry,
        &cache,
        r#"{ "dependencies": { "left-pad": "^1.1.0-rc.0" } }"#,
    );

    repository.resolve();

    assert_eq!(
        resolved_versions(&repository, "left-pad", "^1.1.0-rc.0"),
        ["1.1.0-rc.1", "1.1.0"]
    );
}

#[test]
fn test_descriptor_and_jar_of_a_resolved_version() {
    let (registry, checksum) = fixture();
    let cache = TempDir::new().unwrap();
    let repository = repository(registry, &cache, r#"{ "dependencies": { "left-pad": "~1.1.0" } }"#);

    repository.resolve();
    let version = repository
        .bundle(&id("left-pad"))
        .unwrap()
        .version(&"1.1.0".parse().unwrap())
        .unwrap();

    let jar = version.jar().unwrap();
    assert_eq!(jar.symbolic_name(), "web.modules.left-pad.commonjs");
    assert_eq!(jar.version().to_string(), "1.1.0.REL");

    let capability = jar.resource().capability();
    assert_eq!(capability.namespace(), WEB_MODULE_NAMESPACE);
    let attribute = |name: &str| {
        capability
            .attribute(name)
            .map(ToString::to_string)
    };
    assert_eq!(attribute(ID_ATTRIBUTE).as_deref(), Some("left-pad"));
    assert_eq!(attribute(VERSION_ATTRIBUTE).as_deref(), Some("1.1.0.REL"));
    assert_eq!(attribute(ENTRY_POINT_ATTRIBUTE).as_deref(), Some("lib/index.js"));
    assert_eq!(attribute(FORMAT_ATTRIBUTE).as_deref(), Some("commonjs"));
    assert_eq!(attribute(RESOURCE_ROOT_ATTRIBUTE).as_deref(), Some(RESOURCE_ROOT));

    let requirements: Vec<_> = jar.resource().requirements(EXTENDER_NAMESPACE).collect();
    assert_eq!(requirements.len(), 1);
    assert_eq!(
        requirements[0].filter(),
        "(&(osgi.extender=web.module.extender)(version>=1.0.0)(!(version>=2.0.0)))"
    );

    // The jar's tree and the cache layout under the published checksum.
    let index = std::fs::read(jar.dist().join("package/lib/index.js")).unwrap();
    assert_eq!(index, b"module.exports = leftPad;");
    assert!(cache.path().join(&checksum).join("package.json").is_file());
    assert!(
        cache
            .path()
            .join(&checksum)
            .join("dist/package/package.json")
            .is_file()
    );
}

#[test]
fn test_format_override_switches_descriptor_and_symbolic_name() {
    let (registry, _checksum) = fixture();
    let cache = TempDir::new().unwrap();
    let repository = repository(
        registry,
        &cache,
        r#"{ "dependencies": { "left-pad": { "version": "2.0.0", "format": "esm" } } }"#,
    );

    repository.resolve();
    assert_eq!(resolved_versions(&repository, "left-pad", "2.0.0"), ["2.0.0"]);

    let version = repository
        .bundle(&id("left-pad"))
        .unwrap()
        .version(&"2.0.0".parse().unwrap())
        .unwrap();
    let jar = version.jar().unwrap();
    assert_eq!(jar.symbolic_name(), "web.modules.left-pad.esm");

    let capability = jar.resource().capability();
    assert_eq!(
        capability.attribute(FORMAT_ATTRIBUTE).map(ToString::to_string).as_deref(),
        Some("esm")
    );
    // The ES module entry point comes from `module`, not `main`.
    assert_eq!(
        capability
            .attribute(ENTRY_POINT_ATTRIBUTE)
            .map(ToString::to_string)
            .as_deref(),
        Some("esm/index.js")
    );
}

#[test]
fn test_version_without_checksum_caches_by_coordinates() {
    let (registry, _checksum) = fixture();
    let cache = TempDir::new().unwrap();
    let repository = repository(registry, &cache, r#"{ "dependencies": { "left-pad": "~1.1.0" } }"#);

    repository.resolve();
    let version = repository
        .bundle(&id("wcwidth"))
        .unwrap()
        .version(&"0.1.7".parse().unwrap())
        .unwrap();

    let document = version.package_json().unwrap();
    assert_eq!(document["name"], "wcwidth");
    assert!(cache.path().join("wcwidth/0.1.7/package.json").is_file());
}

#[test]
fn test_cyclic_dependencies_terminate() {
    let mut registry = StaticRegistry::new();
    registry.publish_root(
        RegistryPackageRoot::from_document(
            id("pkg-a"),
            &json!({ "versions": { "1.0.0": { "dependencies": { "pkg-b": "^1.0.0" } } } }),
        )
        .unwrap(),
    );
    registry.publish_root(
        RegistryPackageRoot::from_document(
            id("pkg-b"),
            &json!({ "versions": { "1.0.0": { "dependencies": { "pkg-a": "^1.0.0" } } } }),
        )
        .unwrap(),
    );

    let cache = TempDir::new().unwrap();
    let repository = repository(registry, &cache, r#"{ "dependencies": { "pkg-a": "^1.0.0" } }"#);
    repository.resolve();

    assert_eq!(repository.packages(), [id("pkg-a"), id("pkg-b")]);
    assert_eq!(resolved_versions(&repository, "pkg-a", "^1.0.0"), ["1.0.0"]);
    assert_eq!(resolved_versions(&repository, "pkg-b", "^1.0.0"), ["1.0.0"]);
}
