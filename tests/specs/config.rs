//! Config merge priority and environment-variable expansion.

use fleet_config::ConfigLoader;
use serial_test::serial;
use std::io::Write;

fn write(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

/// S4 — a node named in both files keeps the node-list's address; a
/// node-list-only node is added; the collision is reported as a warning.
#[tokio::test]
async fn node_list_wins_on_name_collision() {
    let dir = tempfile::tempdir().unwrap();
    let system = write(
        dir.path(),
        "config.toml",
        r#"
[[nodes]]
name = "a"
host = "1.1.1.1"
port = 9001
"#,
    );
    let node_list = write(
        dir.path(),
        "nodelist.toml",
        r#"
[[nodes]]
name = "a"
host = "2.2.2.2"
port = 9001

[[nodes]]
name = "b"
host = "3.3.3.3"
port = 9001
"#,
    );

    let result = ConfigLoader::load(&system, Some(&node_list)).unwrap();

    assert_eq!(result.config.nodes.len(), 2);
    let a = result.config.nodes.iter().find(|n| n.name == "a").unwrap();
    assert_eq!(a.host, "2.2.2.2", "node-list entry must win over system config on collision");
    let b = result.config.nodes.iter().find(|n| n.name == "b").unwrap();
    assert_eq!(b.host, "3.3.3.3");
    assert!(
        result.warnings.iter().any(|w| w.contains('a')),
        "the collision on node 'a' should be reported: {:?}",
        result.warnings
    );
}

/// Invariant 2, generalized: a node present only in the system config
/// (not shadowed by the node-list) still survives the merge.
#[tokio::test]
async fn system_only_node_survives_merge() {
    let dir = tempfile::tempdir().unwrap();
    let system = write(
        dir.path(),
        "config.toml",
        r#"
[[nodes]]
name = "legacy"
host = "9.9.9.9"
port = 9001
"#,
    );
    let node_list = write(
        dir.path(),
        "nodelist.toml",
        r#"
[[nodes]]
name = "fresh"
host = "5.5.5.5"
port = 9001
"#,
    );

    let result = ConfigLoader::load(&system, Some(&node_list)).unwrap();
    let names: Vec<_> = result.config.nodes.iter().map(|n| n.name.as_str()).collect();
    assert!(names.contains(&"legacy"));
    assert!(names.contains(&"fresh"));
}

/// Invariant 3 — every `${VAR}` reference expands to the live
/// environment value, and nothing else in the file is touched.
#[tokio::test]
#[serial]
async fn env_var_expansion_round_trips_every_reference() {
    std::env::set_var("FLEET_SPEC_TEST_HOST", "198.51.100.7");
    std::env::remove_var("FLEET_SPEC_TEST_UNSET");

    let dir = tempfile::tempdir().unwrap();
    let system = write(
        dir.path(),
        "config.toml",
        r#"
[[nodes]]
name = "templated"
host = "${FLEET_SPEC_TEST_HOST}"
port = 9001
environment = "${FLEET_SPEC_TEST_UNSET}"
"#,
    );

    let result = ConfigLoader::load(&system, None).unwrap();
    let node = &result.config.nodes[0];
    assert_eq!(node.host, "198.51.100.7");
    assert_eq!(node.environment, "", "an unset variable expands to the empty string");
    assert!(
        result.warnings.iter().any(|w| w.contains("FLEET_SPEC_TEST_UNSET")),
        "expanding an unset variable must be reported: {:?}",
        result.warnings
    );

    std::env::remove_var("FLEET_SPEC_TEST_HOST");
}

#[tokio::test]
async fn missing_node_list_path_yields_zero_extra_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let system = write(dir.path(), "config.toml", "");
    let node_list = dir.path().join("does-not-exist.toml");

    let result = ConfigLoader::load(&system, Some(&node_list)).unwrap();
    assert!(result.config.nodes.is_empty());
}

#[tokio::test]
async fn missing_system_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("config.toml");
    assert!(ConfigLoader::load(&missing, None).is_err());
}
