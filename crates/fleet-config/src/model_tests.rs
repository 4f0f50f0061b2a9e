use super::*;

#[test]
fn server_config_defaults_to_standard_port() {
    let config: SystemConfigFile = toml::from_str("").unwrap();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.performance.max_concurrent_connections, 100);
    assert!(config.nodes.is_empty());
}

#[test]
fn system_config_parses_legacy_inline_nodes() {
    let toml_src = r#"
[server]
port = 9200

[admin]
username = "admin"
password = "secret"

[[nodes]]
name = "web1"
host = "10.0.0.1"
port = 9001
"#;
    let config: SystemConfigFile = toml::from_str(toml_src).unwrap();
    assert_eq!(config.server.port, 9200);
    assert_eq!(config.admin.username, "admin");
    assert_eq!(config.nodes.len(), 1);
    assert_eq!(config.nodes[0].name, "web1");
}

#[test]
fn node_list_file_parses_nodes_only() {
    let toml_src = r#"
[[nodes]]
name = "web1"
host = "10.0.0.1"
port = 9001
"#;
    let file: NodeListFile = toml::from_str(toml_src).unwrap();
    assert_eq!(file.nodes.len(), 1);
}
