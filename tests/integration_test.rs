use ceph_exporter::config::Config;

#[test]
fn test_config_load() {
    // This assumes config/Default.toml exists relative to where cargo test is run
    let config_res = Config::load("config/Default.toml");
    assert!(config_res.is_ok(), "Failed to load default config");

    let config = config_res.unwrap();
    assert_eq!(config.server.port, 9128);
    assert!(config.collectors.is_enabled("pool_usage"));
    assert!(config.collectors.is_background("mds"));
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let config = Config::load("config/does-not-exist").expect("defaults should apply");
    assert_eq!(config.ceph.cluster, "ceph");
    assert_eq!(
        config.collectors.enabled,
        vec!["pool_usage", "mds", "rgw", "rbd_mirror"]
    );
}
