// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

use std::fs;

use bf_brute::config::load_config;
use bf_brute::search::{search, Progress};
use bf_brute::MemoizedData;

#[test]
fn test_config_drives_search() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("increment.toml");
    fs::write(
        &path,
        r#"
[cache]
max_fragment_length = 5

[search]
lanes = 2
max_length = 6
stop_at_first = true

[[pairs]]
input = [1, 1]
output = [5]
"#,
    )
    .expect("write");

    let cfg = load_config(&path).expect("load");
    let memo = MemoizedData::new(&cfg.cache).expect("cache");
    let found = search(&memo, &cfg.plan(), &Progress::new(), |_| {}).expect("search");
    assert!(found.iter().any(|m| m.program == "++++"), "{:?}", found);
}

#[test]
fn test_invalid_config_is_reported() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("bad.toml");
    fs::write(&path, "[search]\nlanes = 0\n\n[[pairs]]\noutput = \"A\"\n").expect("write");
    let err = load_config(&path).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("lanes"), "{}", message);
    assert!(message.contains("bad.toml"), "{}", message);

    fs::write(&path, "[search\n").expect("write");
    assert!(load_config(&path).is_err());
}

#[test]
fn test_demo_configs_load() {
    let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
    for name in ["hello.toml", "linear.toml"] {
        let cfg = load_config(&demos.join(name)).unwrap_or_else(|err| panic!("{}: {:#}", name, err));
        assert!(!cfg.plan().pairs.is_empty());
    }
}
