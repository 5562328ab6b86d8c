//! Typed account configuration
//!
//! GREEN when:
//! - layered YAML merges into a validated `SimTradeConfig` with defaults
//!   applied (provider `simtxn`, 50,000.00 opening balance).
//! - an overlay layer changes the effective config and therefore the hash;
//!   key order does not.
//! - unknown keys are rejected at load instead of being silently ignored.

use simx_config::{load_layered_yaml, load_layered_yaml_from_strings, DEFAULT_INIT_MONEY};
use simx_price::Price;

const BASE: &str = r#"
accounts:
  - id: "sim-1"
    commissions_file: "conf/commissions.json"
    views:
      - id: "rubber"
        instruments: ["shfe.ru1901", "shfe.ru1905"]
  - id: "sim-2"
    provider: "simtxn"
    init_money: "200000.00"
"#;

const BASE_REORDERED: &str = r#"
accounts:
  - commissions_file: "conf/commissions.json"
    views:
      - instruments: ["shfe.ru1901", "shfe.ru1905"]
        id: "rubber"
    id: "sim-1"
  - init_money: "200000.00"
    provider: "simtxn"
    id: "sim-2"
"#;

const OVERLAY: &str = r#"
exchange_catalog: "conf/exchanges.json"
"#;

#[test]
fn defaults_are_applied() {
    let loaded = load_layered_yaml_from_strings(&[BASE]).unwrap();
    let cfg = loaded.sim_trade().unwrap();

    assert_eq!(cfg.accounts.len(), 2);
    let a = &cfg.accounts[0];
    assert_eq!(a.provider, "simtxn");
    assert_eq!(a.init_money().unwrap(), DEFAULT_INIT_MONEY);
    assert_eq!(a.views[0].instruments().unwrap().len(), 2);
    assert_eq!(cfg.accounts[1].init_money().unwrap(), Price::units(200_000));
    assert!(cfg.exchange_catalog.is_none());
}

#[test]
fn hash_tracks_content_not_key_order() {
    let a = load_layered_yaml_from_strings(&[BASE]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_REORDERED]).unwrap();
    let c = load_layered_yaml_from_strings(&[BASE, OVERLAY]).unwrap();

    assert_eq!(a.config_hash, b.config_hash);
    assert_ne!(a.config_hash, c.config_hash);
    assert_eq!(a.config_hash.len(), 64);

    let cfg = c.sim_trade().unwrap();
    assert_eq!(
        cfg.exchange_catalog.as_deref(),
        Some(std::path::Path::new("conf/exchanges.json"))
    );
}

#[test]
fn unknown_keys_rejected() {
    let typo = r#"
accounts:
  - id: "sim-1"
    init_mony: "100"
"#;
    let loaded = load_layered_yaml_from_strings(&[typo]).unwrap();
    let err = loaded.sim_trade().unwrap_err();
    assert!(format!("{err:#}").contains("init_mony"));
}

#[test]
fn files_load_in_layer_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let over = dir.path().join("over.yaml");
    std::fs::write(&base, BASE).unwrap();
    std::fs::write(&over, "accounts:\n  - id: \"only\"\n").unwrap();

    let paths = [base.to_str().unwrap(), over.to_str().unwrap()];
    let cfg = load_layered_yaml(&paths).unwrap().sim_trade().unwrap();

    // Arrays replace rather than merge.
    assert_eq!(cfg.accounts.len(), 1);
    assert_eq!(cfg.accounts[0].id, "only");
}
