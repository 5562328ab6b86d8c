//! simx-config
//!
//! Layered YAML configuration for simulated trading accounts.
//!
//! # Contract
//! - One or more YAML documents are merged in order: earlier docs are base,
//!   later docs override (objects merge key-by-key, everything else replaces).
//! - Leaf strings that look like credentials abort the load.
//! - The merged document is rendered as canonical JSON (sorted keys) and
//!   hashed with SHA-256; the hash identifies the effective configuration.
//! - The merged document is then deserialised into [`SimTradeConfig`] with
//!   unknown keys rejected, and validated once.  Downstream code never sees
//!   an untyped map.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use simx_calendar::Instrument;
use simx_price::{parse_price, Price};

/// Provider name of the built-in simulated session.
pub const DEFAULT_PROVIDER: &str = "simtxn";

/// Opening balance when an account does not set one (or sets zero).
pub const DEFAULT_INIT_MONEY: Price = Price::units(50_000);

/// Known secret-like prefixes. Account configs never need credentials, so
/// any leaf string starting with one of these is a pasted secret.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",
    "sk_live",
    "sk_test",
    "AKIA",
    "-----BEGIN",
    "ghp_",
    "gho_",
    "glpat-",
    "xoxb-",
    "xoxp-",
];

// ---------------------------------------------------------------------------
// Typed configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimTradeConfig {
    /// Exchange catalog JSON; `None` selects the shipped catalog.
    #[serde(default)]
    pub exchange_catalog: Option<PathBuf>,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub id: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Decimal text, e.g. `"50000.00"`.
    #[serde(default)]
    pub init_money: Option<String>,
    /// Fee schedule JSON read at connect time.  A missing file fails the
    /// connect, not the load.
    #[serde(default)]
    pub commissions_file: Option<PathBuf>,
    #[serde(default)]
    pub views: Vec<AccountViewConfig>,
}

/// A named subset of an account's instruments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountViewConfig {
    pub id: String,
    #[serde(default)]
    pub instruments: Vec<String>,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

impl AccountConfig {
    /// Minimal account with defaults for everything but the id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider: default_provider(),
            init_money: None,
            commissions_file: None,
            views: Vec::new(),
        }
    }

    /// Opening balance.  Absent or zero falls back to [`DEFAULT_INIT_MONEY`].
    pub fn init_money(&self) -> Result<Price> {
        let Some(raw) = self.init_money.as_deref() else {
            return Ok(DEFAULT_INIT_MONEY);
        };
        let parsed = parse_price(raw)
            .with_context(|| format!("account {}: bad init_money '{raw}'", self.id))?;
        match parsed {
            Some(p) if p == Price::ZERO => Ok(DEFAULT_INIT_MONEY),
            Some(p) if p.is_negative() => bail!("account {}: init_money must not be negative", self.id),
            Some(p) => Ok(p),
            None => bail!("account {}: init_money must be a number", self.id),
        }
    }
}

impl AccountViewConfig {
    pub fn instruments(&self) -> Result<Vec<Instrument>> {
        self.instruments
            .iter()
            .map(|s| {
                s.parse::<Instrument>()
                    .with_context(|| format!("view {}: bad instrument '{s}'", self.id))
            })
            .collect()
    }
}

impl SimTradeConfig {
    /// Load-time checks.  Run once; the config is immutable afterwards.
    pub fn validate(&self) -> Result<()> {
        let mut account_ids = BTreeSet::new();
        let mut view_ids = BTreeSet::new();
        for acct in &self.accounts {
            if acct.id.trim().is_empty() {
                bail!("CONFIG_INVALID: account id must not be empty");
            }
            if !account_ids.insert(acct.id.as_str()) {
                bail!("CONFIG_INVALID: duplicate account id '{}'", acct.id);
            }
            if acct.provider.trim().is_empty() {
                bail!("CONFIG_INVALID: account {} has an empty provider", acct.id);
            }
            acct.init_money()
                .with_context(|| format!("CONFIG_INVALID: account {}", acct.id))?;
            for view in &acct.views {
                if !view_ids.insert(view.id.as_str()) {
                    bail!("CONFIG_INVALID: duplicate view id '{}'", view.id);
                }
                view.instruments()
                    .with_context(|| format!("CONFIG_INVALID: account {}", acct.id))?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Layered loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Deserialise into the typed account config and validate it.
    pub fn sim_trade(&self) -> Result<SimTradeConfig> {
        let cfg: SimTradeConfig = serde_json::from_value(self.config_json.clone())
            .context("CONFIG_INVALID: config does not match the account schema")?;
        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty document parses as null; treat it as an empty layer.
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Load layered YAML files straight into a validated [`SimTradeConfig`].
pub fn load_sim_trade_config(paths: &[&str]) -> Result<(LoadedConfig, SimTradeConfig)> {
    let loaded = load_layered_yaml(paths)?;
    let cfg = loaded.sim_trade()?;
    Ok((loaded, cfg))
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_strings(v, "", &mut leaves);
    for (ptr, s) in leaves {
        if looks_like_secret(s) {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
    }
    Ok(())
}

fn collect_leaf_strings<'a>(v: &'a Value, prefix: &str, out: &mut Vec<(String, &'a str)>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, k.replace('~', "~0").replace('/', "~1"));
                collect_leaf_strings(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                collect_leaf_strings(vv, &format!("{prefix}/{i}"), out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.as_str())),
        _ => {}
    }
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
