//! tk-config
//!
//! Layered YAML configuration for the `tarkka` tools.
//!
//! Layers merge in order over [`DEFAULTS_YAML`]: later documents override
//! earlier ones key by key. The merged document is serialized to canonical JSON
//! and hashed (SHA-256) so a run can report exactly which settings it used.
//!
//! Config stores env var **names** for secrets, never the values. Leaf strings
//! that look like credentials are rejected with `CONFIG_SECRET_DETECTED`.

pub mod secrets;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

/// Built-in base layer.
pub const DEFAULTS_YAML: &str = r#"
data:
  file: "/tmp/tarkka_data.json"
source:
  base_url: "http://tuotanto.heyday.fi"
  path: "/fortum/tarkka/graafi.php"
particle:
  base_url: "https://api.particle.io"
  token_env: "PARTICLE_ACCESS_TOKEN"
query:
  default_count: 5
"#;

/// Ways a Particle token gets pasted from curl examples or the console.
const SECRET_PREFIXES: &[&str] = &["Bearer ", "access_token="];

/// Particle access tokens are 40 lowercase hex characters.
const PARTICLE_TOKEN_LEN: usize = 40;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
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

/// Merge [`DEFAULTS_YAML`] and then `yaml_docs` in order.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = yaml_to_json(DEFAULTS_YAML).context("built-in defaults are invalid")?;
    for raw in yaml_docs {
        merged = deep_merge(merged, yaml_to_json(raw)?);
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

fn yaml_to_json(raw: &str) -> Result<Value> {
    let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
    // An empty document parses as null; treat it as an empty layer.
    if v_yaml.is_null() {
        return Ok(serde_json::json!({}));
    }
    serde_json::to_value(v_yaml).context("yaml->json conversion failed")
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

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Secret guard
// ---------------------------------------------------------------------------

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() == PARTICLE_TOKEN_LEN && t.chars().all(|c| c.is_ascii_hexdigit()) {
        return true;
    }
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                collect_leaf_pointers(vv, &format!("{prefix}/{i}"), out);
            }
        }
        _ => out.push(if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }),
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

/// Settings the tools actually read, extracted from the merged config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarkkaConfig {
    pub data_file: PathBuf,
    pub source_base_url: String,
    pub source_path: String,
    pub particle_base_url: String,
    /// Name of the env var holding the Particle access token.
    pub particle_token_env: String,
    pub default_count: i64,
}

impl TarkkaConfig {
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let default_count = cfg
            .pointer("/query/default_count")
            .and_then(Value::as_i64)
            .context("config missing query.default_count (integer)")?;
        if default_count <= 0 {
            return Err(anyhow!(
                "query.default_count must be positive (got {default_count})"
            ));
        }

        Ok(Self {
            data_file: PathBuf::from(require_str(cfg, "/data/file")?),
            source_base_url: require_str(cfg, "/source/base_url")?,
            source_path: require_str(cfg, "/source/path")?,
            particle_base_url: require_str(cfg, "/particle/base_url")?,
            particle_token_env: require_str(cfg, "/particle/token_env")?,
            default_count,
        })
    }
}

fn require_str(cfg: &Value, pointer: &str) -> Result<String> {
    let s = cfg
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .with_context(|| format!("config missing {}", pointer.trim_start_matches('/').replace('/', ".")))?;
    Ok(s.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
