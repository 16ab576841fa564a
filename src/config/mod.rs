//! Configuration management
//!
//! Settings come from defaults, an optional config file and `XSS_*`
//! environment variables, then get validated into a single [`BridgeConfig`]
//! value. Invalid entries are logged and dropped here so nothing
//! out-of-range ever reaches the send path; the whole value is rebuilt
//! wholesale whenever settings change.

use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

use crate::mapping::SceneSnapshotMap;
use crate::osc::MixerEndpoint;

pub const DEFAULT_MIXER_HOST: &str = "192.168.1.15";
pub const DEFAULT_MIXER_PORT: u16 = 10024;

/// Cap on discrete mapping rows; larger tables go through `mapping_json`.
pub const MAX_SCENE_ROWS: usize = 20;

/// Settings as they arrive from the config sources, before validation.
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    /// Master switch; when off the bridge resolves nothing.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_mixer_host")]
    pub mixer_host: String,

    #[serde(default = "default_mixer_port")]
    pub mixer_port: u16,

    /// Discrete scene → snapshot rows. When any row has a non-empty scene
    /// name these define the whole table and `mapping_json` is ignored.
    #[serde(default)]
    pub mappings: Vec<MappingRow>,

    /// Bulk table as a raw JSON object `{"Scene": index, ...}`. Fallback
    /// for when every discrete row is blank.
    #[serde(default)]
    pub mapping_json: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingRow {
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub snapshot: i64,
}

/// Validated configuration the bridge runs on.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub enabled: bool,
    pub endpoint: MixerEndpoint,
    pub map: SceneSnapshotMap,
}

fn default_enabled() -> bool {
    true
}

fn default_mixer_host() -> String {
    DEFAULT_MIXER_HOST.to_string()
}

fn default_mixer_port() -> u16 {
    DEFAULT_MIXER_PORT
}

pub fn load_config() -> Result<BridgeConfig> {
    Ok(validate(load_raw()?))
}

fn load_raw() -> Result<RawConfig> {
    let config_dir = directories::ProjectDirs::from("com", "open-horizon-labs", "xair-scene-sync")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    load_raw_from(&config_dir)
}

/// Builds the layered config rooted at `config_dir`: defaults, then an
/// optional `config.*` file in that directory, then `XSS_*` env vars.
fn load_raw_from(config_dir: &std::path::Path) -> Result<RawConfig> {
    let config = ::config::Config::builder()
        // Start with defaults
        .set_default("enabled", true)?
        .set_default("mixer_host", DEFAULT_MIXER_HOST)?
        .set_default("mixer_port", DEFAULT_MIXER_PORT as i64)?
        // Load from config file if it exists
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy())
                .required(false),
        )
        // Override with environment variables (XSS_MIXER_HOST, XSS_ENABLED, etc.)
        .add_source(
            ::config::Environment::with_prefix("XSS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Turn raw settings into the validated runtime config.
pub fn validate(raw: RawConfig) -> BridgeConfig {
    let host = if raw.mixer_host.trim().is_empty() {
        warn!("mixer_host is blank, falling back to {DEFAULT_MIXER_HOST}");
        DEFAULT_MIXER_HOST.to_string()
    } else {
        raw.mixer_host
    };

    let port = if raw.mixer_port == 0 {
        warn!("mixer_port 0 is invalid, falling back to {DEFAULT_MIXER_PORT}");
        DEFAULT_MIXER_PORT
    } else {
        raw.mixer_port
    };

    BridgeConfig {
        enabled: raw.enabled,
        endpoint: MixerEndpoint::new(host, port),
        map: build_map(&raw.mappings, &raw.mapping_json),
    }
}

/// Discrete rows win over the bulk JSON table; the JSON is only used when
/// every row is blank. No per-key merging between the two sources.
fn build_map(rows: &[MappingRow], bulk_json: &str) -> SceneSnapshotMap {
    let rows = if rows.len() > MAX_SCENE_ROWS {
        warn!(
            extra = rows.len() - MAX_SCENE_ROWS,
            "ignoring mapping rows beyond the first {MAX_SCENE_ROWS}"
        );
        &rows[..MAX_SCENE_ROWS]
    } else {
        rows
    };

    if rows.iter().any(|row| !row.scene.trim().is_empty()) {
        map_from_rows(rows)
    } else {
        map_from_json(bulk_json)
    }
}

fn map_from_rows(rows: &[MappingRow]) -> SceneSnapshotMap {
    let mut map = SceneSnapshotMap::new();
    for row in rows {
        let scene = row.scene.trim();
        if scene.is_empty() {
            continue;
        }
        let accepted = u32::try_from(row.snapshot)
            .is_ok_and(|snapshot| map.insert(scene, snapshot));
        if !accepted {
            warn!(
                scene,
                snapshot = row.snapshot,
                "snapshot out of range (0-64), dropping row"
            );
        }
    }
    map
}

fn map_from_json(raw: &str) -> SceneSnapshotMap {
    let mut map = SceneSnapshotMap::new();
    let raw = raw.trim();
    if raw.is_empty() {
        return map;
    }

    let parsed: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("invalid JSON in mapping table: {e}");
            return map;
        }
    };
    let Some(object) = parsed.as_object() else {
        warn!("JSON mapping must be an object");
        return map;
    };

    for (scene, value) in object {
        let accepted = value
            .as_i64()
            .and_then(|n| u32::try_from(n).ok())
            .is_some_and(|snapshot| map.insert(scene.clone(), snapshot));
        if !accepted {
            warn!(scene = %scene, %value, "snapshot out of range (0-64), dropping entry");
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn row(scene: &str, snapshot: i64) -> MappingRow {
        MappingRow {
            scene: scene.to_string(),
            snapshot,
        }
    }

    #[test]
    fn discrete_rows_take_precedence_over_bulk_json() {
        let map = build_map(
            &[row("Intro", 3)],
            r#"{"Intro": 7, "BRB": 9}"#,
        );
        assert_eq!(map.resolve("Intro", true).map(|i| i.get()), Some(3));
        // Bulk entries are ignored entirely, not merged per key.
        assert_eq!(map.resolve("BRB", true), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn bulk_json_is_used_when_all_rows_are_blank() {
        let map = build_map(
            &[row("", 0), row("   ", 5)],
            r#"{"Intro": 3, "Outro": 64}"#,
        );
        assert_eq!(map.resolve("Intro", true).map(|i| i.get()), Some(3));
        assert_eq!(map.resolve("Outro", true).map(|i| i.get()), Some(64));
    }

    #[test]
    fn an_invalid_row_still_activates_row_precedence() {
        // The user filled in a row, just a bad one: the bulk JSON stays
        // ignored rather than silently taking over.
        let map = build_map(&[row("Intro", 99)], r#"{"Intro": 3}"#);
        assert!(map.is_empty());
    }

    #[test]
    fn out_of_range_rows_are_dropped() {
        let map = map_from_rows(&[row("A", -1), row("B", 65), row("C", 64), row("D", 0)]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("C", true).map(|i| i.get()), Some(64));
        // 0 is stored but resolves to nothing.
        assert_eq!(map.resolve("D", true), None);
    }

    #[test]
    fn rows_beyond_the_cap_are_ignored() {
        let mut rows: Vec<MappingRow> = (1..=21).map(|i| row(&format!("Scene {i}"), 1)).collect();
        rows[20] = row("Overflow", 2);
        let map = build_map(&rows, "");
        assert_eq!(map.len(), MAX_SCENE_ROWS);
        assert_eq!(map.resolve("Overflow", true), None);
    }

    #[test]
    fn malformed_bulk_json_yields_an_empty_map() {
        assert!(map_from_json("{not json").is_empty());
        assert!(map_from_json("[1, 2, 3]").is_empty());
        assert!(map_from_json("").is_empty());
    }

    #[test]
    fn bulk_json_drops_non_integer_and_out_of_range_values() {
        let map = map_from_json(r#"{"A": "three", "B": 65, "C": -1, "D": 3}"#);
        assert_eq!(map.len(), 1);
        assert_eq!(map.resolve("D", true).map(|i| i.get()), Some(3));
    }

    #[test]
    fn blank_host_and_zero_port_fall_back_to_defaults() {
        let config = validate(RawConfig {
            enabled: true,
            mixer_host: "  ".to_string(),
            mixer_port: 0,
            mappings: vec![],
            mapping_json: String::new(),
        });
        assert_eq!(config.endpoint, MixerEndpoint::new(DEFAULT_MIXER_HOST, DEFAULT_MIXER_PORT));
    }

    #[test]
    #[serial]
    fn env_vars_override_defaults() {
        let dir = tempfile::tempdir().unwrap();

        std::env::set_var("XSS_MIXER_PORT", "9000");
        std::env::set_var("XSS_ENABLED", "false");
        let config = validate(load_raw_from(dir.path()).unwrap());
        std::env::remove_var("XSS_MIXER_PORT");
        std::env::remove_var("XSS_ENABLED");

        assert_eq!(config.endpoint.port, 9000);
        assert!(!config.enabled);
    }

    #[test]
    #[serial]
    fn defaults_apply_without_any_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let config = validate(load_raw_from(dir.path()).unwrap());

        assert!(config.enabled);
        assert_eq!(config.endpoint.host, DEFAULT_MIXER_HOST);
        assert_eq!(config.endpoint.port, DEFAULT_MIXER_PORT);
        assert!(config.map.is_empty());
    }

    #[test]
    #[serial]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
            mixer_host = "10.0.0.7"
            mixer_port = 10023

            [[mappings]]
            scene = "Intro"
            snapshot = 3
            "#,
        )
        .unwrap();

        let config = validate(load_raw_from(dir.path()).unwrap());

        assert_eq!(config.endpoint, MixerEndpoint::new("10.0.0.7", 10023));
        assert_eq!(config.map.resolve("Intro", true).map(|i| i.get()), Some(3));
    }

    #[test]
    #[serial]
    fn env_vars_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "mixer_port = 7000\n").unwrap();

        std::env::set_var("XSS_MIXER_PORT", "9000");
        let config = validate(load_raw_from(dir.path()).unwrap());
        std::env::remove_var("XSS_MIXER_PORT");

        assert_eq!(config.endpoint.port, 9000);
    }
}
