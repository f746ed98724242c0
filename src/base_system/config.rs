//! 配置文件读写与带注释生成。
//!
//! The file is YAML. Unknown keys are kept, missing keys are filled from
//! `Default`, and the file is rewritten (with one comment line per field) when
//! it lacks any known field.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid yaml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    pub name: &'static str,
    pub description: &'static str,
}

pub trait ConfigSpec: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;
    fn fields() -> &'static [FieldMeta];
}

/// Resolve the config path, then load it or create it from defaults.
///
/// - `config_path` wins when given.
/// - otherwise `base_dir/FILE_NAME`, or `FILE_NAME` in the working directory.
pub fn load_or_create_with_base<T: ConfigSpec>(
    config_path: Option<&Path>,
    base_dir: Option<&Path>,
) -> Result<T, ConfigError> {
    let path = resolve_path::<T>(config_path, base_dir);
    ensure_parent(&path)?;

    if !path.exists() {
        let config = T::default();
        write_with_comments(&config, &path)?;
        return Ok(config);
    }

    let user_yaml = read_yaml(&path)?;
    let missing = has_missing_fields::<T>(&user_yaml);

    let mut merged = serde_yaml::to_value(T::default())
        .map_err(|err| ConfigError::Validation(err.to_string()))?;
    merge_values(&mut merged, user_yaml);

    let config: T =
        serde_yaml::from_value(merged).map_err(|err| ConfigError::Validation(err.to_string()))?;

    if missing {
        write_with_comments(&config, &path)?;
    }

    Ok(config)
}

pub fn write_with_comments<T: ConfigSpec>(config: &T, path: &Path) -> Result<(), ConfigError> {
    ensure_parent(path)?;
    let yaml = generate_yaml_with_comments(config)?;
    fs::write(path, yaml).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn generate_yaml_with_comments<T: ConfigSpec>(config: &T) -> Result<String, ConfigError> {
    let Value::Mapping(mapping) =
        serde_yaml::to_value(config).map_err(|err| ConfigError::Validation(err.to_string()))?
    else {
        return Err(ConfigError::Validation(
            "config must serialize to a mapping".to_string(),
        ));
    };

    let mut out = Vec::with_capacity(T::fields().len() * 2);
    for field in T::fields() {
        if !field.description.is_empty() {
            out.push(format!("# {}", field.description.replace('\n', "\n# ")));
        }
        let key = Value::String(field.name.to_string());
        let val = mapping.get(&key).cloned().unwrap_or(Value::Null);
        let entry = serde_yaml::to_string(&serde_yaml::Mapping::from_iter([(key, val)]))
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        out.push(entry.trim().to_string());
    }

    Ok(out.join("\n") + "\n")
}

fn read_yaml(path: &Path) -> Result<Value, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // 空文件按空映射处理
    if raw.trim().is_empty() {
        return Ok(Value::Mapping(serde_yaml::Mapping::new()));
    }
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn has_missing_fields<T: ConfigSpec>(user_yaml: &Value) -> bool {
    let Value::Mapping(map) = user_yaml else {
        return true;
    };
    T::fields()
        .iter()
        .any(|field| !map.contains_key(Value::String(field.name.to_string())))
}

fn merge_values(dest: &mut Value, user: Value) {
    match (dest, user) {
        (Value::Mapping(dest), Value::Mapping(src)) => {
            for (key, user_val) in src {
                match dest.get_mut(&key) {
                    Some(dest_val) => merge_values(dest_val, user_val),
                    None => {
                        dest.insert(key, user_val);
                    }
                }
            }
        }
        // A null in the user file keeps the default.
        (_, Value::Null) => {}
        (dest, other) => *dest = other,
    }
}

fn resolve_path<T: ConfigSpec>(path: Option<&Path>, base_dir: Option<&Path>) -> PathBuf {
    match (path, base_dir) {
        (Some(p), _) => p.to_path_buf(),
        (None, Some(base)) => base.join(T::FILE_NAME),
        (None, None) => PathBuf::from(T::FILE_NAME),
    }
}

fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        retries: u32,
        enabled: bool,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                name: "sample".to_string(),
                retries: 3,
                enabled: true,
            }
        }
    }

    impl ConfigSpec for Sample {
        const FILE_NAME: &'static str = "sample.yml";

        fn fields() -> &'static [FieldMeta] {
            static FIELDS: [FieldMeta; 3] = [
                FieldMeta {
                    name: "name",
                    description: "display name",
                },
                FieldMeta {
                    name: "retries",
                    description: "retry count\nsecond line",
                },
                FieldMeta {
                    name: "enabled",
                    description: "",
                },
            ];
            &FIELDS
        }
    }

    #[test]
    fn creates_commented_file_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg: Sample = load_or_create_with_base(None, Some(dir.path())).unwrap();
        assert_eq!(cfg, Sample::default());

        let written = fs::read_to_string(dir.path().join("sample.yml")).unwrap();
        assert!(written.contains("# display name\nname: sample"));
        assert!(written.contains("# retry count\n# second line\nretries: 3"));
        assert!(written.contains("enabled: true"));
    }

    #[test]
    fn merges_partial_user_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.yml");
        fs::write(&path, "retries: 9\n").unwrap();

        let cfg: Sample = load_or_create_with_base(Some(&path), None).unwrap();
        assert_eq!(cfg.retries, 9);
        assert_eq!(cfg.name, "sample");

        // missing keys trigger a rewrite that keeps the user's value
        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("retries: 9"));
        assert!(rewritten.contains("name: sample"));
    }

    #[test]
    fn null_values_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.yml");
        fs::write(&path, "name: ~\nretries: 1\nenabled: false\n").unwrap();

        let cfg: Sample = load_or_create_with_base(Some(&path), None).unwrap();
        assert_eq!(cfg.name, "sample");
        assert_eq!(cfg.retries, 1);
        assert!(!cfg.enabled);
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.yml");
        fs::write(&path, "name: [unclosed\n").unwrap();

        let err = load_or_create_with_base::<Sample>(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
