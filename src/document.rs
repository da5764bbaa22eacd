use std::io;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unsupported YAML structure in {}: {source}", path.display())]
    Convert {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_owned(),
        },
        _ => LoadError::Io {
            path: path.to_owned(),
            source,
        },
    })
}

/// Parses a YAML file into a generic tree. Mapping keys keep their source
/// order, `<<` merge keys are applied and scalar keys such as `200` become
/// strings.
pub fn load_yaml(path: impl AsRef<Path>) -> Result<Value, LoadError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading yaml document");
    let content = read(path)?;
    let yaml_error = |source: serde_yaml::Error| LoadError::Yaml {
        path: path.to_owned(),
        source,
    };
    let mut document =
        serde_yaml::from_str::<serde_yaml::Value>(&content).map_err(yaml_error)?;
    document.apply_merge().map_err(yaml_error)?;
    serde_json::to_value(document).map_err(|source| LoadError::Convert {
        path: path.to_owned(),
        source,
    })
}

pub fn load_json(path: impl AsRef<Path>) -> Result<Value, LoadError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading json document");
    let content = read(path)?;
    serde_json::from_str::<Value>(&content).map_err(|source| LoadError::Json {
        path: path.to_owned(),
        source,
    })
}

/// Files directly inside `dir` with the given extension, sorted by name.
pub fn files_with_extension(
    dir: impl AsRef<Path>,
    extension: &str,
) -> Result<Vec<PathBuf>, LoadError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: dir.to_owned(),
        },
        _ => LoadError::Io {
            path: dir.to_owned(),
            source,
        },
    })?;
    let files = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .sorted()
        .collect();
    Ok(files)
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn yaml_keeps_key_order_and_stringifies_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.yaml");
        fs::write(&path, "zeta: 1\nalpha:\n  200: ok\n  404: missing\n").unwrap();

        let document = load_yaml(&path).unwrap();
        let keys: Vec<_> = document.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        let codes: Vec<_> = document["alpha"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(codes, vec!["200", "404"]);
    }

    #[test]
    fn yaml_merge_keys_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.yaml");
        fs::write(
            &path,
            "base: &b\n  schema:\n    $ref: '#/components/schemas/X'\nderived:\n  <<: *b\n  extra: 1\n",
        )
        .unwrap();

        let document = load_yaml(&path).unwrap();
        let derived = document["derived"].as_object().unwrap();
        assert!(!derived.contains_key("<<"));
        assert_eq!(derived["schema"]["$ref"], "#/components/schemas/X");
        assert_eq!(derived["extra"], 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_json(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn malformed_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"title\": ").unwrap();
        assert!(matches!(load_json(&path), Err(LoadError::Json { .. })));
    }

    #[test]
    fn lists_files_sorted_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["post.json", "brand.json", "notes.txt", "api.yaml"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let files = files_with_extension(dir.path(), "json").unwrap();
        let stems: Vec<_> = files.iter().map(|path| file_stem(path)).collect();
        assert_eq!(stems, vec!["brand", "post"]);
    }
}
