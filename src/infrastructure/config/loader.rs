//! 확장자별 설정 파일 로더 테이블.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

/// `(path, contents) -> JSON` 변환 함수.
pub type Loader = Arc<dyn Fn(&Path, &str) -> Result<Value> + Send + Sync>;

/// 확장자 없는 파일(`.namerc`)용 로더 키.
pub const NO_EXT: &str = "";

/// 확장자(`.json` 등) → 로더.
#[derive(Clone)]
pub struct LoaderTable {
    loaders: BTreeMap<String, Loader>,
}

impl Default for LoaderTable {
    fn default() -> Self {
        let mut table = Self {
            loaders: BTreeMap::new(),
        };
        table.register(".json", load_json);
        table.register(NO_EXT, load_bare);
        table
    }
}

impl LoaderTable {
    /// 같은 확장자를 다시 등록하면 덮어쓴다.
    pub fn register<F>(&mut self, ext: &str, loader: F)
    where
        F: Fn(&Path, &str) -> Result<Value> + Send + Sync + 'static,
    {
        self.loaders.insert(ext.to_string(), Arc::new(loader));
    }

    /// 등록된 확장자 목록(`NO_EXT` 포함).
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    pub fn get(&self, ext: &str) -> Option<&Loader> {
        self.loaders.get(ext)
    }

    /// 파일 하나를 읽어 JSON 객체로 돌려준다. 로더가 없으면 None.
    pub fn load_file(&self, path: &Path) -> Result<Option<Map<String, Value>>> {
        let Some(loader) = self.get(&extension_of(path)) else {
            return Ok(None);
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        match loader(path, &contents)? {
            Value::Object(map) => Ok(Some(map)),
            Value::Null => Ok(None),
            _ => bail!("config at {} is not an object", path.display()),
        }
    }
}

/// `.toolrc` → `""`, `.toolrc.json` → `".json"`, `.tool.config` → `""`.
fn extension_of(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let trimmed = name.trim_start_matches('.');
    match trimmed.rfind('.') {
        Some(idx) => {
            let ext = &trimmed[idx..];
            if ext == ".config" || ext == ".cfg" {
                NO_EXT.to_string()
            } else {
                ext.to_string()
            }
        }
        None => NO_EXT.to_string(),
    }
}

fn load_json(path: &Path, contents: &str) -> Result<Value> {
    serde_json::from_str(contents)
        .with_context(|| format!("failed to parse JSON in {}", path.display()))
}

/// 확장자 없는 파일은 JSON 객체일 때만 읽는다.
fn load_bare(path: &Path, contents: &str) -> Result<Value> {
    if contents.trim_start().starts_with('{') {
        return load_json(path, contents);
    }
    bail!("unsupported config format in {}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of_rc_files() {
        assert_eq!(extension_of(Path::new("/tmp/.toolrc")), "");
        assert_eq!(extension_of(Path::new("/tmp/.toolrc.json")), ".json");
        assert_eq!(extension_of(Path::new("/tmp/.tool.config")), "");
        assert_eq!(extension_of(Path::new("/tmp/.tool.config.json")), ".json");
    }

    #[test]
    fn test_custom_loader_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".toolrc");
        std::fs::write(&path, "port=8080").unwrap();

        let mut table = LoaderTable::default();
        assert!(table.load_file(&path).is_err());

        table.register(NO_EXT, |_, contents| {
            let mut map = Map::new();
            for line in contents.lines() {
                if let Some((k, v)) = line.split_once('=') {
                    map.insert(k.trim().to_string(), Value::String(v.trim().to_string()));
                }
            }
            Ok(Value::Object(map))
        });
        let loaded = table.load_file(&path).unwrap().unwrap();
        assert_eq!(loaded.get("port"), Some(&Value::String("8080".into())));
    }
}
