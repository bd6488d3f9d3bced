//! 설정 파일 탐색/병합 어댑터.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::debug;

use super::loader::{LoaderTable, NO_EXT};
use crate::application::ports::{ConfigRequest, ConfigSource};

/// 사용자 설정 디렉터리와 현재 디렉터리 상위 경로의 rc 파일을 병합한다.
#[derive(Clone, Default)]
pub struct JsonConfigSource {
    loaders: LoaderTable,
    /// 탐색 시작 디렉터리(기본: 현재 디렉터리).
    start: Option<PathBuf>,
    /// 여기에 닿으면 탐색을 멈춘다(기본: 홈 디렉터리, 자신은 제외).
    stop: Option<PathBuf>,
    /// 사용자 설정 루트(기본: `dirs::config_dir()`).
    user_dir: Option<PathBuf>,
    skip_user_dir: bool,
}

impl JsonConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaders(mut self, loaders: LoaderTable) -> Self {
        self.loaders = loaders;
        self
    }

    pub fn start_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.start = Some(dir.into());
        self
    }

    pub fn stop_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stop = Some(dir.into());
        self
    }

    /// `None`이면 사용자 설정 디렉터리를 읽지 않는다.
    pub fn user_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.skip_user_dir = dir.is_none();
        self.user_dir = dir;
        self
    }

    /// 낮은 우선순위 → 높은 우선순위 순서의 후보 경로.
    pub fn candidate_paths(&self, app_name: &str) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(base) = self.user_config_dir() {
            paths.push(base.join(app_name).join("config.json"));
        }

        let start = self
            .start
            .clone()
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let stop = self.stop.clone().or_else(dirs::home_dir);

        let mut walked = Vec::new();
        let mut current = Some(start.as_path());
        while let Some(dir) = current {
            if stop.as_deref() == Some(dir) {
                break;
            }
            walked.push(self.rc_files(dir, app_name));
            current = dir.parent();
        }
        // 가까운 디렉터리가 나중에 병합되어 이긴다.
        for files in walked.into_iter().rev() {
            paths.extend(files);
        }
        paths
    }

    fn user_config_dir(&self) -> Option<PathBuf> {
        if self.skip_user_dir {
            return None;
        }
        self.user_dir.clone().or_else(dirs::config_dir)
    }

    fn rc_files(&self, dir: &Path, app_name: &str) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for base in [format!(".{app_name}rc"), format!(".{app_name}.config")] {
            for ext in self.loaders.extensions() {
                let name = if ext == NO_EXT {
                    base.clone()
                } else {
                    format!("{base}{ext}")
                };
                files.push(dir.join(name));
            }
        }
        files
    }
}

impl ConfigSource for JsonConfigSource {
    fn load(&self, request: &ConfigRequest) -> Result<Map<String, Value>> {
        if let Some(path) = &request.explicit {
            let loaded = self
                .loaders
                .load_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            return Ok(loaded.unwrap_or_default());
        }

        let mut merged = Map::new();
        for path in self.candidate_paths(&request.app_name) {
            if !path.is_file() {
                continue;
            }
            if let Some(values) = self.loaders.load_file(&path)? {
                debug!(path = %path.display(), keys = values.len(), "loaded config file");
                merged.extend(values);
            }
        }
        Ok(merged)
    }
}

/// 고정된 값을 돌려주는 설정 원천(임베딩/테스트용).
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    values: Map<String, Value>,
}

impl StaticConfigSource {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// JSON 객체가 아니면 빈 설정으로 취급한다.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&self, _request: &ConfigRequest) -> Result<Map<String, Value>> {
        Ok(self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> ConfigRequest {
        ConfigRequest {
            app_name: "tool".into(),
            explicit: None,
        }
    }

    #[test]
    fn test_nearer_directory_wins() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("project").join("sub");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            root.path().join("project").join(".toolrc.json"),
            r#"{"port": 1, "host": "outer"}"#,
        )
        .unwrap();
        std::fs::write(nested.join(".toolrc"), r#"{"port": 2}"#).unwrap();

        let source = JsonConfigSource::new()
            .start_dir(&nested)
            .stop_dir(root.path())
            .user_dir(None);
        let loaded = source.load(&request()).unwrap();
        assert_eq!(loaded.get("port"), Some(&json!(2)));
        assert_eq!(loaded.get("host"), Some(&json!("outer")));
    }

    #[test]
    fn test_user_dir_has_lowest_priority() {
        let root = tempfile::tempdir().unwrap();
        let user = root.path().join("user");
        let work = root.path().join("work");
        std::fs::create_dir_all(user.join("tool")).unwrap();
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(user.join("tool").join("config.json"), r#"{"a": 1, "b": 1}"#).unwrap();
        std::fs::write(work.join(".tool.config.json"), r#"{"b": 2}"#).unwrap();

        let source = JsonConfigSource::new()
            .start_dir(&work)
            .stop_dir(root.path())
            .user_dir(Some(user));
        let loaded = source.load(&request()).unwrap();
        assert_eq!(loaded.get("a"), Some(&json!(1)));
        assert_eq!(loaded.get("b"), Some(&json!(2)));
    }

    #[test]
    fn test_explicit_file_skips_discovery() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join(".toolrc"), r#"{"a": 1}"#).unwrap();
        let explicit = root.path().join("custom.json");
        std::fs::write(&explicit, r#"{"b": 2}"#).unwrap();

        let source = JsonConfigSource::new()
            .start_dir(root.path())
            .stop_dir(root.path().join("nowhere"))
            .user_dir(None);
        let loaded = source
            .load(&ConfigRequest {
                app_name: "tool".into(),
                explicit: Some(explicit),
            })
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("b"), Some(&json!(2)));
    }

    #[test]
    fn test_invalid_json_reports_path() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join(".toolrc.json"), "{ nope").unwrap();
        let source = JsonConfigSource::new()
            .start_dir(root.path())
            .stop_dir(root.path().join("nowhere"))
            .user_dir(None);
        let err = source.load(&request()).unwrap_err();
        assert!(format!("{err:#}").contains(".toolrc.json"));
    }
}
