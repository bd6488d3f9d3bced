//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::level::LogLevel;
use crate::domain::schema::{AppConfig, ArgumentSpec, CommandSpec, OptionSpec, ParseSpec, PromptKind};
use crate::domain::task::{LogRecord, ProgressData};

/// 작업 수명 주기 이벤트를 받는 싱크 포트.
/// 런타임은 이 포트로만 표시 계층과 통신한다.
pub trait EventSink: Send + Sync {
    fn create(&self, key: &str, name: &str, parent: Option<&str>);
    fn start(&self, key: &str);
    fn output(&self, key: &str, line: &str);
    fn complete(&self, key: &str, message: Option<&str>);
    fn error(&self, key: &str, message: &str);
    fn skip(&self, key: &str, message: Option<&str>);
    fn progress(&self, data: &ProgressData);
    fn log(&self, record: &LogRecord);
}

/// 아무것도 하지 않는 싱크(도움말/버전 출력처럼 작업이 없는 경로용).
pub struct NullSink;

impl EventSink for NullSink {
    fn create(&self, _key: &str, _name: &str, _parent: Option<&str>) {}
    fn start(&self, _key: &str) {}
    fn output(&self, _key: &str, _line: &str) {}
    fn complete(&self, _key: &str, _message: Option<&str>) {}
    fn error(&self, _key: &str, _message: &str) {}
    fn skip(&self, _key: &str, _message: Option<&str>) {}
    fn progress(&self, _data: &ProgressData) {}
    fn log(&self, _record: &LogRecord) {}
}

/// 실행 한 번의 표시 설정(예약 옵션에서 결정된다).
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub color: bool,
    pub level: LogLevel,
    /// `--ci`가 켜지면 실시간 다시 그리기를 끈다.
    pub ci: bool,
    pub app: AppConfig,
}

/// 실행 동안 열려 있는 표시 세션.
#[async_trait]
pub trait DisplaySession: Send + Sync {
    fn sink(&self) -> Arc<dyn EventSink>;
    fn begin(&self);
    /// 마지막 프레임을 그리고 터미널 상태를 되돌린다.
    async fn finish(&self);
}

/// 표시 세션 생성 팩토리 포트.
pub trait DisplayFactory: Send + Sync {
    fn open(&self, settings: &DisplaySettings) -> Box<dyn DisplaySession>;
}

/// 비어 있는 항목 하나에 대한 프롬프트 요청.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub name: String,
    pub message: String,
    pub kind: PromptKind,
    pub choices: Vec<String>,
    pub default: Option<String>,
}

/// 대화형 입력 포트. 응답은 이름 → 원문 문자열이며 검증/변환은 코어가 한다.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn prompt(&self, requests: &[PromptRequest]) -> Result<BTreeMap<String, String>>;
}

/// 도움말/사용법 텍스트 렌더링 포트.
pub trait UsageFormatter: Send + Sync {
    /// 전체 도움말.
    fn usage(&self, spec: &ParseSpec, config: &AppConfig) -> String;
    /// 명령 경로 기준 도움말.
    fn command_usage(&self, spec: &ParseSpec, path: &[String], config: &AppConfig) -> String;
    /// `prefix command <args> [options]` 형태의 한 줄 사용법.
    fn oneline(
        &self,
        prefix: &str,
        command: &str,
        arguments: &[&ArgumentSpec],
        options: &[&OptionSpec],
    ) -> String;
    /// 명령 이름/설명 목록.
    fn command_list(&self, commands: &[CommandSpec]) -> String;
}

/// 설정 로딩 요청.
#[derive(Debug, Clone, Default)]
pub struct ConfigRequest {
    pub app_name: String,
    /// `--config`로 지정된 파일(있으면 탐색하지 않는다).
    pub explicit: Option<PathBuf>,
}

/// 설정 원천 포트. 병합이 끝난 JSON 객체를 돌려준다.
pub trait ConfigSource: Send + Sync {
    fn load(&self, request: &ConfigRequest) -> Result<serde_json::Map<String, serde_json::Value>>;
}

/// 사람이 읽는 출력 포트(stdout/stderr).
pub trait Console: Send + Sync {
    fn out(&self, line: &str);
    fn err(&self, line: &str);
}

impl<T: Console + ?Sized> Console for Arc<T> {
    fn out(&self, line: &str) {
        (**self).out(line);
    }

    fn err(&self, line: &str) {
        (**self).err(line);
    }
}
