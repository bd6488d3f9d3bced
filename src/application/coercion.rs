//! 타입 태그별 검증/변환/기본값 레지스트리.
//! 파서, 설정 병합, 프롬프트 응답 처리가 모두 이 경로로 값을 만든다.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::domain::schema::{CustomType, ValueSlot, ValueType};
use crate::domain::value::{StreamSource, Value};

/// 값 변환 실패.
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("expected a {expected}, got {raw:?}")]
    Invalid { expected: String, raw: String },
    #[error("cannot convert {raw:?} to {name}: {message}")]
    Custom {
        name: String,
        raw: String,
        message: String,
    },
    #[error("cannot resolve path {raw:?}: {source}")]
    Io {
        raw: String,
        #[source]
        source: std::io::Error,
    },
}

/// 한 타입 태그의 `{validate, coerce, default}` 묶음.
#[async_trait]
pub trait Typer: Send + Sync {
    fn name(&self) -> &str;

    /// 토큰이 이 타입으로 해석 가능한지 빠르게 판단한다.
    fn validate(&self, raw: &str) -> bool;

    async fn coerce(&self, raw: &str) -> Result<Value, CoerceError>;

    /// 값이 주어지지 않았을 때 쓰는 타입 기본값.
    fn default_value(&self) -> Option<Value> {
        None
    }
}

struct StringTyper;
struct NumberTyper;
struct BooleanTyper;
struct UrlTyper;
struct PathTyper;
struct DateTyper;
struct StreamTyper;
struct CustomTyper(CustomType);

#[async_trait]
impl Typer for StringTyper {
    fn name(&self) -> &str {
        "string"
    }
    fn validate(&self, _raw: &str) -> bool {
        true
    }
    async fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        Ok(Value::String(raw.to_string()))
    }
    fn default_value(&self) -> Option<Value> {
        Some(Value::String(String::new()))
    }
}

#[async_trait]
impl Typer for NumberTyper {
    fn name(&self) -> &str {
        "number"
    }
    fn validate(&self, raw: &str) -> bool {
        parse_number(raw).is_some()
    }
    async fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        parse_number(raw)
            .map(Value::Number)
            .ok_or_else(|| invalid(self.name(), raw))
    }
    fn default_value(&self) -> Option<Value> {
        Some(Value::Number(0.0))
    }
}

#[async_trait]
impl Typer for BooleanTyper {
    fn name(&self) -> &str {
        "boolean"
    }
    fn validate(&self, raw: &str) -> bool {
        parse_bool(raw).is_some()
    }
    async fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| invalid(self.name(), raw))
    }
    fn default_value(&self) -> Option<Value> {
        Some(Value::Bool(false))
    }
}

#[async_trait]
impl Typer for UrlTyper {
    fn name(&self) -> &str {
        "url"
    }
    fn validate(&self, raw: &str) -> bool {
        Url::parse(raw).is_ok()
    }
    async fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        Url::parse(raw)
            .map(Value::Url)
            .map_err(|_| invalid(self.name(), raw))
    }
}

#[async_trait]
impl Typer for PathTyper {
    fn name(&self) -> &str {
        "path"
    }
    fn validate(&self, raw: &str) -> bool {
        !raw.is_empty() && Path::new(raw).exists()
    }
    async fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        absolutize(raw).map(Value::Path)
    }
    fn default_value(&self) -> Option<Value> {
        std::env::current_dir().ok().map(Value::Path)
    }
}

#[async_trait]
impl Typer for DateTyper {
    fn name(&self) -> &str {
        "date"
    }
    fn validate(&self, raw: &str) -> bool {
        parse_date(raw).is_some()
    }
    async fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        parse_date(raw)
            .map(Value::Date)
            .ok_or_else(|| invalid(self.name(), raw))
    }
    fn default_value(&self) -> Option<Value> {
        Some(Value::Date(Utc::now()))
    }
}

#[async_trait]
impl Typer for StreamTyper {
    fn name(&self) -> &str {
        "stream"
    }
    fn validate(&self, raw: &str) -> bool {
        raw == "-" || (!raw.is_empty() && Path::new(raw).is_file())
    }
    async fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        if raw == "-" {
            return Ok(Value::Stream(StreamSource::Stdin));
        }
        absolutize(raw).map(|p| Value::Stream(StreamSource::File(p)))
    }
    fn default_value(&self) -> Option<Value> {
        Some(Value::Stream(StreamSource::Stdin))
    }
}

#[async_trait]
impl Typer for CustomTyper {
    fn name(&self) -> &str {
        self.0.name()
    }
    /// 사용자 타입은 변환 시점에만 실패를 판정한다.
    fn validate(&self, _raw: &str) -> bool {
        true
    }
    async fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        self.0.convert(raw).await.map_err(|err| CoerceError::Custom {
            name: self.0.name().to_string(),
            raw: raw.to_string(),
            message: format!("{err:#}"),
        })
    }
}

/// 타입 태그에 해당하는 Typer를 돌려준다.
pub fn typer_for(value_type: &ValueType) -> Box<dyn Typer> {
    match value_type {
        ValueType::String => Box::new(StringTyper),
        ValueType::Number => Box::new(NumberTyper),
        ValueType::Boolean => Box::new(BooleanTyper),
        ValueType::Url => Box::new(UrlTyper),
        ValueType::Path => Box::new(PathTyper),
        ValueType::Date => Box::new(DateTyper),
        ValueType::Stream => Box::new(StreamTyper),
        ValueType::Custom(custom) => Box::new(CustomTyper(custom.clone())),
    }
}

/// 타입 검증과 선택지 소속을 함께 확인한다.
pub fn validate_slot(slot: &dyn ValueSlot, raw: &str) -> bool {
    typer_for(slot.value_type()).validate(raw) && in_choices(slot, raw)
}

/// 선택지가 없으면 항상 true.
pub fn in_choices(slot: &dyn ValueSlot, raw: &str) -> bool {
    let choices = slot.choices();
    choices.is_empty() || choices.iter().any(|c| c.stringify() == raw)
}

pub async fn coerce_slot(slot: &dyn ValueSlot, raw: &str) -> Result<Value, CoerceError> {
    typer_for(slot.value_type()).coerce(raw).await
}

/// 명시 기본값이 없을 때 채울 값. 배열은 빈 목록이다.
pub fn type_default(slot: &dyn ValueSlot) -> Option<Value> {
    if slot.is_array() {
        return Some(Value::List(Vec::new()));
    }
    typer_for(slot.value_type()).default_value()
}

fn invalid(expected: &str, raw: &str) -> CoerceError {
    CoerceError::Invalid {
        expected: expected.to_string(),
        raw: raw.to_string(),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// RFC 3339, `YYYY-MM-DD`(UTC 자정), `YYYY-MM-DD HH:MM:SS`(UTC)를 받는다.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn absolutize(raw: &str) -> Result<PathBuf, CoerceError> {
    let path = Path::new(raw);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| CoerceError::Io {
            raw: raw.to_string(),
            source,
        })
}
