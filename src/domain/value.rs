//! 파싱/설정 결과로 전달되는 값 객체.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use url::Url;

/// `stream` 타입 옵션/인자가 가리키는 입력 원천.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSource {
    /// `-` 토큰으로 지정된 표준 입력.
    Stdin,
    File(PathBuf),
}

/// 강제 변환(coerce)까지 끝난 옵션/인자 값.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    Url(Url),
    Path(PathBuf),
    Date(DateTime<Utc>),
    Stream(StreamSource),
    List(Vec<Value>),
    /// 사용자 정의 변환기가 만든 임의 구조 값.
    Json(serde_json::Value),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathBuf> {
        match self {
            Value::Path(p) => Some(p),
            _ => None,
        }
    }

    /// 빈 문자열/false/빈 목록처럼 "값이 없는 것과 같은" 상태인지 확인한다.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::Bool(b) => !b,
            Value::List(items) => items.is_empty(),
            Value::Json(v) => v.is_null(),
            _ => false,
        }
    }

    /// 다시 coerce 가능한 문자열 형태로 직렬화한다.
    /// 모든 기본 타입에서 `coerce(stringify(coerce(x))) == coerce(x)`가 성립해야 한다.
    pub fn stringify(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
            Value::Url(u) => u.as_str().to_string(),
            Value::Path(p) => p.display().to_string(),
            Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Stream(StreamSource::Stdin) => "-".to_string(),
            Value::Stream(StreamSource::File(p)) => p.display().to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::stringify)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Json(v) => match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }

    /// 설정 출력/진단용 JSON 표현.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Json(v) => v.clone(),
            Value::Stream(StreamSource::Stdin) => serde_json::Value::String("[stdin]".into()),
            other => serde_json::Value::String(other.stringify()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Json(v) => v.serialize(serializer),
            other => serializer.serialize_str(&other.stringify()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

/// 정수로 표현 가능한 값은 소수점 없이 출력한다.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
