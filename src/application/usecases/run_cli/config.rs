//! 설정 원천 값을 파싱 결과에 병합한다. CLI 값이 항상 우선한다.

use anyhow::{Context, Result, bail};
use serde_json::Value as Json;
use tracing::debug;

use super::RunCliUseCase;
use crate::application::coercion::{coerce_slot, validate_slot};
use crate::application::parser::ParseResult;
use crate::application::ports::ConfigRequest;
use crate::domain::naming::camel_case;
use crate::domain::schema::{CONFIG, OptionSpec};
use crate::domain::value::Value;

pub(super) async fn merge(uc: &RunCliUseCase<'_>, result: &mut ParseResult) -> Result<()> {
    let request = ConfigRequest {
        app_name: uc.app.name.clone(),
        explicit: result.options.get(CONFIG).and_then(Value::as_path).cloned(),
    };
    let values = uc
        .config_source
        .load(&request)
        .context("failed to load configuration")?;

    let options = uc.spec.visible_options(&result.command_path);
    for (key, raw) in values {
        let Some(option) = find_config_option(&options, &key) else {
            debug!(key = %key, "ignoring unknown config key");
            continue;
        };
        if result.options.contains_key(&option.name) || raw.is_null() {
            continue;
        }
        let value = coerce_json(option, &raw)
            .await
            .with_context(|| format!("invalid config value for {}", option.name))?;
        result.options.insert(option.name.clone(), value);
    }
    Ok(())
}

fn find_config_option<'s>(options: &[&'s OptionSpec], key: &str) -> Option<&'s OptionSpec> {
    let camel = camel_case(key);
    options
        .iter()
        .copied()
        .filter(|option| option.config)
        .find(|option| option.name == key || option.name == camel)
}

/// JSON 값을 문자열로 되돌린 뒤 옵션 타입으로 다시 변환한다.
async fn coerce_json(option: &OptionSpec, raw: &Json) -> Result<Value> {
    if option.array {
        let parts: Vec<String> = match raw {
            Json::Array(items) => items.iter().map(json_to_raw).collect(),
            Json::String(s) => s.split(", ").map(str::to_string).collect(),
            other => vec![json_to_raw(other)],
        };
        let mut values = Vec::with_capacity(parts.len());
        for part in parts {
            values.push(coerce_one(option, &part).await?);
        }
        return Ok(Value::List(values));
    }
    if raw.is_array() {
        bail!("expected a single {}, got a list", option.value_type.name());
    }
    coerce_one(option, &json_to_raw(raw)).await
}

async fn coerce_one(option: &OptionSpec, raw: &str) -> Result<Value> {
    if !validate_slot(option, raw) {
        bail!("{raw:?} is not a valid {}", option.value_type.name());
    }
    Ok(coerce_slot(option, raw).await?)
}

fn json_to_raw(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::ValueType;

    #[tokio::test]
    async fn test_coerce_json_scalars_and_lists() {
        let port = OptionSpec::new("port").kind(ValueType::Number);
        assert_eq!(
            coerce_json(&port, &serde_json::json!(8080)).await.unwrap(),
            Value::Number(8080.0)
        );
        assert!(coerce_json(&port, &serde_json::json!("abc")).await.is_err());

        let tags = OptionSpec::new("tag").kind(ValueType::String).array();
        assert_eq!(
            coerce_json(&tags, &serde_json::json!(["a", "b"])).await.unwrap(),
            Value::List(vec!["a".into(), "b".into()])
        );
        assert_eq!(
            coerce_json(&tags, &serde_json::json!("a, b")).await.unwrap(),
            Value::List(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_config_key_matches_dash_case() {
        let level = OptionSpec::new("logLevel").kind(ValueType::String);
        let hidden = OptionSpec::new("interactive").config(false);
        let options = vec![&level, &hidden];
        assert!(find_config_option(&options, "log-level").is_some());
        assert!(find_config_option(&options, "interactive").is_none());
    }
}
