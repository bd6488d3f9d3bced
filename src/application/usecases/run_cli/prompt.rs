//! 비어 있는 항목에 대한 대화형 입력 요청과 응답 병합.

use super::RunCliUseCase;
use crate::application::coercion::{coerce_slot, validate_slot};
use crate::application::parser::{ItemKind, ParseError, ParseResult, ParseState};
use crate::application::ports::PromptRequest;
use crate::domain::schema::{DefaultValue, PromptKind, ValueSlot, ValueType};
use crate::domain::value::Value;

pub(super) enum PromptFailure {
    Parse(ParseError),
    Io(anyhow::Error),
}

/// 응답을 검증/변환해 결과에 채운다. 검증 실패는 InvalidType 오류다.
pub(super) async fn fill(
    uc: &RunCliUseCase<'_>,
    result: &mut ParseResult,
) -> Result<(), PromptFailure> {
    let path = result.command_path.clone();
    let options = uc.spec.visible_options(&path);
    let arguments = uc.spec.active_arguments(&path);

    let mut pending: Vec<(ItemKind, &dyn ValueSlot)> = Vec::new();
    for option in options.iter().copied() {
        if wants_prompt(option, result.options.contains_key(&option.name)) {
            pending.push((ItemKind::Option, option as &dyn ValueSlot));
        }
    }
    for argument in arguments.iter().copied() {
        if wants_prompt(argument, result.arguments.contains_key(&argument.name)) {
            pending.push((ItemKind::Argument, argument as &dyn ValueSlot));
        }
    }
    if pending.is_empty() {
        return Ok(());
    }

    let requests: Vec<PromptRequest> = pending.iter().map(|(_, slot)| request_for(*slot)).collect();
    let answers = uc
        .prompter
        .prompt(&requests)
        .await
        .map_err(PromptFailure::Io)?;

    for (kind, slot) in pending {
        let Some(raw) = answers.get(slot.name()) else {
            continue;
        };
        let value = coerce_answer(kind, slot, raw, &path)
            .await
            .map_err(PromptFailure::Parse)?;
        let target = match kind {
            ItemKind::Argument => &mut result.arguments,
            _ => &mut result.options,
        };
        target.insert(slot.name().to_string(), value);
    }
    Ok(())
}

fn wants_prompt(slot: &dyn ValueSlot, bound: bool) -> bool {
    !bound && (slot.is_required() || slot.prompt().is_some())
}

/// 선언 타입에서 UI 종류를 정하고, 항목별 재정의가 있으면 그것을 쓴다.
pub(super) fn request_for(slot: &dyn ValueSlot) -> PromptRequest {
    let derived = if !slot.choices().is_empty() {
        PromptKind::Select
    } else {
        match slot.value_type() {
            ValueType::Boolean => PromptKind::Confirm,
            ValueType::Number => PromptKind::Number,
            _ => PromptKind::Input,
        }
    };
    let (kind, message) = match slot.prompt() {
        Some(spec) => (spec.kind, spec.message.clone()),
        None => (derived, slot.name().to_string()),
    };
    let default = match slot.default_value() {
        Some(DefaultValue::Literal(value)) => Some(value.stringify()),
        _ => None,
    };
    PromptRequest {
        name: slot.name().to_string(),
        message,
        kind,
        choices: slot.choices().iter().map(Value::stringify).collect(),
        default,
    }
}

async fn coerce_answer(
    kind: ItemKind,
    slot: &dyn ValueSlot,
    raw: &str,
    path: &[String],
) -> Result<Value, ParseError> {
    let parts: Vec<&str> = if slot.is_array() {
        raw.split(", ").collect()
    } else {
        vec![raw]
    };
    let mut values = Vec::with_capacity(parts.len());
    for part in parts {
        if !validate_slot(slot, part) {
            return Err(invalid(kind, slot, part, path));
        }
        let value = coerce_slot(slot, part)
            .await
            .map_err(|_| invalid(kind, slot, part, path))?;
        values.push(value);
    }
    if slot.is_array() {
        return Ok(Value::List(values));
    }
    Ok(values.pop().unwrap_or(Value::String(String::new())))
}

fn invalid(kind: ItemKind, slot: &dyn ValueSlot, value: &str, path: &[String]) -> ParseError {
    let mut state = ParseState::new(Vec::new());
    state.command_path = path.to_vec();
    ParseError::InvalidType {
        kind,
        item: slot.name().to_string(),
        value: value.to_string(),
        expected: slot.value_type().name().to_string(),
        choices: slot.choices().iter().map(Value::stringify).collect(),
        state: Box::new(state),
    }
}
