//! 파싱/검증 오류 분류.

use std::fmt;

use thiserror::Error;
use unicode_width::UnicodeWidthStr;

use crate::domain::schema::{ArgumentSpec, CommandSpec, OptionSpec};

/// 오류가 가리키는 항목 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Command,
    Option,
    Argument,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Command => "command",
            ItemKind::Option => "option",
            ItemKind::Argument => "argument",
        })
    }
}

/// 파서 커서. 오류마다 스냅샷이 함께 실린다.
#[derive(Debug, Clone)]
pub struct ParseState {
    /// 공백으로 다시 이은 전체 토큰.
    pub tokens: Vec<String>,
    pub token: String,
    /// 재구성한 명령줄에서 현재 토큰의 바이트 위치.
    pub position: usize,
    pub command_path: Vec<String>,
    /// 현재 위치에서 고를 수 있는 하위 명령.
    pub commands: Vec<CommandSpec>,
    pub options: Vec<OptionSpec>,
    pub arguments: Vec<ArgumentSpec>,
    pub saw_double_dash: bool,
    pub can_get_commands: bool,
    pub argument_index: usize,
    /// 값을 기다리는 옵션 이름.
    pub open_option: Option<String>,
    pub help: bool,
}

impl ParseState {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            token: String::new(),
            position: 0,
            command_path: Vec::new(),
            commands: Vec::new(),
            options: Vec::new(),
            arguments: Vec::new(),
            saw_double_dash: false,
            can_get_commands: true,
            argument_index: 0,
            open_option: None,
            help: false,
        }
    }

    pub fn command_line(&self) -> String {
        self.tokens.join(" ")
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{reason} (at position {position})")]
    Structural {
        reason: String,
        position: usize,
        state: Box<ParseState>,
    },
    #[error("No such {kind}: {item}")]
    NotFound {
        kind: ItemKind,
        item: String,
        state: Box<ParseState>,
    },
    #[error("{}", demand_message(.kind, .item))]
    Demand {
        kind: ItemKind,
        item: Option<String>,
        state: Box<ParseState>,
    },
    #[error("{}", count_message(.kind, .item, .actual, .expected))]
    Count {
        kind: ItemKind,
        item: String,
        actual: usize,
        expected: (usize, usize),
        state: Box<ParseState>,
    },
    #[error("{}", invalid_message(.kind, .item, .value, .expected, .choices))]
    InvalidType {
        kind: ItemKind,
        item: String,
        value: String,
        expected: String,
        choices: Vec<String>,
        state: Box<ParseState>,
    },
}

impl ParseError {
    pub fn state(&self) -> &ParseState {
        match self {
            ParseError::Structural { state, .. }
            | ParseError::NotFound { state, .. }
            | ParseError::Demand { state, .. }
            | ParseError::Count { state, .. }
            | ParseError::InvalidType { state, .. } => state,
        }
    }

    /// 구조 오류일 때 명령줄과 캐럿 표시를 여러 줄로 만든다.
    pub fn pointer(&self) -> Option<String> {
        let ParseError::Structural {
            reason,
            position,
            state,
        } = self
        else {
            return None;
        };
        let line = state.command_line();
        let width = line
            .get(..*position)
            .map(UnicodeWidthStr::width)
            .unwrap_or(*position);
        let padding = " ".repeat(width);
        Some(format!(
            "Invalid input:\n  {line}\n  {padding}↑\n  {padding}{reason}"
        ))
    }
}

fn demand_message(kind: &ItemKind, item: &Option<String>) -> String {
    let kind = kind.to_string();
    let mut chars = kind.chars();
    let head: String = chars.next().map(|c| c.to_uppercase().collect()).unwrap_or_default();
    match item {
        Some(name) => format!("{head}{} required: {name}", chars.as_str()),
        None => format!("{head}{} required", chars.as_str()),
    }
}

fn count_message(kind: &ItemKind, item: &str, actual: &usize, expected: &(usize, usize)) -> String {
    let (min, max) = *expected;
    let actual = *actual;
    let amount = if actual < min { "Not enough" } else { "Too many" };
    let wanted = if min == max {
        min.to_string()
    } else if max == usize::MAX {
        format!("at least {min}")
    } else {
        format!("between {min} and {max}")
    };
    format!("{amount} values provided for {kind} {item}. Got {actual}, wanted {wanted}")
}

fn invalid_message(
    kind: &ItemKind,
    item: &str,
    value: &str,
    expected: &str,
    choices: &[String],
) -> String {
    if choices.is_empty() {
        format!("Failed to parse {value} as {expected} for {kind} {item}")
    } else {
        format!(
            "{value} is not a valid input for {kind} {item}. Valid inputs: {}",
            choices.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(tokens: &[&str]) -> Box<ParseState> {
        Box::new(ParseState::new(
            tokens.iter().map(|t| t.to_string()).collect(),
        ))
    }

    #[test]
    fn test_messages() {
        let demand = ParseError::Demand {
            kind: ItemKind::Option,
            item: Some("token".into()),
            state: state(&[]),
        };
        assert_eq!(demand.to_string(), "Option required: token");

        let count = ParseError::Count {
            kind: ItemKind::Argument,
            item: "files".into(),
            actual: 4,
            expected: (1, 3),
            state: state(&[]),
        };
        assert_eq!(
            count.to_string(),
            "Too many values provided for argument files. Got 4, wanted between 1 and 3"
        );

        let invalid = ParseError::InvalidType {
            kind: ItemKind::Option,
            item: "mode".into(),
            value: "medium".into(),
            expected: "string".into(),
            choices: vec!["fast".into(), "slow".into()],
            state: state(&[]),
        };
        assert!(invalid.to_string().ends_with("Valid inputs: fast, slow"));
    }

    #[test]
    fn test_pointer_under_token() {
        let err = ParseError::Structural {
            reason: "Unexpected token: -1".into(),
            position: 4,
            state: state(&["add", "-1"]),
        };
        let pointer = err.pointer().unwrap();
        let lines: Vec<&str> = pointer.lines().collect();
        assert_eq!(lines[1], "  add -1");
        assert_eq!(lines[2], "      ↑");
    }
}
