//! 스키마 기반 argv 파서.
//! 토큰화 → 상태 기계 → 기본값 채우기 → 사후 검증 순으로 쓴다.

pub mod errors;
mod state;
pub mod tokenizer;

use std::collections::BTreeMap;

use crate::application::coercion::type_default;
use crate::domain::schema::{HELP, ParseSpec, ValueSlot};
use crate::domain::value::Value;

pub use errors::{ItemKind, ParseError, ParseState};
pub use tokenizer::{Argv, tokenize};

/// 파싱 결과. 명령 경로와 강제 변환이 끝난 옵션/인자 맵.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    pub command_path: Vec<String>,
    pub options: BTreeMap<String, Value>,
    pub arguments: BTreeMap<String, Value>,
    pub help: bool,
}

impl ParseResult {
    /// 계산형 기본값이 참고하는 현재까지의 값(인자가 옵션을 덮는다).
    pub fn context(&self) -> BTreeMap<String, Value> {
        let mut context = self.options.clone();
        context.extend(self.arguments.clone());
        context
    }
}

/// 스키마를 빌려 쓰는 파서. 호출마다 새 상태로 시작한다.
pub struct Parser<'a> {
    spec: &'a ParseSpec,
}

impl<'a> Parser<'a> {
    pub fn new(spec: &'a ParseSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ParseSpec {
        self.spec
    }

    pub async fn parse(&self, argv: impl Into<Argv>) -> Result<ParseResult, ParseError> {
        let tokens = tokenize(&argv.into());
        state::Machine::new(self.spec, tokens).run().await
    }

    /// 값이 없는 항목에 기본값을 채운다.
    /// 필수 항목은 명시 기본값만 받고, 나머지는 boolean/배열 타입 기본값도 받는다.
    pub fn fill_defaults(&self, result: &mut ParseResult) {
        let path = result.command_path.clone();
        for option in self.spec.visible_options(&path) {
            if option.name == HELP || result.options.contains_key(&option.name) {
                continue;
            }
            if let Some(value) = default_for(option, &result.context()) {
                result.options.insert(option.name.clone(), value);
            }
        }
        for argument in self.spec.active_arguments(&path) {
            if result.arguments.contains_key(&argument.name) {
                continue;
            }
            if let Some(value) = default_for(argument, &result.context()) {
                result.arguments.insert(argument.name.clone(), value);
            }
        }
    }

    /// 필수/개수/명령 선택 제약을 검사한다.
    pub fn verify(&self, result: &ParseResult) -> Result<(), ParseError> {
        let path = &result.command_path;
        let snapshot = || {
            let mut state = ParseState::new(Vec::new());
            state.command_path = path.clone();
            state.commands = match self.spec.command_chain(path).and_then(|c| c.last().copied()) {
                Some(command) => command.children.clone(),
                None => self.spec.commands.clone(),
            };
            state.options = self.spec.visible_options(path).into_iter().cloned().collect();
            state.arguments = self.spec.active_arguments(path).into_iter().cloned().collect();
            Box::new(state)
        };

        for argument in self.spec.active_arguments(path) {
            let bound = result.arguments.get(&argument.name);
            if argument.array {
                let len = match bound {
                    Some(Value::List(items)) => items.len(),
                    Some(_) => 1,
                    None => 0,
                };
                let (min, max) = argument.arity();
                if len == 0 && argument.required && min == 0 {
                    return Err(ParseError::Demand {
                        kind: ItemKind::Argument,
                        item: Some(argument.name.clone()),
                        state: snapshot(),
                    });
                }
                if len < min || len > max {
                    return Err(ParseError::Count {
                        kind: ItemKind::Argument,
                        item: argument.name.clone(),
                        actual: len,
                        expected: (min, max),
                        state: snapshot(),
                    });
                }
            } else if bound.is_none() && argument.required {
                return Err(ParseError::Demand {
                    kind: ItemKind::Argument,
                    item: Some(argument.name.clone()),
                    state: snapshot(),
                });
            }
        }

        for option in self.spec.visible_options(path) {
            let bound = result.options.get(&option.name);
            if option.required && bound.is_none() {
                return Err(ParseError::Demand {
                    kind: ItemKind::Option,
                    item: Some(option.name.clone()),
                    state: snapshot(),
                });
            }
            if option.array
                && let Some(Value::List(items)) = bound
            {
                let (min, max) = option.arity();
                if items.len() < min || items.len() > max {
                    return Err(ParseError::Count {
                        kind: ItemKind::Option,
                        item: option.name.clone(),
                        actual: items.len(),
                        expected: (min, max),
                        state: snapshot(),
                    });
                }
            }
        }

        let needs_subcommand = self
            .spec
            .command_chain(path)
            .and_then(|chain| chain.last().map(|c| c.require_subcommand))
            .unwrap_or(false);
        if (self.spec.config.require_command && path.is_empty()) || needs_subcommand {
            return Err(ParseError::Demand {
                kind: ItemKind::Command,
                item: None,
                state: snapshot(),
            });
        }
        Ok(())
    }
}

fn default_for(slot: &dyn ValueSlot, context: &BTreeMap<String, Value>) -> Option<Value> {
    if let Some(default) = slot.default_value() {
        return Some(default.resolve(context));
    }
    if slot.is_required() {
        return None;
    }
    if slot.is_array() || slot.value_type().is_boolean() {
        return type_default(slot);
    }
    None
}
