//! 토큰 단위 파싱 상태 기계.

use tracing::trace;

use super::ParseResult;
use super::errors::{ItemKind, ParseError, ParseState};
use super::tokenizer::token_offsets;
use crate::application::coercion::{coerce_slot, validate_slot};
use crate::domain::naming::camel_case;
use crate::domain::schema::{
    ArgumentSpec, CommandSpec, HELP, OptionSpec, ParseSpec, ValueSlot, help_option,
};
use crate::domain::value::Value;

/// `parse()` 한 번 동안만 사는 상태 기계. 재사용하지 않는다.
pub(super) struct Machine<'a> {
    spec: &'a ParseSpec,
    state: ParseState,
    result: ParseResult,
}

impl<'a> Machine<'a> {
    pub(super) fn new(spec: &'a ParseSpec, tokens: Vec<String>) -> Self {
        let mut machine = Self {
            spec,
            state: ParseState::new(tokens),
            result: ParseResult::default(),
        };
        machine.load_command_data();
        machine
    }

    pub(super) async fn run(mut self) -> Result<ParseResult, ParseError> {
        let tokens = self.state.tokens.clone();
        let offsets = token_offsets(&tokens);
        for (token, offset) in tokens.iter().zip(offsets) {
            self.state.token = token.clone();
            self.state.position = offset;
            trace!(token = %token, position = offset, "parse token");
            self.step(token).await?;
        }

        self.state.token.clear();
        self.state.position = self.state.command_line().len();
        self.flush_open_option().await?;
        self.result.command_path = self.state.command_path.clone();
        self.result.help = self.state.help;
        Ok(self.result)
    }

    async fn step(&mut self, token: &str) -> Result<(), ParseError> {
        if token == "-" {
            return self.stdin_sentinel(token).await;
        }

        if self.spec.config.use_double_dash && token.len() >= 2 && token.chars().all(|c| c == '-') {
            self.flush_open_option().await?;
            self.state.saw_double_dash = true;
            self.state.can_get_commands = false;
            return Ok(());
        }

        if !self.state.saw_double_dash && token.starts_with('-') {
            if is_negative_number(token) {
                if !self.numeric_consumer(token) {
                    return Err(self.structural("Unexpected token", 0));
                }
            } else {
                return self.option_token(token).await;
            }
        }

        if let Some(open) = self.state.open_option.clone() {
            let option = self.resolve_option(&open)?;
            if validate_slot(&option, token) {
                self.set_option(&option, token).await?;
                if !option.array {
                    self.state.open_option = None;
                }
                return Ok(());
            }
            if option.value_type.is_boolean() {
                self.set_option(&option, "true").await?;
                self.state.open_option = None;
            } else if option.array && self.result.options.contains_key(&option.name) {
                self.state.open_option = None;
            } else {
                return Err(self.invalid(ItemKind::Option, &option, token));
            }
        }

        if self.try_command(token)? {
            return Ok(());
        }
        self.process_argument(token).await
    }

    /// 단독 `-`는 stream 타입만 받을 수 있다.
    async fn stdin_sentinel(&mut self, token: &str) -> Result<(), ParseError> {
        if let Some(open) = self.state.open_option.clone() {
            let option = self.resolve_option(&open)?;
            if !option.value_type.is_stream() {
                return Err(self.structural("Unexpected token", 0));
            }
            self.set_option(&option, token).await?;
            self.state.open_option = None;
        } else {
            let Some(argument) = self.state.arguments.get(self.state.argument_index).cloned() else {
                return Err(self.structural("Unexpected token", 0));
            };
            if !argument.value_type.is_stream() {
                return Err(self.structural("Unexpected token", 0));
            }
            self.set_argument(&argument, token).await?;
        }
        self.state.can_get_commands = false;
        Ok(())
    }

    async fn option_token(&mut self, token: &str) -> Result<(), ParseError> {
        self.flush_open_option().await?;
        let body = token.trim_start_matches('-');

        if !token.starts_with("--") {
            return self.short_flags(token, body).await;
        }

        if let Some((key, value)) = body.split_once('=') {
            if key.is_empty() {
                return Err(self.structural("Unexpected token", 2));
            }
            if value.is_empty() {
                return Err(self.structural("Missing value", 2 + key.len() + 1));
            }
            let option = self.resolve_option(key)?;
            if !validate_slot(&option, value) {
                return Err(self.invalid(ItemKind::Option, &option, value));
            }
            return self.set_option(&option, value).await;
        }

        let spec = self.spec;
        let prefix = spec.config.no_prefix.as_str();
        if !prefix.is_empty() && body.starts_with(prefix) && self.find_option(body).is_none() {
            let mut enabled = true;
            let mut name = body;
            while let Some(rest) = name.strip_prefix(prefix) {
                enabled = !enabled;
                name = rest;
            }
            let option = self.resolve_option(name)?;
            if !option.value_type.is_boolean() {
                return Err(self.structural(
                    &format!("{prefix} can only be applied to options of type boolean"),
                    0,
                ));
            }
            return self.set_option(&option, if enabled { "true" } else { "false" }).await;
        }

        let option = self.resolve_option(body)?;
        if option.name == HELP {
            return self.set_option(&option, "true").await;
        }
        self.state.open_option = Some(option.name);
        Ok(())
    }

    /// `-x`는 값을 받을 수 있고, `-abc`는 모두 boolean이어야 한다.
    async fn short_flags(&mut self, token: &str, body: &str) -> Result<(), ParseError> {
        let letters: Vec<char> = body.chars().collect();
        if letters.is_empty() {
            return Err(self.structural("Unexpected token", 0));
        }

        if letters.len() == 1 {
            let option = self.resolve_option(body)?;
            if option.value_type.is_boolean() {
                return self.set_option(&option, "true").await;
            }
            self.state.open_option = Some(option.name);
            return Ok(());
        }

        for letter in letters {
            let option = self.resolve_option(&letter.to_string())?;
            if !option.value_type.is_boolean() {
                return Err(self.structural(
                    &format!("Flag {token} combines non-boolean option {}", option.name),
                    0,
                ));
            }
            self.set_option(&option, "true").await?;
        }
        Ok(())
    }

    /// 열린 옵션을 닫는다. boolean은 true가 되고, 값이 필요한 옵션은 오류다.
    async fn flush_open_option(&mut self) -> Result<(), ParseError> {
        let Some(open) = self.state.open_option.take() else {
            return Ok(());
        };
        let option = self.resolve_option(&open)?;
        if option.value_type.is_boolean() {
            return self.set_option(&option, "true").await;
        }
        if option.array && self.result.options.contains_key(&option.name) {
            return Ok(());
        }
        let reason = if self.state.token.is_empty() {
            "Unexpected end of input"
        } else {
            "Unexpected value"
        };
        Err(self.structural(reason, 0))
    }

    fn try_command(&mut self, token: &str) -> Result<bool, ParseError> {
        if token == HELP {
            self.state.help = true;
            return Ok(true);
        }
        if !(self.state.can_get_commands || self.state.help) {
            return Ok(false);
        }
        let Some(command) = find_by_name(&self.state.commands, token) else {
            return Ok(false);
        };
        let name = command.name.clone();
        self.state.command_path.push(name);
        self.load_command_data();
        Ok(true)
    }

    async fn process_argument(&mut self, token: &str) -> Result<(), ParseError> {
        if self.state.help {
            return Ok(());
        }
        let at_root = self.state.command_path.is_empty();
        if (at_root && self.spec.config.require_command)
            || (self.state.arguments.is_empty() && !self.state.commands.is_empty())
        {
            return Err(self.not_found(ItemKind::Command, token));
        }

        self.state.can_get_commands = false;
        loop {
            let Some(argument) = self.state.arguments.get(self.state.argument_index).cloned() else {
                return Err(self.overflow());
            };
            if validate_slot(&argument, token) {
                return self.set_argument(&argument, token).await;
            }
            self.state.argument_index += 1;
            if self.state.argument_index >= self.state.arguments.len() {
                return Err(self.structural("No argument can accept this token", 0));
            }
        }
    }

    /// 남은 인자 슬롯이 없을 때의 오류.
    fn overflow(&self) -> ParseError {
        let index = self.state.argument_index;
        if index == 0 {
            return self.structural("Unexpected argument", 0);
        }
        let last = &self.state.arguments[index - 1];
        let (actual, expected) = match self.result.arguments.get(&last.name) {
            Some(Value::List(items)) if last.array => (items.len() + 1, last.arity()),
            _ => (2, (1, 1)),
        };
        ParseError::Count {
            kind: ItemKind::Argument,
            item: last.name.clone(),
            actual,
            expected,
            state: self.snapshot(),
        }
    }

    async fn set_option(&mut self, option: &OptionSpec, raw: &str) -> Result<(), ParseError> {
        if option.name == HELP {
            self.state.help = true;
            return Ok(());
        }
        if option.array {
            let mut values = Vec::new();
            for part in raw.split(", ") {
                values.push(self.coerce(ItemKind::Option, option, part).await?);
            }
            match self.result.options.get_mut(&option.name) {
                Some(Value::List(items)) => items.extend(values),
                _ => {
                    self.result
                        .options
                        .insert(option.name.clone(), Value::List(values));
                }
            }
            return Ok(());
        }
        if self.result.options.contains_key(&option.name) {
            return Err(ParseError::Count {
                kind: ItemKind::Option,
                item: option.name.clone(),
                actual: 2,
                expected: (1, 1),
                state: self.snapshot(),
            });
        }
        let value = self.coerce(ItemKind::Option, option, raw).await?;
        self.result.options.insert(option.name.clone(), value);
        Ok(())
    }

    /// 슬롯이 가득 차면 다음 인자로 커서를 옮긴다.
    async fn set_argument(
        &mut self,
        argument: &ArgumentSpec,
        raw: &str,
    ) -> Result<(), ParseError> {
        let value = self.coerce(ItemKind::Argument, argument, raw).await?;
        if !argument.array {
            self.result.arguments.insert(argument.name.clone(), value);
            self.state.argument_index += 1;
            return Ok(());
        }
        let entry = self
            .result
            .arguments
            .entry(argument.name.clone())
            .or_insert_with(|| Value::List(Vec::new()));
        let len = match entry {
            Value::List(items) => {
                items.push(value);
                items.len()
            }
            other => {
                *other = Value::List(vec![value]);
                1
            }
        };
        if len >= argument.arity().1 {
            self.state.argument_index += 1;
        }
        Ok(())
    }

    async fn coerce(
        &self,
        kind: ItemKind,
        slot: &dyn ValueSlot,
        raw: &str,
    ) -> Result<Value, ParseError> {
        coerce_slot(slot, raw)
            .await
            .map_err(|_| self.invalid(kind, slot, raw))
    }

    /// 음수 토큰을 값으로 받아 줄 옵션이나 인자 슬롯이 있는지 확인한다.
    fn numeric_consumer(&self, token: &str) -> bool {
        if let Some(open) = &self.state.open_option {
            return self
                .find_option(open)
                .is_some_and(|option| validate_slot(option, token));
        }
        if self.state.help {
            return false;
        }
        self.state.arguments[self.state.argument_index.min(self.state.arguments.len())..]
            .iter()
            .any(|argument| validate_slot(argument, token))
    }

    fn load_command_data(&mut self) {
        let spec = self.spec;
        let path = &self.state.command_path;
        let chain = spec.command_chain(path).unwrap_or_default();
        self.state.commands = match chain.last() {
            Some(command) => command.children.clone(),
            None => spec.commands.clone(),
        };
        self.state.options = spec
            .visible_options(path)
            .into_iter()
            .filter(|option| option.cli)
            .cloned()
            .collect();
        self.state.arguments = spec
            .active_arguments(path)
            .into_iter()
            .cloned()
            .collect();
        self.state.argument_index = 0;
        self.state.can_get_commands = true;
    }

    fn find_option(&self, name: &str) -> Option<&OptionSpec> {
        find_by_name(&self.state.options, name)
    }

    fn resolve_option(&self, name: &str) -> Result<OptionSpec, ParseError> {
        if name == HELP || name == "h" {
            return Ok(help_option());
        }
        self.find_option(name)
            .cloned()
            .ok_or_else(|| self.not_found(ItemKind::Option, name))
    }

    fn snapshot(&self) -> Box<ParseState> {
        Box::new(self.state.clone())
    }

    fn structural(&self, message: &str, offset: usize) -> ParseError {
        let reason = if self.state.token.is_empty() {
            message.to_string()
        } else {
            format!("{message}: {}", self.state.token)
        };
        ParseError::Structural {
            reason,
            position: self.state.position + offset,
            state: self.snapshot(),
        }
    }

    fn not_found(&self, kind: ItemKind, item: &str) -> ParseError {
        ParseError::NotFound {
            kind,
            item: item.to_string(),
            state: self.snapshot(),
        }
    }

    fn invalid(&self, kind: ItemKind, slot: &dyn ValueSlot, value: &str) -> ParseError {
        ParseError::InvalidType {
            kind,
            item: slot.name().to_string(),
            value: value.to_string(),
            expected: slot.value_type().name().to_string(),
            choices: slot.choices().iter().map(Value::stringify).collect(),
            state: self.snapshot(),
        }
    }
}

/// 이름과 별칭으로 찾을 수 있는 스키마 항목.
pub(super) trait Named {
    fn name(&self) -> &str;
    fn aliases(&self) -> &[String];
}

impl Named for OptionSpec {
    fn name(&self) -> &str {
        &self.name
    }
    fn aliases(&self) -> &[String] {
        &self.alias
    }
}

impl Named for CommandSpec {
    fn name(&self) -> &str {
        &self.name
    }
    fn aliases(&self) -> &[String] {
        &self.alias
    }
}

/// 정확한 이름 → camelCase 이름 → 별칭 → camelCase 별칭 순으로 찾는다.
pub(super) fn find_by_name<'s, T: Named>(items: &'s [T], name: &str) -> Option<&'s T> {
    let camel = camel_case(name);
    items
        .iter()
        .find(|item| Named::name(*item) == name)
        .or_else(|| items.iter().find(|item| Named::name(*item) == camel))
        .or_else(|| items.iter().find(|item| item.aliases().iter().any(|a| a == name)))
        .or_else(|| items.iter().find(|item| item.aliases().iter().any(|a| *a == camel)))
}

fn is_negative_number(token: &str) -> bool {
    token.len() > 1
        && token[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        && token[1..].parse::<f64>().is_ok()
}
