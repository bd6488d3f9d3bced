//! 파싱 오류를 사람이 읽는 진단으로 바꿔 stderr에 쓴다.

use super::RunCliUseCase;
use crate::application::parser::{ItemKind, ParseError, ParseState};
use crate::domain::naming::suggest;

pub(super) fn parse_error(uc: &RunCliUseCase<'_>, err: &ParseError) {
    let cli = uc.app.name.as_str();
    let console = uc.console;

    match err {
        ParseError::Structural { .. } => {
            if let Some(pointer) = err.pointer() {
                console.err(&pointer);
            }
        }
        ParseError::Count { .. } => console.err(&format!("{cli}: {err}")),
        ParseError::InvalidType { .. } => console.err(&err.to_string()),
        ParseError::Demand { kind, state, .. } => {
            console.err(&format!("{cli}: {err}"));
            match kind {
                ItemKind::Command => {
                    let names: Vec<&str> = state.commands.iter().map(|c| c.name.as_str()).collect();
                    console.err(&indent("Possible commands:", 4));
                    console.err(&indent(&names.join(", "), 8));
                }
                _ => usage_line(uc, state),
            }
        }
        ParseError::NotFound { kind, item, state } => {
            console.err(&format!("{cli}: {err}"));
            match kind {
                ItemKind::Command => suggest_commands(uc, item, state),
                _ => usage_line(uc, state),
            }
        }
    }
}

/// 편집 거리 후보가 하나면 그 명령의 한 줄 사용법까지, 여럿이면 목록을 보여 준다.
fn suggest_commands(uc: &RunCliUseCase<'_>, item: &str, state: &ParseState) {
    let cli = uc.app.name.as_str();
    let prefix = command_prefix(cli, &state.command_path);
    let close = suggest(item, state.commands.iter().map(|c| c.name.as_str()));

    match close.as_slice() {
        [] => uc.console.err(&uc.usage.command_list(&state.commands)),
        [name] => {
            uc.console.err(&format!("Did you mean {name}?"));
            if let Some(command) = state.commands.iter().find(|c| c.name == *name) {
                let arguments: Vec<_> = command.args.iter().collect();
                let options: Vec<_> = command.options.iter().collect();
                let line = uc.usage.oneline(&prefix, name, &arguments, &options);
                uc.console.err(&indent(&line, 4));
            }
        }
        names => {
            uc.console.err("Did you mean one of these?");
            for name in names {
                let description = state
                    .commands
                    .iter()
                    .find(|c| c.name == *name)
                    .and_then(|c| c.description.as_deref());
                let line = match description {
                    Some(description) => format!("{prefix} {name}: {description}"),
                    None => format!("{prefix} {name}"),
                };
                uc.console.err(&indent(&line, 3));
            }
        }
    }
}

fn usage_line(uc: &RunCliUseCase<'_>, state: &ParseState) {
    let prefix = command_prefix(&uc.app.name, &state.command_path);
    let arguments: Vec<_> = state.arguments.iter().collect();
    let options: Vec<_> = state.options.iter().collect();
    uc.console.err("Usage:");
    uc.console
        .err(&indent(&uc.usage.oneline(&prefix, "", &arguments, &options), 4));
}

fn command_prefix(cli: &str, path: &[String]) -> String {
    std::iter::once(cli)
        .chain(path.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
