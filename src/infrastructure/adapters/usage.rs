//! 도움말/사용법 텍스트 포맷터 어댑터.

use std::collections::BTreeMap;

use unicode_width::UnicodeWidthStr;

use crate::application::coercion::type_default;
use crate::application::ports::UsageFormatter;
use crate::domain::naming::dash_case;
use crate::domain::schema::{
    AppConfig, ArgumentSpec, CommandSpec, DefaultValue, OptionSpec, ParseSpec, ValueSlot,
    ValueType,
};

const NO_DESCRIPTION: &str = "[No Description Provided]";
const INDENT: usize = 4;

/// 열 정렬된 평문 도움말을 만든다.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextUsageFormatter;

impl TextUsageFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl UsageFormatter for TextUsageFormatter {
    fn usage(&self, spec: &ParseSpec, config: &AppConfig) -> String {
        let mut ui = Layout::default();
        ui.line(format!("{} v{}", config.name, config.version));
        ui.blank();
        ui.line("Usage:");
        ui.indent();
        if !spec.config.require_command {
            let arguments: Vec<_> = spec.arguments.iter().collect();
            let options: Vec<_> = spec.options.iter().collect();
            ui.line(self.oneline(&config.name, "", &arguments, &options));
        }
        if !spec.commands.is_empty() {
            let wrapped = wrap("command", spec.config.require_command);
            ui.line(format!("{} {wrapped}", config.name));
        }
        ui.dedent();
        ui.blank();

        if !spec.commands.is_empty() {
            ui.section("Commands:", |ui| command_rows(ui, &spec.commands));
            ui.blank();
        }
        if !spec.arguments.is_empty() {
            ui.section("Arguments:", |ui| argument_rows(ui, &spec.arguments));
            ui.blank();
        }
        if spec.options.iter().any(listed) {
            ui.section("Options:", |ui| option_rows(ui, &spec.options, &spec.config.no_prefix));
        }
        ui.render()
    }

    fn command_usage(&self, spec: &ParseSpec, path: &[String], config: &AppConfig) -> String {
        let Some(chain) = spec.command_chain(path) else {
            return self.usage(spec, config);
        };
        let Some(command) = chain.last().copied() else {
            return self.usage(spec, config);
        };
        let program = std::iter::once(config.name.as_str())
            .chain(chain[..chain.len() - 1].iter().map(|c| c.name.as_str()))
            .collect::<Vec<_>>()
            .join(" ");

        let mut ui = Layout::default();
        if command.children.len() > 1 && command.args.is_empty() {
            ui.line(format!("{program} {} <command>", command.name));
        } else {
            let arguments: Vec<_> = command.args.iter().collect();
            let options: Vec<_> = command.options.iter().collect();
            ui.line(self.oneline(&program, &command.name, &arguments, &options));
        }
        if let Some(description) = &command.description {
            ui.blank();
            ui.line(description.as_str());
        }
        ui.blank();

        if !command.alias.is_empty() {
            ui.section("Aliases:", |ui| ui.line(command.alias.join(", ")));
            ui.blank();
        }
        if !command.children.is_empty() {
            ui.section("Sub-commands:", |ui| command_rows(ui, &command.children));
            ui.blank();
        }
        if !command.args.is_empty() {
            ui.section("Arguments:", |ui| argument_rows(ui, &command.args));
            ui.blank();
        }
        if command.options.iter().any(listed) {
            ui.section("Options:", |ui| {
                option_rows(ui, &command.options, &spec.config.no_prefix)
            });
            ui.blank();
        }
        if spec.options.iter().any(listed) {
            ui.section("Global Options:", |ui| {
                option_rows(ui, &spec.options, &spec.config.no_prefix)
            });
        }
        ui.render()
    }

    fn oneline(
        &self,
        prefix: &str,
        command: &str,
        arguments: &[&ArgumentSpec],
        options: &[&OptionSpec],
    ) -> String {
        let mut words: Vec<String> = Vec::new();
        for part in [prefix, command] {
            if !part.is_empty() {
                words.push(part.to_string());
            }
        }
        for option in options.iter().filter(|o| listed(o) && o.required) {
            let provides = provides(option, "no-");
            let boolean = option.value_type.is_boolean();
            let mut inner = provides.join(" | ");
            if !boolean && provides.len() > 1 {
                inner = format!("({inner})");
            }
            if !boolean {
                inner.push_str("=value");
            }
            words.push(format!("<{inner}>"));
        }
        let mut arguments = arguments.to_vec();
        arguments.sort_by_key(|a| a.order);
        for argument in arguments {
            let name = if argument.array {
                format!("{}...", argument.name)
            } else {
                argument.name.clone()
            };
            words.push(wrap(&name, argument.required));
        }
        words.join(" ")
    }

    fn command_list(&self, commands: &[CommandSpec]) -> String {
        let mut ui = Layout::default();
        ui.section("Commands:", |ui| command_rows(ui, commands));
        ui.render()
    }
}

fn listed(option: &OptionSpec) -> bool {
    option.cli && option.help
}

fn wrap(text: &str, required: bool) -> String {
    if required {
        format!("<{text}>")
    } else {
        format!("[{text}]")
    }
}

/// `--long`, `--no-long`, `-s` 형태 목록(짧은 것부터).
fn provides(option: &OptionSpec, no_prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in std::iter::once(dash_case(&option.name)).chain(option.alias.iter().cloned()) {
        if option.value_type.is_boolean() && name.chars().count() != 1 {
            names.push(format!("{no_prefix}{name}"));
        }
        names.push(name);
    }
    names.sort_by_key(|name| name.chars().count());
    names
        .into_iter()
        .map(|name| {
            if name.chars().count() == 1 {
                format!("-{name}")
            } else {
                format!("--{name}")
            }
        })
        .collect()
}

fn command_rows(ui: &mut Layout, commands: &[CommandSpec]) {
    for command in commands {
        ui.row(vec![
            command.name.clone(),
            command.description.clone().unwrap_or_else(|| NO_DESCRIPTION.into()),
        ]);
    }
}

fn argument_rows(ui: &mut Layout, arguments: &[ArgumentSpec]) {
    for argument in arguments {
        ui.row(vec![
            argument.name.clone(),
            argument.description.clone().unwrap_or_else(|| NO_DESCRIPTION.into()),
            default_label(argument),
        ]);
    }
}

fn option_rows(ui: &mut Layout, options: &[OptionSpec], no_prefix: &str) {
    for option in options.iter().filter(|o| listed(o)) {
        ui.row(vec![
            option.name.clone(),
            provides(option, no_prefix).join(", "),
            option.description.clone().unwrap_or_else(|| NO_DESCRIPTION.into()),
            default_label(option),
        ]);
    }
}

/// 필수면 `[required]`, 아니면 기본값 문자열.
fn default_label(slot: &dyn ValueSlot) -> String {
    if slot.is_required() {
        return "[required]".into();
    }
    match slot.default_value() {
        Some(DefaultValue::Literal(value)) => value.stringify(),
        Some(DefaultValue::Computed(_)) => "[computed]".into(),
        None => match slot.value_type() {
            ValueType::Path | ValueType::Date | ValueType::Stream | ValueType::Custom(_) => {
                String::new()
            }
            _ => type_default(slot).map(|v| v.stringify()).unwrap_or_default(),
        },
    }
}

enum Entry {
    Line(usize, String),
    /// 같은 블록의 행끼리만 열 너비를 맞춘다.
    Row { depth: usize, block: usize, cells: Vec<String> },
}

/// 들여쓰기와 열 정렬을 처리하는 단순 레이아웃 버퍼.
#[derive(Default)]
struct Layout {
    entries: Vec<Entry>,
    depth: usize,
    block: usize,
}

impl Layout {
    fn line(&mut self, text: impl Into<String>) {
        self.entries.push(Entry::Line(self.depth, text.into()));
    }

    fn blank(&mut self) {
        self.entries.push(Entry::Line(0, String::new()));
    }

    fn row(&mut self, cells: Vec<String>) {
        self.entries.push(Entry::Row {
            depth: self.depth,
            block: self.block,
            cells,
        });
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn section(&mut self, title: &str, body: impl FnOnce(&mut Self)) {
        self.block += 1;
        self.line(title);
        self.indent();
        body(self);
        self.dedent();
    }

    fn render(&self) -> String {
        let mut widths: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for entry in &self.entries {
            if let Entry::Row { block, cells, .. } = entry {
                let widths = widths.entry(*block).or_default();
                for (idx, cell) in cells.iter().enumerate() {
                    let width = UnicodeWidthStr::width(cell.as_str());
                    match widths.get_mut(idx) {
                        Some(max) => *max = (*max).max(width),
                        None => widths.push(width),
                    }
                }
            }
        }

        let mut out: Vec<String> = Vec::new();
        for entry in &self.entries {
            match entry {
                Entry::Line(depth, text) if text.is_empty() && *depth == 0 => {
                    out.push(String::new())
                }
                Entry::Line(depth, text) => {
                    for line in text.lines() {
                        out.push(format!("{}{line}", " ".repeat(depth * INDENT)));
                    }
                }
                Entry::Row {
                    depth,
                    block,
                    cells,
                } => {
                    let widths = widths.get(block).map(Vec::as_slice).unwrap_or_default();
                    let mut line = " ".repeat(depth * INDENT);
                    let last = cells.len().saturating_sub(1);
                    for (idx, cell) in cells.iter().enumerate() {
                        line.push_str(cell);
                        if idx < last {
                            let column = widths.get(idx).copied().unwrap_or(0);
                            let pad = column.saturating_sub(UnicodeWidthStr::width(cell.as_str()));
                            line.push_str(&" ".repeat(pad + 2));
                        }
                    }
                    out.push(line.trim_end().to_string());
                }
            }
        }
        while out.last().is_some_and(String::is_empty) {
            out.pop();
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ParseSpec {
        ParseSpec {
            commands: vec![
                CommandSpec::new("build")
                    .describe("Build the project")
                    .alias("b")
                    .argument(ArgumentSpec::new("target").required())
                    .option(OptionSpec::new("release").describe("Optimized build")),
            ],
            options: vec![
                OptionSpec::new("logLevel")
                    .alias("level")
                    .kind(ValueType::String)
                    .default_value("notice"),
                OptionSpec::new("token").kind(ValueType::String).required(),
                OptionSpec::new("ci").help(false),
            ],
            ..ParseSpec::default()
        }
    }

    #[test]
    fn test_oneline_marks_required_items() {
        let formatter = TextUsageFormatter::new();
        let spec = spec();
        let options: Vec<_> = spec.options.iter().collect();
        let arguments = vec![&spec.commands[0].args[0]];
        assert_eq!(
            formatter.oneline("tool", "build", &arguments, &options),
            "tool build <--token=value> <target>"
        );
    }

    #[test]
    fn test_provides_lists_negated_boolean() {
        let verbose = OptionSpec::new("dryRun").alias("n");
        assert_eq!(provides(&verbose, "no-"), vec!["-n", "--dry-run", "--no-dry-run"]);
    }

    #[test]
    fn test_usage_sections_and_hidden_options() {
        let text = TextUsageFormatter::new().usage(&spec(), &AppConfig::new("tool", "1.2.0"));
        assert!(text.starts_with("tool v1.2.0\n\nUsage:"));
        assert!(text.contains("Commands:\n    build  Build the project"));
        assert!(text.contains("[required]"));
        assert!(text.contains("notice"));
        assert!(!text.contains("--ci"));
    }

    #[test]
    fn test_command_usage_shows_aliases_and_globals() {
        let text = TextUsageFormatter::new().command_usage(
            &spec(),
            &["build".to_string()],
            &AppConfig::new("tool", "1.2.0"),
        );
        assert!(text.starts_with("tool build <target>"));
        assert!(text.contains("Aliases:\n    b"));
        assert!(text.contains("Global Options:"));
        assert!(text.contains("--no-release"));
    }
}
