//! 명령/옵션/인자 스키마 엔티티.
//! 빌더로 조립되고, 파싱이 시작된 뒤에는 변경되지 않는다.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::value::Value;

/// 사용자 정의 변환 함수(동기/비동기 모두 이 형태로 감싼다).
pub type Converter = Arc<dyn Fn(String) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// 이미 결정된 값(context)을 보고 기본값을 계산하는 함수.
pub type DefaultFn = Arc<dyn Fn(&BTreeMap<String, Value>) -> Value + Send + Sync>;

/// 이름이 붙은 사용자 정의 타입.
#[derive(Clone)]
pub struct CustomType {
    name: String,
    convert: Converter,
}

impl CustomType {
    /// 동기 변환 함수로 사용자 타입을 만든다.
    pub fn new<F>(name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let convert = Arc::new(convert);
        Self {
            name: name.into(),
            convert: Arc::new(move |raw: String| {
                let out = convert(&raw);
                async move { out }.boxed()
            }),
        }
    }

    /// 비동기 변환 함수로 사용자 타입을 만든다.
    pub fn new_async<F, Fut>(name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            convert: Arc::new(move |raw: String| convert(raw).boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn convert(&self, raw: &str) -> anyhow::Result<Value> {
        (self.convert)(raw.to_string()).await
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType").field("name", &self.name).finish()
    }
}

/// 옵션/인자의 타입 태그.
#[derive(Debug, Clone)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Url,
    Path,
    Date,
    Stream,
    Custom(CustomType),
}

impl ValueType {
    pub fn name(&self) -> &str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Url => "url",
            ValueType::Path => "path",
            ValueType::Date => "date",
            ValueType::Stream => "stream",
            ValueType::Custom(custom) => custom.name(),
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, ValueType::Boolean)
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, ValueType::Stream)
    }

    pub fn custom<F>(name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        ValueType::Custom(CustomType::new(name, convert))
    }
}

/// 리터럴 기본값 또는 계산형 기본값.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Computed(DefaultFn),
}

impl DefaultValue {
    pub fn resolve(&self, context: &BTreeMap<String, Value>) -> Value {
        match self {
            DefaultValue::Literal(v) => v.clone(),
            DefaultValue::Computed(f) => f(context),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DefaultValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// 대화형 입력 UI 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Input,
    Password,
    Confirm,
    Number,
    Select,
}

/// 항목별 프롬프트 재정의.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub kind: PromptKind,
    pub message: String,
}

impl PromptSpec {
    pub fn new(kind: PromptKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// 옵션과 인자가 공통으로 가지는 값 슬롯 정보.
pub trait ValueSlot: Send + Sync {
    fn name(&self) -> &str;
    fn value_type(&self) -> &ValueType;
    fn choices(&self) -> &[Value];
    fn is_array(&self) -> bool;
    fn is_required(&self) -> bool;
    fn default_value(&self) -> Option<&DefaultValue>;
    fn prompt(&self) -> Option<&PromptSpec>;
    fn min(&self) -> Option<usize>;
    fn max(&self) -> Option<usize>;

    /// 배열 항목의 허용 개수 범위. 상한이 없으면 `usize::MAX`.
    fn arity(&self) -> (usize, usize) {
        (self.min().unwrap_or(0), self.max().unwrap_or(usize::MAX))
    }
}

macro_rules! impl_value_slot {
    ($ty:ty) => {
        impl ValueSlot for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn value_type(&self) -> &ValueType {
                &self.value_type
            }
            fn choices(&self) -> &[Value] {
                &self.choices
            }
            fn is_array(&self) -> bool {
                self.array
            }
            fn is_required(&self) -> bool {
                self.required
            }
            fn default_value(&self) -> Option<&DefaultValue> {
                self.default.as_ref()
            }
            fn prompt(&self) -> Option<&PromptSpec> {
                self.prompt.as_ref()
            }
            fn min(&self) -> Option<usize> {
                self.min
            }
            fn max(&self) -> Option<usize> {
                self.max
            }
        }
    };
}

/// 이름 있는 옵션(`--name`, 별칭 `-n`).
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: String,
    pub description: Option<String>,
    pub alias: Vec<String>,
    pub value_type: ValueType,
    pub array: bool,
    pub required: bool,
    pub choices: Vec<Value>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub default: Option<DefaultValue>,
    pub prompt: Option<PromptSpec>,
    /// CLI에서 지정 가능한지 여부.
    pub cli: bool,
    /// 설정 파일에서 읽을 수 있는지 여부.
    pub config: bool,
    /// 도움말에 노출할지 여부.
    pub help: bool,
}

impl OptionSpec {
    /// 기본 타입은 boolean이다.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            alias: Vec::new(),
            value_type: ValueType::Boolean,
            array: false,
            required: false,
            choices: Vec::new(),
            min: None,
            max: None,
            default: None,
            prompt: None,
            cli: true,
            config: true,
            help: true,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn kind(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices.extend(choices.into_iter().map(Into::into));
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&BTreeMap<String, Value>) -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Computed(Arc::new(f)));
        self
    }

    pub fn prompt(mut self, prompt: PromptSpec) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn cli(mut self, visible: bool) -> Self {
        self.cli = visible;
        self
    }

    pub fn config(mut self, visible: bool) -> Self {
        self.config = visible;
        self
    }

    pub fn help(mut self, visible: bool) -> Self {
        self.help = visible;
        self
    }
}

impl_value_slot!(OptionSpec);

/// 위치 인자.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub name: String,
    pub description: Option<String>,
    pub value_type: ValueType,
    pub array: bool,
    pub required: bool,
    pub choices: Vec<Value>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub default: Option<DefaultValue>,
    pub prompt: Option<PromptSpec>,
    /// 위치 슬롯 정렬 힌트(작을수록 앞).
    pub order: i32,
}

impl ArgumentSpec {
    /// 기본 타입은 string이다.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            value_type: ValueType::String,
            array: false,
            required: false,
            choices: Vec::new(),
            min: None,
            max: None,
            default: None,
            prompt: None,
            order: 0,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices.extend(choices.into_iter().map(Into::into));
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&BTreeMap<String, Value>) -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Computed(Arc::new(f)));
        self
    }

    pub fn prompt(mut self, prompt: PromptSpec) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl_value_slot!(ArgumentSpec);

/// 명령 트리 노드.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: String,
    pub description: Option<String>,
    pub alias: Vec<String>,
    pub children: Vec<CommandSpec>,
    pub options: Vec<OptionSpec>,
    pub args: Vec<ArgumentSpec>,
    /// 하위 명령을 반드시 골라야 하는지 여부.
    pub require_subcommand: bool,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            alias: Vec::new(),
            children: Vec::new(),
            options: Vec::new(),
            args: Vec::new(),
            require_subcommand: false,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn command(mut self, command: CommandSpec) -> Self {
        self.children.push(command);
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// 인자는 `order` 힌트 기준으로 안정 정렬되어 보관된다.
    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.args.push(argument);
        self.args.sort_by_key(|a| a.order);
        self
    }

    pub fn require_subcommand(mut self) -> Self {
        self.require_subcommand = true;
        self
    }
}

/// 파서 동작 설정.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// 명령을 반드시 하나 이상 골라야 하는지 여부.
    pub require_command: bool,
    /// 단독 `--` 이후를 모두 위치 인자로 취급할지 여부.
    pub use_double_dash: bool,
    /// boolean 부정 접두사(`--no-color`).
    pub no_prefix: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            require_command: false,
            use_double_dash: true,
            no_prefix: "no-".to_string(),
        }
    }
}

/// 파서가 소비하는 전체 스키마.
#[derive(Debug, Clone, Default)]
pub struct ParseSpec {
    pub commands: Vec<CommandSpec>,
    pub options: Vec<OptionSpec>,
    pub arguments: Vec<ArgumentSpec>,
    pub config: ParserConfig,
}

impl ParseSpec {
    /// 루트부터 경로를 따라 명령 체인을 찾는다. 중간에 끊기면 `None`.
    pub fn command_chain(&self, path: &[String]) -> Option<Vec<&CommandSpec>> {
        let mut chain = Vec::with_capacity(path.len());
        let mut level = &self.commands;
        for name in path {
            let command = level
                .iter()
                .find(|c| &c.name == name || c.alias.iter().any(|a| a == name))?;
            chain.push(command);
            level = &command.children;
        }
        Some(chain)
    }

    /// 루트 옵션과 명령 체인의 옵션을 모두 모은다.
    pub fn visible_options(&self, path: &[String]) -> Vec<&OptionSpec> {
        let mut options: Vec<&OptionSpec> = self.options.iter().collect();
        if let Some(chain) = self.command_chain(path) {
            for command in chain {
                options.extend(command.options.iter());
            }
        }
        options
    }

    /// 경로의 말단 명령 인자(명령이 없으면 루트 인자).
    pub fn active_arguments(&self, path: &[String]) -> Vec<&ArgumentSpec> {
        match self.command_chain(path).and_then(|chain| chain.last().copied()) {
            Some(command) => command.args.iter().collect(),
            None if path.is_empty() => self.arguments.iter().collect(),
            None => Vec::new(),
        }
    }

    /// 모든 명령(하위 포함)의 옵션을 평탄화한다.
    pub fn all_options(&self) -> Vec<&OptionSpec> {
        fn walk<'a>(commands: &'a [CommandSpec], out: &mut Vec<&'a OptionSpec>) {
            for command in commands {
                out.extend(command.options.iter());
                walk(&command.children, out);
            }
        }
        let mut out: Vec<&OptionSpec> = self.options.iter().collect();
        walk(&self.commands, &mut out);
        out
    }
}

/// 표시/도움말 설정.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    /// 로그 한 줄 포맷(`{message}`, `{level}`, `{task}`).
    pub log_format: String,
    /// 진행 막대 포맷(`{name}`, `{bar}`, `{percent}`, `{value}`, `{total}`, `{time}`).
    pub progress_format: String,
}

impl AppConfig {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            log_format: DEFAULT_LOG_FORMAT.to_string(),
            progress_format: DEFAULT_PROGRESS_FORMAT.to_string(),
        }
    }
}

pub const DEFAULT_LOG_FORMAT: &str = "{message}";
pub const DEFAULT_PROGRESS_FORMAT: &str = "{name} {bar} {percent} ({value} / {total}) [{time}]";

/// 예약된 도움말 이름.
pub const HELP: &str = "help";
pub const VERSION: &str = "version";
pub const COLOR: &str = "color";
pub const LOG_LEVEL: &str = "logLevel";
pub const INTERACTIVE: &str = "interactive";
pub const CONFIG: &str = "config";
pub const CI: &str = "ci";

/// 어디서든 해석되는 `--help`/`-h` 의사 옵션.
pub fn help_option() -> OptionSpec {
    OptionSpec::new(HELP)
        .alias("h")
        .describe("Output help information")
        .config(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ParseSpec {
        ParseSpec {
            commands: vec![
                CommandSpec::new("config")
                    .alias("cfg")
                    .option(OptionSpec::new("global").alias("g"))
                    .command(
                        CommandSpec::new("set")
                            .argument(ArgumentSpec::new("value").order(2))
                            .argument(ArgumentSpec::new("name").order(1)),
                    ),
            ],
            options: vec![OptionSpec::new("verbose")],
            ..Default::default()
        }
    }

    #[test]
    fn test_command_chain_follows_aliases() {
        let spec = spec();
        let path = vec!["cfg".to_string(), "set".to_string()];
        let chain = spec.command_chain(&path).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].name, "set");
        assert!(spec.command_chain(&["nope".to_string()]).is_none());
    }

    #[test]
    fn test_visible_options_include_chain() {
        let spec = spec();
        let path = vec!["config".to_string(), "set".to_string()];
        let names: Vec<&str> = spec
            .visible_options(&path)
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["verbose", "global"]);
    }

    #[test]
    fn test_arguments_sorted_by_order() {
        let spec = spec();
        let path = vec!["config".to_string(), "set".to_string()];
        let names: Vec<&str> = spec
            .active_arguments(&path)
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "value"]);
    }

    #[test]
    fn test_computed_default_sees_context() {
        let opt = OptionSpec::new("out")
            .kind(ValueType::String)
            .default_with(|ctx| {
                let base = ctx.get("name").map(Value::stringify).unwrap_or_default();
                Value::String(format!("{base}.out"))
            });
        let mut ctx = BTreeMap::new();
        ctx.insert("name".to_string(), Value::from("build"));
        let value = opt.default.as_ref().unwrap().resolve(&ctx);
        assert_eq!(value, Value::from("build.out"));
    }
}
