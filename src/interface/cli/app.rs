//! 라이브러리 사용자가 쥐는 CLI 빌더/실행 파사드.

use std::io::{self, IsTerminal};

use crate::application::parser::Argv;
use crate::application::ports::{ConfigSource, Console, DisplayFactory, Prompter, UsageFormatter};
use crate::application::runtime::Runnable;
use crate::application::usecases::dispatch::{HandlerPath, HandlerTable, Invocation, handler};
use crate::application::usecases::run_cli::LevelHook;
use crate::domain::level::LogLevel;
use crate::domain::schema::{
    AppConfig, ArgumentSpec, CI, COLOR, CONFIG, CommandSpec, INTERACTIVE, LOG_LEVEL, OptionSpec,
    ParseSpec, ParserConfig, VERSION, ValueType, help_option,
};
use crate::infrastructure::display::TerminalDisplayFactory;
use crate::interface::composition::AppComposition;

/// 선언형 CLI. 옵션/인자/명령을 등록하고 경로별 핸들러를 붙인 뒤 `run`한다.
pub struct Cli {
    app: AppConfig,
    spec: ParseSpec,
    handlers: HandlerTable,
    composition: AppComposition,
    level_hook: Option<Box<LevelHook>>,
}

impl Cli {
    /// 예약 전역 옵션(`--help`, `--version`, `--color`, `--logLevel`, `--interactive`,
    /// `--config`, `--ci`)을 미리 등록한다.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let color = io::stdout().is_terminal() && io::stderr().is_terminal();
        let spec = ParseSpec {
            options: reserved_options(color, ci_from_env()),
            ..ParseSpec::default()
        };
        Self {
            app: AppConfig::new(name, version),
            spec,
            handlers: HandlerTable::default(),
            composition: AppComposition::default(),
            level_hook: None,
        }
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.spec.options.push(option);
        self
    }

    /// 루트 위치 인자. `order` 기준으로 정렬된다.
    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.spec.arguments.push(argument);
        self.spec.arguments.sort_by_key(|a| a.order);
        self
    }

    pub fn command(mut self, command: CommandSpec) -> Self {
        self.spec.commands.push(command);
        self
    }

    pub fn parser_config(mut self, config: ParserConfig) -> Self {
        self.spec.config = config;
        self
    }

    pub fn require_command(mut self) -> Self {
        self.spec.config.require_command = true;
        self
    }

    pub fn log_format(mut self, format: impl Into<String>) -> Self {
        self.app.log_format = format.into();
        self
    }

    pub fn progress_format(mut self, format: impl Into<String>) -> Self {
        self.app.progress_format = format.into();
        self
    }

    /// 명령 경로(`"build"`, `"config set"`, `"*"`, `"**"`, `""`)에 핸들러를 붙인다.
    /// 먼저 등록된 핸들러가 우선한다.
    pub fn on<F, Fut, R>(mut self, path: impl Into<HandlerPath>, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Runnable>,
    {
        self.handlers.register(path.into(), handler(f));
        self
    }

    pub fn console(mut self, console: impl Console + 'static) -> Self {
        self.composition.console = Box::new(console);
        self
    }

    pub fn config_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.composition.config_source = Box::new(source);
        self
    }

    pub fn prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.composition.prompter = Box::new(prompter);
        self
    }

    pub fn usage_formatter(mut self, usage: impl UsageFormatter + 'static) -> Self {
        self.composition.usage = Box::new(usage);
        self
    }

    pub fn display(mut self, factory: impl DisplayFactory + 'static) -> Self {
        self.composition.display = Box::new(factory);
        self
    }

    /// 터미널 감지 없이 실시간 렌더링 여부를 고정한다.
    pub fn terminal(self, live: bool) -> Self {
        self.display(TerminalDisplayFactory::new().live(live))
    }

    /// 실행마다 선택된 로그 수준을 전달받는다.
    pub fn level_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(LogLevel) + Send + Sync + 'static,
    {
        self.level_hook = Some(Box::new(hook));
        self
    }

    pub fn spec(&self) -> &ParseSpec {
        &self.spec
    }

    pub fn app_config(&self) -> &AppConfig {
        &self.app
    }

    /// 전체 도움말 텍스트.
    pub fn usage(&self) -> String {
        self.composition.usage.usage(&self.spec, &self.app)
    }

    /// argv 한 번을 실행한다. 어떤 실패도 `false`로만 돌려준다.
    pub async fn run(&self, argv: impl Into<Argv>) -> bool {
        self.composition
            .run_cli_usecase(
                &self.spec,
                &self.app,
                &self.handlers,
                self.level_hook.as_deref(),
            )
            .execute(argv.into())
            .await
    }
}

fn reserved_options(color: bool, ci: bool) -> Vec<OptionSpec> {
    let levels: Vec<&str> = LogLevel::ALL.iter().map(LogLevel::name).collect();
    vec![
        help_option(),
        OptionSpec::new(VERSION)
            .alias("v")
            .describe("Output the version number")
            .config(false),
        OptionSpec::new(COLOR)
            .describe("Colorize output")
            .default_value(color),
        OptionSpec::new(LOG_LEVEL)
            .alias("level")
            .kind(ValueType::String)
            .choices(levels)
            .describe("Minimum log level to print")
            .default_value(LogLevel::default().name()),
        OptionSpec::new(INTERACTIVE)
            .alias("i")
            .describe("Prompt for missing values")
            .config(false),
        OptionSpec::new(CONFIG)
            .alias("c")
            .kind(ValueType::Path)
            .describe("Path to a configuration file")
            .config(false),
        OptionSpec::new(CI)
            .describe("Disable live rendering")
            .default_value(ci)
            .help(false),
    ]
}

/// `CI`가 비어 있지 않고 `false`/`0`이 아니면 CI로 본다.
fn ci_from_env() -> bool {
    std::env::var("CI").is_ok_and(|value| !value.is_empty() && value != "false" && value != "0")
}
