//! 애플리케이션 조립(composition root) 모듈.

use crate::application::ports::{ConfigSource, Console, DisplayFactory, Prompter, UsageFormatter};
use crate::application::usecases::dispatch::HandlerTable;
use crate::application::usecases::run_cli::{LevelHook, RunCliUseCase};
use crate::domain::schema::{AppConfig, ParseSpec};
use crate::infrastructure::adapters::{StdConsole, StdinPrompter, TextUsageFormatter};
use crate::infrastructure::config::JsonConfigSource;
use crate::infrastructure::display::TerminalDisplayFactory;

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
pub struct AppComposition {
    pub(crate) console: Box<dyn Console>,
    pub(crate) config_source: Box<dyn ConfigSource>,
    pub(crate) prompter: Box<dyn Prompter>,
    pub(crate) usage: Box<dyn UsageFormatter>,
    pub(crate) display: Box<dyn DisplayFactory>,
}

impl Default for AppComposition {
    fn default() -> Self {
        Self {
            console: Box::new(StdConsole),
            config_source: Box::new(JsonConfigSource::new()),
            prompter: Box::new(StdinPrompter),
            usage: Box::new(TextUsageFormatter::new()),
            display: Box::new(TerminalDisplayFactory::new()),
        }
    }
}

impl AppComposition {
    /// argv 실행 유스케이스를 생성한다.
    pub fn run_cli_usecase<'a>(
        &'a self,
        spec: &'a ParseSpec,
        app: &'a AppConfig,
        handlers: &'a HandlerTable,
        level_hook: Option<&'a LevelHook>,
    ) -> RunCliUseCase<'a> {
        RunCliUseCase {
            spec,
            app,
            handlers,
            console: self.console.as_ref(),
            config_source: self.config_source.as_ref(),
            prompter: self.prompter.as_ref(),
            usage: self.usage.as_ref(),
            display: self.display.as_ref(),
            level_hook,
        }
    }
}
