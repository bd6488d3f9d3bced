//! argv 한 번을 파싱부터 작업 실행까지 처리하는 유스케이스.

mod config;
mod prompt;
mod report;

use tracing::debug;

use crate::application::parser::{Argv, ParseResult, Parser};
use crate::application::ports::{
    ConfigSource, Console, DisplayFactory, DisplaySettings, Prompter, UsageFormatter,
};
use crate::application::runtime::TaskRuntime;
use crate::application::usecases::dispatch::{HandlerTable, Invocation};
use crate::domain::level::LogLevel;
use crate::domain::schema::{AppConfig, CI, COLOR, INTERACTIVE, LOG_LEVEL, ParseSpec, VERSION};
use crate::domain::value::Value;

/// 선택된 로그 수준을 바깥(tracing 필터 등)에 알리는 콜백.
pub type LevelHook = dyn Fn(LogLevel) + Send + Sync;

/// 파싱 → 설정 병합 → 프롬프트 → 기본값 → 검증 → 디스패치 → 작업 실행 흐름을 조율한다.
pub struct RunCliUseCase<'a> {
    pub spec: &'a ParseSpec,
    pub app: &'a AppConfig,
    pub handlers: &'a HandlerTable,
    pub console: &'a dyn Console,
    pub config_source: &'a dyn ConfigSource,
    pub prompter: &'a dyn Prompter,
    pub usage: &'a dyn UsageFormatter,
    pub display: &'a dyn DisplayFactory,
    pub level_hook: Option<&'a LevelHook>,
}

impl<'a> RunCliUseCase<'a> {
    /// 전체 성공 여부만 돌려준다. 어떤 실패도 호출자에게 전파하지 않는다.
    pub async fn execute(&self, argv: Argv) -> bool {
        let parser = Parser::new(self.spec);
        let mut result = match parser.parse(argv).await {
            Ok(result) => result,
            Err(err) => {
                report::parse_error(self, &err);
                return false;
            }
        };
        debug!(path = ?result.command_path, "parsed command line");

        if result.help {
            self.console.err(&self.usage.command_usage(
                self.spec,
                &result.command_path,
                self.app,
            ));
            return true;
        }
        if flag(&result, VERSION) {
            self.console
                .out(&format!("{} v{}", self.app.name, self.app.version));
            return true;
        }

        if let Err(err) = config::merge(self, &mut result).await {
            self.console.err(&format!("{}: {err:#}", self.app.name));
            return false;
        }

        if flag(&result, INTERACTIVE)
            && let Err(err) = prompt::fill(self, &mut result).await
        {
            match err {
                prompt::PromptFailure::Parse(err) => report::parse_error(self, &err),
                prompt::PromptFailure::Io(err) => {
                    self.console.err(&format!("{}: {err:#}", self.app.name));
                }
            }
            return false;
        }

        parser.fill_defaults(&mut result);
        if let Err(err) = parser.verify(&result) {
            report::parse_error(self, &err);
            return false;
        }

        let Some((handler, residual)) = self.handlers.find(&result.command_path) else {
            self.console.err(&format!(
                "No handler found for: {}",
                result.command_path.join(" ")
            ));
            return false;
        };

        let settings = self.display_settings(&result);
        if let Some(hook) = self.level_hook {
            hook(settings.level);
        }
        let session = self.display.open(&settings);
        let runtime = TaskRuntime::new(session.sink());
        session.begin();

        let invocation = Invocation {
            command_path: result.command_path.clone(),
            residual,
            options: result.options,
            arguments: result.arguments,
            app: runtime.handle(),
        };
        let ok = match handler(invocation).await {
            Ok(runnable) => runtime.run(runnable).await,
            Err(err) => {
                runtime.fail(&err);
                false
            }
        };

        session.finish().await;
        ok && !runtime.failed()
    }

    fn display_settings(&self, result: &ParseResult) -> DisplaySettings {
        let level = result
            .options
            .get(LOG_LEVEL)
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        DisplaySettings {
            color: flag(result, COLOR),
            level,
            ci: flag(result, CI),
            app: self.app.clone(),
        }
    }
}

fn flag(result: &ParseResult, name: &str) -> bool {
    result
        .options
        .get(name)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
