//! tasklane library root.
//! 선언형 CLI 파서와 작업 트리 런타임을 Clean Architecture 계층으로 노출한다.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;

pub use application::coercion::CoerceError;
pub use application::parser::{Argv, ParseError, ParseResult, Parser};
pub use application::runtime::{AppHandle, Progress, Runnable, Task, TaskRuntime};
pub use application::usecases::dispatch::{HandlerPath, Invocation};
pub use domain::level::LogLevel;
pub use domain::schema::{
    ArgumentSpec, CommandSpec, CustomType, OptionSpec, ParseSpec, ParserConfig, PromptKind,
    PromptSpec, ValueType,
};
pub use domain::value::Value;
pub use interface::cli::Cli;
