//! 애플리케이션 포트를 실제 인프라 구현체로 연결하는 어댑터 계층.

mod console;
mod prompter;
mod usage;

pub use console::{MemoryConsole, StdConsole};
pub use prompter::{ScriptedPrompter, StdinPrompter};
pub use usage::TextUsageFormatter;
