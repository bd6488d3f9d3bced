//! 라이브러리 사용자용 CLI 파사드.

mod app;

pub use app::Cli;
