//! 유스케이스 모음.

pub mod dispatch;
pub mod run_cli;
