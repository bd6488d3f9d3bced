//! 작업 로그 심각도.

use std::fmt;
use std::str::FromStr;

/// 순서가 있는 고정 심각도 집합. 앞쪽일수록 심각하다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Notice,
    Http,
    Info,
    Verbose,
    Silly,
}

impl LogLevel {
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Notice,
        LogLevel::Http,
        LogLevel::Info,
        LogLevel::Verbose,
        LogLevel::Silly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Notice => "notice",
            LogLevel::Http => "http",
            LogLevel::Info => "info",
            LogLevel::Verbose => "verbose",
            LogLevel::Silly => "silly",
        }
    }

    /// 로그 줄 머리에 붙는 기호.
    pub fn glyph(&self) -> &'static str {
        match self {
            LogLevel::Error => "✖",
            LogLevel::Warn => "⚠",
            LogLevel::Notice => "★",
            LogLevel::Http => "↑",
            LogLevel::Info => "ℹ",
            LogLevel::Verbose => "…",
            LogLevel::Silly => "→",
        }
    }

    /// `selected` 수준에서 이 기록을 출력해야 하는지 판단한다.
    pub fn enabled_at(&self, selected: LogLevel) -> bool {
        *self <= selected
    }

    /// `RUST_LOG`가 없을 때 쓰는 tracing 필터 지시문.
    pub fn tracing_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn | LogLevel::Notice => "warn",
            LogLevel::Http | LogLevel::Info => "info",
            LogLevel::Verbose => "debug",
            LogLevel::Silly => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        LogLevel::ALL
            .into_iter()
            .find(|level| level.name() == lowered)
            .ok_or_else(|| format!("unknown log level: {s}"))
    }
}
