//! 콘솔 출력 포트 구현 어댑터.

use std::sync::Mutex;

use crate::application::ports::Console;

/// 표준 출력/오류로 그대로 쓴다.
pub struct StdConsole;

impl Console for StdConsole {
    fn out(&self, line: &str) {
        println!("{line}");
    }

    fn err(&self, line: &str) {
        eprintln!("{line}");
    }
}

/// 출력을 메모리에 모으는 콘솔(테스트/임베딩용).
#[derive(Default)]
pub struct MemoryConsole {
    out: Mutex<Vec<String>>,
    err: Mutex<Vec<String>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout(&self) -> String {
        self.out.lock().map(|lines| lines.join("\n")).unwrap_or_default()
    }

    pub fn stderr(&self) -> String {
        self.err.lock().map(|lines| lines.join("\n")).unwrap_or_default()
    }
}

impl Console for MemoryConsole {
    fn out(&self, line: &str) {
        if let Ok(mut lines) = self.out.lock() {
            lines.push(line.to_string());
        }
    }

    fn err(&self, line: &str) {
        if let Ok(mut lines) = self.err.lock() {
            lines.push(line.to_string());
        }
    }
}
