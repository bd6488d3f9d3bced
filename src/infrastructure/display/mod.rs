//! 작업 이벤트 싱크 구현체와 표시 세션.
//! 평문 모드는 이벤트마다 한 줄을 쓰고, 터미널 모드는 보드를 갱신해 렌더러가 다시 그리게 한다.

mod session;

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Instant;

use tracing::warn;

use crate::application::ports::{DisplaySettings, EventSink};
use crate::domain::task::{LogRecord, ProgressData, TaskStatus};
use crate::domain::value::format_number;
use crate::infrastructure::render::{Board, FrameStyle, Renderer, build_frame, format_elapsed};

pub use session::{TerminalDisplayFactory, TerminalSession};

/// 출력 대상. 기본은 stderr.
pub type Output = Box<dyn Write + Send>;

struct DisplayState {
    board: Board,
    /// 터미널 모드에서 다음 프레임 위에 찍을 줄.
    queued: Vec<String>,
    renderer: Renderer<Output>,
}

/// 런타임 이벤트를 받아 화면에 반영한다.
pub struct Display {
    settings: DisplaySettings,
    live: bool,
    started: Instant,
    state: Mutex<DisplayState>,
}

impl Display {
    pub fn new(settings: DisplaySettings, live: bool) -> Self {
        Self::with_output(settings, live, Box::new(io::stderr()))
    }

    pub fn with_output(settings: DisplaySettings, live: bool, out: Output) -> Self {
        Self {
            settings,
            live,
            started: Instant::now(),
            state: Mutex::new(DisplayState {
                board: Board::new(),
                queued: Vec::new(),
                renderer: Renderer::new(out),
            }),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// 터미널 모드에서 한 프레임을 그린다.
    pub fn tick(&self) {
        if !self.live {
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let width = crossterm::terminal::size()
            .map(|(cols, _)| cols as usize)
            .unwrap_or(80);
        let style = FrameStyle {
            color: self.settings.color,
            width,
            progress_format: &self.settings.app.progress_format,
        };
        let frame = build_frame(&state.board, &style, Instant::now(), self.started.elapsed());
        let queued = std::mem::take(&mut state.queued);
        if let Err(err) = state.renderer.draw(&queued, &frame) {
            warn!(error = %err, "failed to draw task frame");
        }
    }

    pub fn hide_cursor(&self) {
        if self.live
            && let Ok(mut state) = self.state.lock()
        {
            let _ = state.renderer.hide_cursor();
        }
    }

    /// 마지막 프레임을 그리고 커서를 되돌린다.
    pub fn close(&self) {
        if !self.live {
            return;
        }
        self.tick();
        if let Ok(mut state) = self.state.lock() {
            let _ = state.renderer.release();
        }
    }

    /// 평문 모드 한 줄 출력. 터미널 모드에서는 아무것도 하지 않는다.
    fn plain(&self, state: &mut DisplayState, line: &str) {
        if self.live {
            return;
        }
        let _ = state.renderer.draw(&[line.to_string()], &[]);
    }

    fn with_state(&self, f: impl FnOnce(&mut DisplayState)) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
    }

    fn terminate(&self, key: &str, status: TaskStatus, message: Option<&str>) {
        self.with_state(|state| {
            let now = Instant::now();
            if !state.board.finish(key, status, message, now) {
                return;
            }
            let Some(node) = state.board.node(key) else {
                return;
            };
            let name = node.name.clone();
            let took = format_elapsed(node.elapsed(now), 2);
            let line = match (status, message) {
                (TaskStatus::Complete, Some(message)) => {
                    format!("{name} complete in {took}: {message}")
                }
                (TaskStatus::Complete, None) => format!("{name} complete in {took}"),
                (TaskStatus::Errored, Some(message)) => format!("{name} error: {message}"),
                (TaskStatus::Skipped, Some(message)) => format!("{name} skipped: {message}"),
                (status, _) => format!("{name} {}", status.label()),
            };
            self.plain(state, &line);
        });
    }

    fn format_log(&self, record: &LogRecord, task_name: Option<&str>) -> String {
        fill_log_format(&self.settings.app.log_format, record, task_name)
    }
}

impl EventSink for Display {
    fn create(&self, key: &str, name: &str, parent: Option<&str>) {
        self.with_state(|state| {
            let parent_name = parent
                .and_then(|p| state.board.node(p))
                .map(|node| node.name.clone());
            if state.board.create(key, name, parent) {
                let owner = parent_name.unwrap_or_else(|| self.settings.app.name.clone());
                self.plain(state, &format!("[{owner}] create {name}"));
            }
        });
    }

    fn start(&self, key: &str) {
        self.with_state(|state| {
            state.board.start(key, Instant::now());
            if let Some(name) = state.board.node(key).map(|n| n.name.clone()) {
                self.plain(state, &format!("start {name}"));
            }
        });
    }

    fn output(&self, key: &str, line: &str) {
        self.with_state(|state| {
            state.board.output(key, line);
            if let Some(name) = state.board.node(key).map(|n| n.name.clone()) {
                self.plain(state, &format!("{name}: {line}"));
            }
        });
    }

    fn complete(&self, key: &str, message: Option<&str>) {
        self.terminate(key, TaskStatus::Complete, message);
    }

    fn error(&self, key: &str, message: &str) {
        self.terminate(key, TaskStatus::Errored, Some(message));
    }

    fn skip(&self, key: &str, message: Option<&str>) {
        self.terminate(key, TaskStatus::Skipped, message);
    }

    fn progress(&self, data: &ProgressData) {
        self.with_state(|state| {
            state.board.progress(data);
            let owner = state
                .board
                .node(&data.parent)
                .map(|n| format!("[{}] ", n.name))
                .unwrap_or_default();
            let mark = if data.done { " ✔" } else { "" };
            self.plain(
                state,
                &format!(
                    "{owner}{}: {} / {}{mark}",
                    data.name,
                    format_number(data.value),
                    format_number(data.total)
                ),
            );
        });
    }

    fn log(&self, record: &LogRecord) {
        if !record.level.enabled_at(self.settings.level) {
            return;
        }
        self.with_state(|state| {
            let task = record
                .task
                .as_deref()
                .and_then(|key| state.board.node(key))
                .map(|node| (node.key.clone(), node.name.clone()));
            let body = self.format_log(record, task.as_ref().map(|(_, name)| name.as_str()));
            let glyph = record.level.glyph();
            match task {
                Some((key, _)) if self.live => {
                    state.board.set_message(&key, format!("{glyph} {body}"));
                }
                Some((_, name)) => self.plain(state, &format!("{glyph} [{name}] {body}")),
                None => {
                    let line = format!("{glyph} [{}] {body}", self.settings.app.name);
                    if self.live {
                        state.queued.push(line);
                    } else {
                        self.plain(state, &line);
                    }
                }
            }
        });
    }
}

/// `{message}`, `{level}`, `{task}` 치환. 모르는 이름은 그대로 둔다.
pub fn fill_log_format(format: &str, record: &LogRecord, task: Option<&str>) -> String {
    format
        .replace("{message}", &record.message)
        .replace("{level}", record.level.name())
        .replace("{task}", task.unwrap_or(""))
}

/// stderr가 터미널이고 `TERM`이 dumb이 아니며 CI가 아닐 때만 실시간 모드.
pub fn supports_live(ci: bool) -> bool {
    use std::io::IsTerminal;

    if ci || !io::stderr().is_terminal() {
        return false;
    }
    !matches!(std::env::var("TERM"), Ok(term) if term.eq_ignore_ascii_case("dumb"))
}
