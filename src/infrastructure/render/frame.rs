//! 작업 트리 한 프레임을 문자열 줄로 만든다.

use std::time::{Duration, Instant};

use crossterm::style::{Attribute, Color, Stylize};
use unicode_width::UnicodeWidthStr;

use super::board::Board;
use super::elapsed::format_elapsed;
use super::progress_bar::render_progress;
use crate::domain::task::{TaskNode, TaskStatus};

/// braille "dots" 스피너.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

const INDENT: usize = 2;
/// 노드 아래에 보여 줄 출력 줄 수.
const OUTPUT_TAIL: usize = 5;

pub struct FrameStyle<'a> {
    pub color: bool,
    pub width: usize,
    pub progress_format: &'a str,
}

impl FrameStyle<'_> {
    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            crossterm::style::style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.color {
            crossterm::style::style(text).attribute(Attribute::Bold).to_string()
        } else {
            text.to_string()
        }
    }
}

/// `since`는 표시 시작 이후 경과 시간(스피너 위상 계산용).
pub fn build_frame(board: &Board, style: &FrameStyle<'_>, now: Instant, since: Duration) -> Vec<String> {
    let mut lines = Vec::new();
    for key in board.roots() {
        if let Some(node) = board.node(key) {
            render_node(board, node, style, now, since, 0, &mut lines);
        }
    }
    lines
}

pub fn spinner_frame(since: Duration) -> &'static str {
    let idx = (since.as_millis() / SPINNER_INTERVAL.as_millis()) as usize % SPINNER_FRAMES.len();
    SPINNER_FRAMES[idx]
}

fn render_node(
    board: &Board,
    node: &TaskNode,
    style: &FrameStyle<'_>,
    now: Instant,
    since: Duration,
    level: usize,
    lines: &mut Vec<String>,
) {
    let pad = " ".repeat(level * INDENT);
    let sub_pad = " ".repeat((level + 1) * INDENT);
    let arrow = style.paint("→", Color::DarkGrey);
    let mut head = format!("{pad}{} {}", icon(node.status, style, since), style.bold(&node.name));

    match node.status {
        TaskStatus::Complete | TaskStatus::Errored | TaskStatus::Skipped => {
            let label = node.message.clone().unwrap_or_else(|| node.status.label().to_string());
            head.push_str(&format!(" - {label}"));
            if node.status != TaskStatus::Skipped {
                let elapsed = format_elapsed(node.elapsed(now), 2);
                head.push(' ');
                head.push_str(&style.paint(&elapsed, Color::DarkGrey));
            }
            lines.push(head);
        }
        TaskStatus::Pending => lines.push(head),
        TaskStatus::Running => {
            let progress = board.progress_of(node);
            let elapsed = node.elapsed(now);
            match progress.as_slice() {
                [single] => {
                    // 들여쓰기 + 아이콘 + 이름 + " - " + 메시지
                    let used = level * INDENT
                        + 2
                        + UnicodeWidthStr::width(node.name.as_str())
                        + 3
                        + node.message.as_deref().map_or(0, |m| UnicodeWidthStr::width(m) + 1);
                    let width = style.width.saturating_sub(used);
                    let bar = render_progress(style.progress_format, single, elapsed, width);
                    head.push_str(&format!(" - {bar}"));
                    if let Some(message) = &node.message {
                        head.push(' ');
                        head.push_str(message);
                    }
                    lines.push(head);
                }
                [] => {
                    if let Some(message) = &node.message {
                        head.push_str(&format!(" - {message}"));
                    }
                    lines.push(head);
                }
                many => {
                    if let Some(message) = &node.message {
                        head.push_str(&format!(" - {message}"));
                    }
                    lines.push(head);
                    let width = style.width.saturating_sub((level + 1) * INDENT + 2);
                    for data in many {
                        let bar = render_progress(style.progress_format, data, elapsed, width);
                        lines.push(format!("{sub_pad}{arrow} {bar}"));
                    }
                }
            }
            let skip = node.output.len().saturating_sub(OUTPUT_TAIL);
            for line in node.output.iter().skip(skip) {
                lines.push(format!("{sub_pad}{arrow} {line}"));
            }
        }
    }

    if matches!(node.status, TaskStatus::Complete | TaskStatus::Skipped) {
        return;
    }
    for key in &node.children {
        if let Some(child) = board.node(key) {
            render_node(board, child, style, now, since, level + 1, lines);
        }
    }
}

fn icon(status: TaskStatus, style: &FrameStyle<'_>, since: Duration) -> String {
    match status {
        TaskStatus::Complete => style.paint("✔", Color::Green),
        TaskStatus::Errored => style.paint("✖", Color::Red),
        TaskStatus::Running => style.paint(spinner_frame(since), Color::Blue),
        TaskStatus::Pending => style.paint("❯", Color::Yellow),
        TaskStatus::Skipped => style.paint("↓", Color::Yellow),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::DEFAULT_PROGRESS_FORMAT;
    use crate::domain::task::ProgressData;

    fn style() -> FrameStyle<'static> {
        FrameStyle {
            color: false,
            width: 60,
            progress_format: DEFAULT_PROGRESS_FORMAT,
        }
    }

    #[test]
    fn test_spinner_cycles_every_interval() {
        assert_eq!(spinner_frame(Duration::ZERO), "⠋");
        assert_eq!(spinner_frame(Duration::from_millis(80)), "⠙");
        assert_eq!(spinner_frame(Duration::from_millis(800)), "⠋");
    }

    #[test]
    fn test_children_hidden_after_parent_completes() {
        let now = Instant::now();
        let mut board = Board::new();
        board.create("build", "build", None);
        board.create("compile", "compile", Some("build"));
        board.start("build", now);
        board.start("compile", now);

        let running = build_frame(&board, &style(), now, Duration::ZERO);
        assert_eq!(running, vec!["⠋ build", "  ⠋ compile"]);

        board.finish("compile", TaskStatus::Complete, None, now);
        board.finish("build", TaskStatus::Complete, Some("done"), now);
        let finished = build_frame(&board, &style(), now, Duration::ZERO);
        assert_eq!(finished, vec!["✔ build - done 0ms"]);
    }

    #[test]
    fn test_single_progress_renders_inline_bar() {
        let now = Instant::now();
        let mut board = Board::new();
        board.create("dl", "download", None);
        board.start("dl", now);
        board.progress(&ProgressData {
            key: "dl:bytes".into(),
            name: "bytes".into(),
            parent: "dl".into(),
            value: 5.0,
            total: 10.0,
            done: false,
        });
        let frame = build_frame(&board, &style(), now, Duration::ZERO);
        assert_eq!(frame.len(), 1);
        assert!(frame[0].starts_with("⠋ download - bytes [="));
        assert!(frame[0].contains("50.0% (5 / 10)"));
        assert!(UnicodeWidthStr::width(frame[0].as_str()) <= 60);
    }

    #[test]
    fn test_output_lines_listed_under_running_task() {
        let now = Instant::now();
        let mut board = Board::new();
        board.create("exec", "exec", None);
        board.start("exec", now);
        board.output("exec", "hello");
        let frame = build_frame(&board, &style(), now, Duration::ZERO);
        assert_eq!(frame, vec!["⠋ exec", "  → hello"]);
    }
}
