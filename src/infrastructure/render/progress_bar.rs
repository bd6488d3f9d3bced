//! 진행률 포맷 문자열 치환과 막대 렌더링.

use std::time::Duration;

use unicode_width::UnicodeWidthStr;

use super::elapsed::format_elapsed;
use crate::domain::task::ProgressData;
use crate::domain::value::format_number;

/// `{name}`, `{bar}`, `{percent}`, `{value}`, `{total}`, `{time}`를 채운다.
/// 막대는 `width`에서 나머지 텍스트 폭을 뺀 만큼 차지한다.
pub fn render_progress(format: &str, data: &ProgressData, elapsed: Duration, width: usize) -> String {
    let time = format_elapsed(elapsed, 1);
    let without_bar = substitute(format, data, &time, "");
    let used = UnicodeWidthStr::width(without_bar.as_str());
    let bar = render_bar(data.ratio(), width.saturating_sub(used + 2));
    substitute(format, data, &time, &bar)
}

/// `[===---]` 막대. `inner`는 괄호를 뺀 칸 수.
pub fn render_bar(ratio: f64, inner: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * inner as f64).round() as usize).min(inner);
    format!("[{}{}]", "=".repeat(filled), "-".repeat(inner - filled))
}

fn substitute(format: &str, data: &ProgressData, time: &str, bar: &str) -> String {
    let mut out = String::with_capacity(format.len() + bar.len());
    let mut rest = format;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        match key {
            "name" => out.push_str(&data.name),
            "bar" => out.push_str(bar),
            "percent" => out.push_str(&format!("{:.1}%", data.ratio() * 100.0)),
            "value" => out.push_str(&format_number(data.value)),
            "total" => out.push_str(&format_number(data.total)),
            "time" => out.push_str(time),
            "done" => out.push_str(if data.done { "true" } else { "false" }),
            _ => {}
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}
