//! 경과 시간 포맷(`1m 3s 20ms`).

use std::time::Duration;

const NS: u128 = 1;
const US: u128 = 1_000 * NS;
const MS: u128 = 1_000 * US;
const S: u128 = 1_000 * MS;
const M: u128 = 60 * S;
const H: u128 = 60 * M;
const D: u128 = 24 * H;
const W: u128 = 7 * D;
const Y: u128 = 365 * D;

const SCALES: [(&str, u128); 9] = [
    ("y", Y),
    ("w", W),
    ("d", D),
    ("h", H),
    ("m", M),
    ("s", S),
    ("ms", MS),
    ("μs", US),
    ("ns", NS),
];

/// 큰 단위부터 최대 `depth`개 단위로 나타낸다. 0이면 `0ms`.
pub fn format_elapsed(elapsed: Duration, depth: usize) -> String {
    let mut rest = elapsed.as_nanos();
    if rest == 0 {
        return "0ms".to_string();
    }
    let mut parts = Vec::new();
    for (unit, scale) in SCALES {
        if parts.len() >= depth || rest == 0 {
            break;
        }
        // 0인 중간 단위는 깊이를 소모하지 않는다.
        if rest >= scale {
            parts.push(format!("{}{unit}", rest / scale));
            rest %= scale;
        }
    }
    parts.join(" ")
}
