//! argv 토크나이저. 스키마를 모르고 문자열만 나눈다.

/// 파서 입력. 셸이 이미 나눈 목록이거나 한 줄 문자열이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argv {
    Line(String),
    List(Vec<String>),
}

impl From<&str> for Argv {
    fn from(value: &str) -> Self {
        Argv::Line(value.to_string())
    }
}

impl From<String> for Argv {
    fn from(value: String) -> Self {
        Argv::Line(value)
    }
}

impl From<Vec<String>> for Argv {
    fn from(value: Vec<String>) -> Self {
        Argv::List(value)
    }
}

impl From<&[&str]> for Argv {
    fn from(value: &[&str]) -> Self {
        Argv::List(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Argv {
    fn from(value: [&str; N]) -> Self {
        Argv::List(value.iter().map(|s| s.to_string()).collect())
    }
}

/// 입력을 토큰 목록으로 만든다.
/// 목록 입력은 원소 경계를 그대로 믿고 대시 정규화만 적용한다.
pub fn tokenize(argv: &Argv) -> Vec<String> {
    match argv {
        Argv::Line(line) => tokenize_line(line),
        Argv::List(items) => items.iter().map(|item| collapse_dashes(item)).collect(),
    }
}

/// 따옴표 안의 공백은 나누지 않고, 따옴표 문자 자체는 제거한다.
/// 닫히지 않은 따옴표는 입력 끝까지 이어진다.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut started = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(open) if ch == open => {
                quote = None;
                continue;
            }
            Some(_) => {}
            None if ch.is_whitespace() => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
                continue;
            }
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                started = true;
                continue;
            }
            None => {}
        }

        started = true;
        if ch == '-' && current.ends_with("--") {
            continue;
        }
        current.push(ch);
    }

    if started {
        tokens.push(current);
    }
    tokens
}

/// 연속된 세 개 이상의 `-`를 두 개로 줄인다(`---x` → `--x`).
pub fn collapse_dashes(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for ch in token.chars() {
        if ch == '-' && out.ends_with("--") {
            continue;
        }
        out.push(ch);
    }
    out
}

/// 공백으로 다시 이은 명령줄에서 각 토큰의 시작 위치.
pub fn token_offsets(tokens: &[String]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(tokens.len());
    let mut pos = 0;
    for token in tokens {
        offsets.push(pos);
        pos += token.len() + 1;
    }
    offsets
}
