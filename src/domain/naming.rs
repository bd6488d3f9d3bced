//! 이름 정규화와 오타 제안 정책.

/// 하이픈/공백/밑줄로 구분된 이름을 camelCase로 바꾼다(`log-level` → `logLevel`).
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if matches!(ch, '-' | ' ' | '_') {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// camelCase 이름을 dash-case로 바꾼다(`logLevel` → `log-level`).
pub fn dash_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
        } else if ch == ' ' || ch == '_' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}

/// 입력과 편집 거리가 `입력 길이 * 0.4` 미만인 후보를 선언 순서대로 돌려준다.
/// 입력과 완전히 같은 이름은 제외한다.
pub fn suggest<'a, I>(input: &str, candidates: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let threshold = input.chars().count() as f64 * 0.4;
    candidates
        .into_iter()
        .filter(|candidate| *candidate != input)
        .filter(|candidate| (strsim::osa_distance(input, candidate) as f64) < threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("log-level"), "logLevel");
        assert_eq!(camel_case("dry run"), "dryRun");
        assert_eq!(camel_case("already"), "already");
        assert_eq!(camel_case("-x"), "x");
    }

    #[test]
    fn test_dash_case() {
        assert_eq!(dash_case("logLevel"), "log-level");
        assert_eq!(dash_case("plain"), "plain");
    }

    #[test]
    fn test_suggest_transposition() {
        let found = suggest("buidl", ["build", "bundle"]);
        assert_eq!(found, vec!["build"]);
    }

    #[test]
    fn test_suggest_multiple_and_exact_excluded() {
        let found = suggest("tset", ["test", "tset", "set", "reset"]);
        assert_eq!(found, vec!["test", "set"]);
        assert!(suggest("zzzz", ["build"]).is_empty());
    }
}
