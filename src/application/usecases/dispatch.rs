//! 명령 경로 → 핸들러 매칭.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::application::runtime::{AppHandle, Runnable};
use crate::domain::value::Value;

/// 핸들러 경로 한 칸.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Name(String),
    /// `*`: 정확히 한 단계.
    One,
    /// `**`: 남은 경로 전부.
    Rest,
}

/// 공백으로 구분된 핸들러 경로(`"config set"`, `"*"`, `"build **"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerPath(Vec<Segment>);

impl HandlerPath {
    pub fn parse(path: &str) -> Self {
        HandlerPath(
            path.split_whitespace()
                .map(|segment| match segment {
                    "*" => Segment::One,
                    "**" => Segment::Rest,
                    name => Segment::Name(name.to_string()),
                })
                .collect(),
        )
    }

    /// 매칭되면 핸들러에 넘길 나머지 경로를 돌려준다.
    pub fn matches(&self, path: &[String]) -> Option<Vec<String>> {
        match self.0.as_slice() {
            [] => path.is_empty().then(Vec::new),
            [Segment::Name(name)] => match path.split_first() {
                Some((first, rest)) if first == name => Some(rest.to_vec()),
                _ => None,
            },
            [Segment::One] => (path.len() == 1).then(|| path.to_vec()),
            [Segment::Rest] => Some(path.to_vec()),
            segments => {
                for (i, segment) in segments.iter().enumerate() {
                    match segment {
                        Segment::Rest => return Some(path.get(i..).unwrap_or_default().to_vec()),
                        Segment::One => {
                            path.get(i)?;
                        }
                        Segment::Name(name) => {
                            if path.get(i)? != name {
                                return None;
                            }
                        }
                    }
                }
                (path.len() == segments.len()).then(Vec::new)
            }
        }
    }
}

impl From<&str> for HandlerPath {
    fn from(value: &str) -> Self {
        HandlerPath::parse(value)
    }
}

impl fmt::Display for HandlerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .0
            .iter()
            .map(|segment| match segment {
                Segment::Name(name) => name.as_str(),
                Segment::One => "*",
                Segment::Rest => "**",
            })
            .collect();
        f.write_str(&parts.join(" "))
    }
}

/// 핸들러가 받는 호출 정보.
#[derive(Clone)]
pub struct Invocation {
    pub command_path: Vec<String>,
    /// 핸들러 경로가 소비하고 남은 명령 경로.
    pub residual: Vec<String>,
    pub options: BTreeMap<String, Value>,
    pub arguments: BTreeMap<String, Value>,
    pub app: AppHandle,
}

impl Invocation {
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }
}

pub type Handler = Arc<dyn Fn(Invocation) -> BoxFuture<'static, anyhow::Result<Runnable>> + Send + Sync>;

/// 비동기 함수를 핸들러 타입으로 감싼다.
pub fn handler<F, Fut, R>(f: F) -> Handler
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    R: Into<Runnable>,
{
    Arc::new(move |invocation| f(invocation).map(|result| result.map(Into::into)).boxed())
}

/// 등록 순서대로 검사하는 핸들러 표.
#[derive(Clone, Default)]
pub struct HandlerTable {
    routes: Vec<(HandlerPath, Handler)>,
}

impl HandlerTable {
    pub fn register(&mut self, path: HandlerPath, handler: Handler) {
        self.routes.push((path, handler));
    }

    /// 처음 매칭되는 핸들러와 나머지 경로.
    pub fn find(&self, path: &[String]) -> Option<(Handler, Vec<String>)> {
        self.routes
            .iter()
            .find_map(|(route, handler)| route.matches(path).map(|rest| (Arc::clone(handler), rest)))
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_name_passes_residual() {
        let route = HandlerPath::parse("config");
        assert_eq!(route.matches(&path(&["config", "set"])), Some(path(&["set"])));
        assert_eq!(route.matches(&path(&["config"])), Some(vec![]));
        assert_eq!(route.matches(&path(&["build"])), None);
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(HandlerPath::parse("*").matches(&path(&["x"])), Some(path(&["x"])));
        assert_eq!(HandlerPath::parse("*").matches(&path(&["x", "y"])), None);
        assert!(HandlerPath::parse("**").matches(&path(&[])).is_some());
        assert_eq!(
            HandlerPath::parse("config **").matches(&path(&["config", "a", "b"])),
            Some(path(&["a", "b"]))
        );
    }

    #[test]
    fn test_multi_segment_must_consume_all() {
        let route = HandlerPath::parse("config set");
        assert_eq!(route.matches(&path(&["config", "set"])), Some(vec![]));
        assert_eq!(route.matches(&path(&["config", "set", "x"])), None);
        assert_eq!(route.matches(&path(&["config"])), None);
        assert_eq!(
            HandlerPath::parse("config *").matches(&path(&["config", "get"])),
            Some(vec![])
        );
    }

    #[test]
    fn test_root_route() {
        let route = HandlerPath::parse("");
        assert!(route.matches(&[]).is_some());
        assert!(route.matches(&path(&["x"])).is_none());
    }
}
