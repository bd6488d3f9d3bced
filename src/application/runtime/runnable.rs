//! 핸들러 반환값을 표현하는 닫힌 실행 단위 타입.

use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{BoxStream, Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio::process::Child;

use super::handle::Task;

/// 작업 핸들을 받아 다음 실행 단위를 돌려주는 함수.
pub type TaskFn = Box<dyn FnOnce(Task) -> BoxFuture<'static, anyhow::Result<Runnable>> + Send>;

/// 런타임이 태그로 분기하는 실행 단위.
pub enum Runnable {
    /// 이름이 있으면 그 이름의 하위 노드를, 없으면 부모 노드를 그대로 쓴다.
    Call { name: Option<String>, call: TaskFn },
    /// 키를 직접 지정하는 노드.
    Descriptor {
        name: String,
        key: Option<String>,
        handler: TaskFn,
    },
    /// 하나씩 순서대로 실행한다.
    Series(Vec<Runnable>),
    /// 모두 시작한 뒤 전부 끝날 때까지 기다린다.
    Parallel(Vec<Runnable>),
    /// 끝이 정해지지 않은 직렬 흐름.
    Sequence(BoxStream<'static, Runnable>),
    /// 완료 메시지.
    Message(String),
    /// 한 줄마다 output 이벤트가 된다.
    Lines(Box<dyn AsyncRead + Send + Unpin>),
    /// stdout/stderr 줄은 output, 종료 코드 0은 성공이다.
    Process(Child),
    Nothing,
}

impl Runnable {
    /// 이름 붙은 하위 작업.
    pub fn call<F, Fut, R>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(Task) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Runnable>,
    {
        Runnable::Call {
            name: Some(name.into()),
            call: wrap(f),
        }
    }

    /// 부모 노드 안에서 바로 실행되는 이름 없는 함수.
    pub fn inline<F, Fut, R>(f: F) -> Self
    where
        F: FnOnce(Task) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Runnable>,
    {
        Runnable::Call {
            name: None,
            call: wrap(f),
        }
    }

    /// `{name, key, handler}` 서술자.
    pub fn descriptor<F, Fut, R>(name: impl Into<String>, key: Option<&str>, f: F) -> Self
    where
        F: FnOnce(Task) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Runnable>,
    {
        Runnable::Descriptor {
            name: name.into(),
            key: key.map(str::to_string),
            handler: wrap(f),
        }
    }

    pub fn series(items: impl IntoIterator<Item = Runnable>) -> Self {
        Runnable::Series(items.into_iter().collect())
    }

    pub fn parallel(items: impl IntoIterator<Item = Runnable>) -> Self {
        Runnable::Parallel(items.into_iter().collect())
    }

    pub fn sequence<S>(stream: S) -> Self
    where
        S: Stream<Item = Runnable> + Send + 'static,
    {
        Runnable::Sequence(stream.boxed())
    }

    pub fn lines<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Runnable::Lines(Box::new(reader))
    }

    pub fn message(message: impl Into<String>) -> Self {
        Runnable::Message(message.into())
    }

    /// 노드 없이 끝나는 말단 값인지 여부.
    pub(crate) fn is_terminal_value(&self) -> bool {
        matches!(
            self,
            Runnable::Message(_) | Runnable::Lines(_) | Runnable::Process(_) | Runnable::Nothing
        )
    }

    /// 암묵 노드에 붙일 이름.
    pub(crate) fn implicit_name(&self) -> String {
        match self {
            Runnable::Message(message) => message.clone(),
            Runnable::Lines(_) => "output".to_string(),
            Runnable::Process(child) => match child.id() {
                Some(pid) => format!("process {pid}"),
                None => "process".to_string(),
            },
            _ => "task".to_string(),
        }
    }
}

fn wrap<F, Fut, R>(f: F) -> TaskFn
where
    F: FnOnce(Task) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    R: Into<Runnable>,
{
    Box::new(move |task| f(task).map(|result| result.map(Into::into)).boxed())
}

impl fmt::Debug for Runnable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runnable::Call { name, .. } => f.debug_struct("Call").field("name", name).finish(),
            Runnable::Descriptor { name, key, .. } => f
                .debug_struct("Descriptor")
                .field("name", name)
                .field("key", key)
                .finish(),
            Runnable::Series(items) => f.debug_tuple("Series").field(items).finish(),
            Runnable::Parallel(items) => f.debug_tuple("Parallel").field(items).finish(),
            Runnable::Sequence(_) => f.write_str("Sequence(..)"),
            Runnable::Message(message) => f.debug_tuple("Message").field(message).finish(),
            Runnable::Lines(_) => f.write_str("Lines(..)"),
            Runnable::Process(child) => f.debug_tuple("Process").field(&child.id()).finish(),
            Runnable::Nothing => f.write_str("Nothing"),
        }
    }
}

impl From<()> for Runnable {
    fn from(_: ()) -> Self {
        Runnable::Nothing
    }
}

impl From<&str> for Runnable {
    fn from(value: &str) -> Self {
        Runnable::Message(value.to_string())
    }
}

impl From<String> for Runnable {
    fn from(value: String) -> Self {
        Runnable::Message(value)
    }
}

impl From<Vec<Runnable>> for Runnable {
    fn from(value: Vec<Runnable>) -> Self {
        Runnable::Series(value)
    }
}

/// 바깥은 직렬, 안쪽 묶음은 병렬로 실행한다.
impl From<Vec<Vec<Runnable>>> for Runnable {
    fn from(value: Vec<Vec<Runnable>>) -> Self {
        Runnable::Series(value.into_iter().map(Runnable::Parallel).collect())
    }
}

impl From<Child> for Runnable {
    fn from(value: Child) -> Self {
        Runnable::Process(value)
    }
}

impl From<Option<Runnable>> for Runnable {
    fn from(value: Option<Runnable>) -> Self {
        value.unwrap_or(Runnable::Nothing)
    }
}
