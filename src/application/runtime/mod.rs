//! 작업 트리 런타임.
//! 핸들러 반환값을 노드 트리로 풀어 실행하고, 수명 주기 이벤트를 싱크로 보낸다.

mod context;
mod handle;
mod runnable;

use std::sync::Arc;

use anyhow::{Context, anyhow};
use futures::FutureExt;
use futures::StreamExt;
use futures::future::{BoxFuture, join_all};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tracing::debug;

use crate::application::ports::EventSink;
use crate::domain::level::LogLevel;
use crate::domain::task::TaskStatus;

pub use context::RunContext;
pub use handle::{AppHandle, Progress, Task};
pub use runnable::{Runnable, TaskFn};

/// 노드 경계 안쪽에서 올라오는 실패.
enum RunError {
    /// 이미 어떤 노드의 error 이벤트로 보고된 실패.
    Reported,
    /// 아직 노드에 귀속되지 않은 실패.
    Failed(anyhow::Error),
}

impl From<anyhow::Error> for RunError {
    fn from(err: anyhow::Error) -> Self {
        RunError::Failed(err)
    }
}

/// 실행 위치: 부모 노드, 병렬 그룹 안인지, 노드 본문의 직접 반환값인지 여부.
#[derive(Clone)]
pub(crate) struct Scope {
    parent: Option<Task>,
    ctx: Arc<RunContext>,
    concurrent: bool,
    direct: bool,
}

impl Scope {
    pub(crate) fn within(task: Task) -> Self {
        Self {
            ctx: Arc::clone(task.context()),
            concurrent: task.is_concurrent(),
            direct: true,
            parent: Some(task),
        }
    }

    pub(crate) fn root(ctx: Arc<RunContext>) -> Self {
        Self {
            parent: None,
            ctx,
            concurrent: false,
            direct: false,
        }
    }

    fn concurrent(&self) -> Self {
        Self {
            concurrent: true,
            direct: false,
            ..self.clone()
        }
    }

    /// 그룹 멤버용 범위. 말단 값이 부모를 종료시키지 않는다.
    fn member(&self) -> Self {
        Self {
            direct: false,
            ..self.clone()
        }
    }

    fn child(&self, name: &str, key: Option<&str>) -> Task {
        let parent = self.parent.as_ref().map(|p| p.key().to_string());
        Task::create(&self.ctx, name, key, parent.as_deref(), self.concurrent)
    }
}

/// 실행 단위 하나를 범위 안에서 처리한다.
/// 노드에 귀속되지 못한 실패만 `Err`로 돌려준다.
pub(crate) async fn execute(runnable: Runnable, scope: Scope) -> anyhow::Result<()> {
    match run(runnable, scope).await {
        Ok(()) | Err(RunError::Reported) => Ok(()),
        Err(RunError::Failed(err)) => Err(err),
    }
}

fn run(runnable: Runnable, scope: Scope) -> BoxFuture<'static, Result<(), RunError>> {
    async move {
        // 노드 본문의 직접 반환값이 아닌 말단 값은 암묵 노드로 감싼다.
        if !scope.direct && runnable.is_terminal_value() {
            if scope.parent.is_some() && matches!(runnable, Runnable::Nothing) {
                return Ok(());
            }
            let task = scope.child(&runnable.implicit_name(), None);
            return node(task, move |task| run_value(runnable, task)).await;
        }

        match runnable {
            Runnable::Call {
                name: Some(name),
                call,
            } => {
                let task = scope.child(&name, None);
                node(task, move |task| then(call, task)).await
            }
            Runnable::Call { name: None, call } => match scope.parent.clone() {
                Some(parent) => {
                    let next = call(parent).await?;
                    run(next, scope).await
                }
                None => {
                    let task = scope.child("task", None);
                    node(task, move |task| then(call, task)).await
                }
            },
            Runnable::Descriptor { name, key, handler } => {
                let task = scope.child(&name, key.as_deref());
                node(task, move |task| then(handler, task)).await
            }
            Runnable::Series(items) => {
                let members = scope.member();
                for item in items {
                    run(item, members.clone()).await?;
                }
                Ok(())
            }
            Runnable::Sequence(mut stream) => {
                let members = scope.member();
                while let Some(item) = stream.next().await {
                    run(item, members.clone()).await?;
                }
                Ok(())
            }
            Runnable::Parallel(items) => {
                let group = scope.concurrent();
                let results = join_all(items.into_iter().map(|item| run(item, group.clone()))).await;
                let mut outcome = Ok(());
                for result in results {
                    if let Err(err) = result
                        && outcome.is_ok()
                    {
                        outcome = Err(err);
                    }
                }
                outcome
            }
            value => match scope.parent {
                Some(task) => run_value(value, task).await,
                None => Ok(()),
            },
        }
    }
    .boxed()
}

/// 함수를 호출하고 그 반환값을 같은 노드 안에서 이어서 실행한다.
fn then(call: TaskFn, task: Task) -> BoxFuture<'static, Result<(), RunError>> {
    async move {
        let next = call(task.clone()).await?;
        run(next, Scope::within(task)).await
    }
    .boxed()
}

/// 노드 안에서 말단 값을 처리한다.
fn run_value(runnable: Runnable, task: Task) -> BoxFuture<'static, Result<(), RunError>> {
    async move {
        match runnable {
            Runnable::Message(message) => {
                task.complete(Some(&message));
                Ok(())
            }
            Runnable::Lines(reader) => {
                pipe_lines(reader, &task).await?;
                Ok(())
            }
            Runnable::Process(child) => run_process(child, &task).await,
            _ => Ok(()),
        }
    }
    .boxed()
}

/// 노드 경계. 시작/종료 이벤트와 현재 작업 포인터를 관리하고 실패를 여기서 붙잡는다.
async fn node<F>(task: Task, body: F) -> Result<(), RunError>
where
    F: FnOnce(Task) -> BoxFuture<'static, Result<(), RunError>>,
{
    let ctx = Arc::clone(task.context());
    task.start();
    let previous = (!task.is_concurrent()).then(|| ctx.swap_current(Some(task.key().to_string())));

    match body(task.clone()).await {
        Ok(()) | Err(RunError::Reported) => task.complete(None),
        Err(RunError::Failed(err)) => {
            let message = format!("{err:#}");
            debug!(task = task.key(), error = %message, "task failed");
            task.error(&message);
        }
    }

    if let Some(previous) = previous {
        ctx.swap_current(previous);
    }

    if task.status() == TaskStatus::Errored {
        return Err(RunError::Reported);
    }
    Ok(())
}

async fn pipe_lines(reader: Box<dyn AsyncRead + Send + Unpin>, task: &Task) -> anyhow::Result<()> {
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read task output")?
    {
        task.output(&line);
    }
    Ok(())
}

async fn run_process(mut child: Child, task: &Task) -> Result<(), RunError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let out = async {
        match stdout {
            Some(stdout) => pipe_lines(Box::new(stdout), task).await,
            None => Ok(()),
        }
    };
    let err = async {
        match stderr {
            Some(stderr) => pipe_lines(Box::new(stderr), task).await,
            None => Ok(()),
        }
    };
    let (out, err) = tokio::join!(out, err);
    out?;
    err?;

    let status = child
        .wait()
        .await
        .context("failed to wait for child process")?;
    if status.success() {
        return Ok(());
    }
    if let Some(code) = status.code() {
        return Err(anyhow!("exited with code {code}").into());
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(anyhow!("terminated by signal {signal}").into());
        }
    }
    Err(anyhow!("terminated by signal").into())
}

/// 이벤트 싱크 하나에 묶인 런타임.
pub struct TaskRuntime {
    ctx: Arc<RunContext>,
}

impl TaskRuntime {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            ctx: RunContext::new(sink),
        }
    }

    pub fn handle(&self) -> AppHandle {
        AppHandle::new(Arc::clone(&self.ctx))
    }

    /// 루트에서 실행 단위를 돌린다. 오류 노드가 하나라도 있으면 false.
    pub async fn run(&self, runnable: Runnable) -> bool {
        if let Err(err) = execute(runnable, Scope::root(Arc::clone(&self.ctx))).await {
            self.fail(&err);
        }
        !self.ctx.failed()
    }

    /// 노드 밖에서 난 실패(핸들러 자체 실패 포함)를 기록한다.
    pub fn fail(&self, err: &anyhow::Error) {
        self.ctx.mark_failed();
        self.ctx.log(LogLevel::Error, &format!("{err:#}"), None);
    }

    pub fn failed(&self) -> bool {
        self.ctx.failed()
    }
}
