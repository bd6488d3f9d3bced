//! 핸들러가 쥐는 작업/진행률 핸들.

use std::sync::{Arc, Mutex};

use crate::domain::level::LogLevel;
use crate::domain::task::{ProgressData, TaskStatus};

use super::context::RunContext;
use super::runnable::Runnable;

struct TaskInner {
    key: String,
    name: String,
    parent: Option<String>,
    status: Mutex<TaskStatus>,
    /// 병렬 그룹 안에서 만들어진 노드는 현재 작업 포인터를 건드리지 않는다.
    concurrent: bool,
    ctx: Arc<RunContext>,
}

/// 작업 노드 하나에 대한 핸들. 복제해도 같은 노드를 가리킨다.
#[derive(Clone)]
pub struct Task {
    inner: Arc<TaskInner>,
}

impl Task {
    /// 노드를 만들고 create 이벤트를 보낸다.
    pub(crate) fn create(
        ctx: &Arc<RunContext>,
        name: &str,
        key: Option<&str>,
        parent: Option<&str>,
        concurrent: bool,
    ) -> Self {
        let key = ctx.unique_key(key.unwrap_or(name));
        ctx.sink().create(&key, name, parent);
        Self {
            inner: Arc::new(TaskInner {
                key,
                name: name.to_string(),
                parent: parent.map(str::to_string),
                status: Mutex::new(TaskStatus::Pending),
                concurrent,
                ctx: Arc::clone(ctx),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.inner.parent.as_deref()
    }

    pub fn status(&self) -> TaskStatus {
        self.inner
            .status
            .lock()
            .map(|status| *status)
            .unwrap_or(TaskStatus::Errored)
    }

    pub(crate) fn is_concurrent(&self) -> bool {
        self.inner.concurrent
    }

    pub(crate) fn context(&self) -> &Arc<RunContext> {
        &self.inner.ctx
    }

    /// 이 노드 아래에 하위 작업을 만든다(아직 시작 전).
    pub fn subtask(&self, name: &str) -> Task {
        Task::create(
            &self.inner.ctx,
            name,
            None,
            Some(&self.inner.key),
            self.inner.concurrent,
        )
    }

    pub fn start(&self) {
        let Ok(mut status) = self.inner.status.lock() else {
            return;
        };
        if *status == TaskStatus::Pending {
            *status = TaskStatus::Running;
            self.inner.ctx.sink().start(&self.inner.key);
        }
    }

    pub fn complete(&self, message: Option<&str>) {
        if self.terminate(TaskStatus::Complete) {
            self.inner.ctx.sink().complete(&self.inner.key, message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.terminate(TaskStatus::Errored) {
            self.inner.ctx.mark_failed();
            self.inner.ctx.sink().error(&self.inner.key, message);
        }
    }

    pub fn skip(&self, message: Option<&str>) {
        if self.terminate(TaskStatus::Skipped) {
            self.inner.ctx.sink().skip(&self.inner.key, message);
        }
    }

    pub fn output(&self, line: &str) {
        self.inner.ctx.sink().output(&self.inner.key, line);
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        self.inner.ctx.log(level, message, Some(&self.inner.key));
    }

    /// 이 노드에 붙는 진행률 추적기를 만든다.
    pub fn progress(&self, name: &str, total: f64) -> Progress {
        let key = self
            .inner
            .ctx
            .unique_key(&format!("{}:{name}", self.inner.key));
        let total = total.max(0.0);
        let progress = Progress {
            inner: Arc::new(ProgressInner {
                data: Mutex::new(ProgressData {
                    key,
                    name: name.to_string(),
                    parent: self.inner.key.clone(),
                    value: 0.0,
                    total,
                    done: total <= 0.0,
                }),
                ctx: Arc::clone(&self.inner.ctx),
            }),
        };
        progress.emit();
        progress
    }

    /// 이 노드를 부모로 삼아 실행 단위를 돌린다.
    /// 하위 노드의 실패는 그 노드에서 이미 보고되므로, 노드 밖 실패만 `Err`가 된다.
    pub async fn run(&self, runnable: Runnable) -> anyhow::Result<()> {
        super::execute(runnable, super::Scope::within(self.clone())).await
    }

    /// 종료 상태는 한 번만 기록된다. 처음 종료할 때만 true.
    fn terminate(&self, next: TaskStatus) -> bool {
        let Ok(mut status) = self.inner.status.lock() else {
            return false;
        };
        if status.is_terminal() {
            return false;
        }
        if *status == TaskStatus::Pending {
            self.inner.ctx.sink().start(&self.inner.key);
        }
        *status = next;
        true
    }
}

struct ProgressInner {
    data: Mutex<ProgressData>,
    ctx: Arc<RunContext>,
}

/// 진행률 핸들. 값은 `[0, total]` 안에서만 늘어난다.
#[derive(Clone)]
pub struct Progress {
    inner: Arc<ProgressInner>,
}

impl Progress {
    pub fn update(&self, delta: f64) {
        self.modify(|data| {
            if delta > 0.0 {
                data.value = (data.value + delta).min(data.total);
            }
        });
    }

    /// 전체량을 바꾼다. 현재 값보다 작게 줄일 수는 없다.
    pub fn set_total(&self, total: f64) {
        self.modify(|data| {
            data.total = total.max(data.value);
        });
    }

    pub fn finish(&self) {
        self.modify(|data| {
            data.value = data.total;
        });
    }

    pub fn snapshot(&self) -> Option<ProgressData> {
        self.inner.data.lock().ok().map(|data| data.clone())
    }

    fn modify(&self, f: impl FnOnce(&mut ProgressData)) {
        let Ok(mut data) = self.inner.data.lock() else {
            return;
        };
        if data.done {
            return;
        }
        f(&mut data);
        data.done = data.value >= data.total;
        self.inner.ctx.sink().progress(&data);
    }

    fn emit(&self) {
        if let Ok(data) = self.inner.data.lock() {
            self.inner.ctx.sink().progress(&data);
        }
    }
}

/// 핸들러가 받는 앱 핸들. 루트 작업 생성과 주변 로그용.
#[derive(Clone)]
pub struct AppHandle {
    ctx: Arc<RunContext>,
}

impl AppHandle {
    pub(crate) fn new(ctx: Arc<RunContext>) -> Self {
        Self { ctx }
    }

    /// 부모 없는 루트 작업을 만든다.
    pub fn task(&self, name: &str) -> Task {
        Task::create(&self.ctx, name, None, None, false)
    }

    /// 작업 키 없이 남기는 로그. 현재 직렬 작업에 귀속된다.
    pub fn log(&self, level: LogLevel, message: &str) {
        self.ctx.log(level, message, None);
    }

    pub async fn run(&self, runnable: Runnable) -> anyhow::Result<()> {
        super::execute(runnable, super::Scope::root(Arc::clone(&self.ctx))).await
    }
}
