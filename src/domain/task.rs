//! 작업 트리 노드와 진행률 기록.

use std::time::{Duration, Instant};

use super::level::LogLevel;

/// 작업 노드 수명 주기 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Skipped,
    Complete,
    Errored,
}

impl TaskStatus {
    /// complete/error/skip 중 하나로 끝났는지 여부.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Skipped | TaskStatus::Complete | TaskStatus::Errored
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Complete => "complete",
            TaskStatus::Errored => "error",
        }
    }
}

/// 작업 노드에 붙는 진행률 추적값 스냅샷.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressData {
    pub key: String,
    pub name: String,
    /// 진행률이 속한 작업 키.
    pub parent: String,
    pub value: f64,
    pub total: f64,
    pub done: bool,
}

impl ProgressData {
    /// 0.0 ~ 1.0 비율. total이 0이면 완료 여부로 판단한다.
    pub fn ratio(&self) -> f64 {
        if self.total <= 0.0 {
            return if self.done { 1.0 } else { 0.0 };
        }
        (self.value / self.total).clamp(0.0, 1.0)
    }
}

/// 레벨이 붙은 작업 로그 한 줄.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    /// 귀속된 작업 키(없으면 작업 밖 로그).
    pub task: Option<String>,
}

/// 표시 계층이 이벤트로만 채우는 작업 노드 읽기 모델.
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub key: String,
    pub name: String,
    pub parent: Option<String>,
    pub status: TaskStatus,
    pub started_at: Option<Instant>,
    pub ended_at: Option<Instant>,
    pub message: Option<String>,
    pub children: Vec<String>,
    /// 아직 끝나지 않은 진행률 키.
    pub progress: Vec<String>,
    /// 출력 이벤트로 쌓인 메시지 로그.
    pub output: Vec<String>,
}

impl TaskNode {
    pub fn new(key: impl Into<String>, name: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            parent,
            status: TaskStatus::Pending,
            started_at: None,
            ended_at: None,
            message: None,
            children: Vec::new(),
            progress: Vec::new(),
            output: Vec::new(),
        }
    }

    pub fn start(&mut self, at: Instant) {
        if self.status == TaskStatus::Pending {
            self.status = TaskStatus::Running;
            self.started_at = Some(at);
        }
    }

    /// 종료 상태는 한 번만 기록된다. 이미 끝났으면 false.
    pub fn finish(&mut self, status: TaskStatus, message: Option<String>, at: Instant) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        self.ended_at = Some(at);
        if self.started_at.is_none() {
            self.started_at = Some(at);
        }
        if message.is_some() {
            self.message = message;
        }
        self.progress.clear();
        true
    }

    /// 시작부터 종료(또는 `now`)까지 걸린 시간.
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(start) => self.ended_at.unwrap_or(now).saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }
}
