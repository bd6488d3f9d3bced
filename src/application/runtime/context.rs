//! 실행 한 번 동안 공유되는 런타임 문맥.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::ports::EventSink;
use crate::domain::level::LogLevel;
use crate::domain::task::LogRecord;

/// 이벤트 싱크, 키 발급기, 현재 작업 포인터를 묶은 실행 범위 객체.
pub struct RunContext {
    sink: Arc<dyn EventSink>,
    keys: Mutex<HashSet<String>>,
    current: Mutex<Option<String>>,
    failed: AtomicBool,
}

impl RunContext {
    pub fn new(sink: Arc<dyn EventSink>) -> Arc<Self> {
        Arc::new(Self {
            sink,
            keys: Mutex::new(HashSet::new()),
            current: Mutex::new(None),
            failed: AtomicBool::new(false),
        })
    }

    pub fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    /// 실행 내에서 유일한 키를 발급한다. 중복이면 `#n`을 붙인다.
    pub fn unique_key(&self, requested: &str) -> String {
        let Ok(mut used) = self.keys.lock() else {
            return requested.to_string();
        };
        let mut n = 1;
        let mut key = requested.to_string();
        while used.contains(&key) {
            n += 1;
            key = format!("{requested}#{n}");
        }
        used.insert(key.clone());
        key
    }

    pub fn current(&self) -> Option<String> {
        self.current.lock().ok().and_then(|current| current.clone())
    }

    /// 현재 작업 포인터를 바꾸고 이전 값을 돌려준다.
    pub fn swap_current(&self, key: Option<String>) -> Option<String> {
        match self.current.lock() {
            Ok(mut current) => std::mem::replace(&mut *current, key),
            Err(_) => None,
        }
    }

    pub fn mark_failed(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }

    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// 작업 키가 없으면 현재 직렬 작업에 귀속시킨다.
    pub fn log(&self, level: LogLevel, message: &str, task: Option<&str>) {
        let record = LogRecord {
            level,
            message: message.to_string(),
            task: task.map(str::to_string).or_else(|| self.current()),
        };
        self.sink.log(&record);
    }
}
