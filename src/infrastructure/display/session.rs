//! 표시 세션과 팩토리. 터미널 모드에서는 고정 주기로 다시 그린다.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::{Display, Output, supports_live};
use crate::application::ports::{DisplayFactory, DisplaySession, DisplaySettings, EventSink};

const TICK: Duration = Duration::from_millis(40);

type OutputFactory = Arc<dyn Fn() -> Output + Send + Sync>;

/// stderr에 그리는 기본 표시 팩토리.
#[derive(Clone, Default)]
pub struct TerminalDisplayFactory {
    /// `Some`이면 터미널 감지를 건너뛴다. `--ci`는 여전히 실시간 모드를 끈다.
    live: Option<bool>,
    output: Option<OutputFactory>,
}

impl TerminalDisplayFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(mut self, live: bool) -> Self {
        self.live = Some(live);
        self
    }

    /// 세션마다 새 출력 대상을 만든다(테스트/임베딩용).
    pub fn output<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Output + Send + Sync + 'static,
    {
        self.output = Some(Arc::new(factory));
        self
    }
}

impl DisplayFactory for TerminalDisplayFactory {
    fn open(&self, settings: &DisplaySettings) -> Box<dyn DisplaySession> {
        let live = match self.live {
            Some(live) => live && !settings.ci,
            None => supports_live(settings.ci),
        };
        let display = match &self.output {
            Some(factory) => Display::with_output(settings.clone(), live, factory()),
            None => Display::new(settings.clone(), live),
        };
        Box::new(TerminalSession {
            display: Arc::new(display),
            ticker: Mutex::new(None),
        })
    }
}

pub struct TerminalSession {
    display: Arc<Display>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl DisplaySession for TerminalSession {
    fn sink(&self) -> Arc<dyn EventSink> {
        self.display.clone()
    }

    fn begin(&self) {
        if !self.display.is_live() {
            return;
        }
        self.display.hide_cursor();
        let display = Arc::clone(&self.display);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            loop {
                interval.tick().await;
                display.tick();
            }
        });
        if let Ok(mut ticker) = self.ticker.lock() {
            *ticker = Some(handle);
        }
    }

    async fn finish(&self) {
        let handle = self.ticker.lock().ok().and_then(|mut ticker| ticker.take());
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
        self.display.close();
    }
}
