use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tasklane::application::ports::EventSink;
use tasklane::domain::task::{LogRecord, ProgressData};
use tasklane::{LogLevel, Runnable, Task, TaskRuntime};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Create { key: String, parent: Option<String> },
    Start(String),
    Output(String, String),
    Complete(String, Option<String>),
    Error(String, String),
    Skip(String),
    Progress(ProgressData),
    Log(LogRecord),
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn created(&self) -> Vec<(String, Option<String>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Create { key, parent } => Some((key, parent)),
                _ => None,
            })
            .collect()
    }

    fn progress(&self) -> Vec<ProgressData> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Progress(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    fn position(&self, wanted: &Event) -> usize {
        self.events()
            .iter()
            .position(|event| event == wanted)
            .unwrap_or_else(|| panic!("missing event {wanted:?}"))
    }
}

impl EventSink for Recorder {
    fn create(&self, key: &str, _name: &str, parent: Option<&str>) {
        self.push(Event::Create {
            key: key.to_string(),
            parent: parent.map(str::to_string),
        });
    }

    fn start(&self, key: &str) {
        self.push(Event::Start(key.to_string()));
    }

    fn output(&self, key: &str, line: &str) {
        self.push(Event::Output(key.to_string(), line.to_string()));
    }

    fn complete(&self, key: &str, message: Option<&str>) {
        self.push(Event::Complete(key.to_string(), message.map(str::to_string)));
    }

    fn error(&self, key: &str, message: &str) {
        self.push(Event::Error(key.to_string(), message.to_string()));
    }

    fn skip(&self, key: &str, _message: Option<&str>) {
        self.push(Event::Skip(key.to_string()));
    }

    fn progress(&self, data: &ProgressData) {
        self.push(Event::Progress(data.clone()));
    }

    fn log(&self, record: &LogRecord) {
        self.push(Event::Log(record.clone()));
    }
}

fn runtime() -> (Arc<Recorder>, TaskRuntime) {
    let recorder = Arc::new(Recorder::default());
    let runtime = TaskRuntime::new(recorder.clone());
    (recorder, runtime)
}

fn key(name: &str) -> String {
    name.to_string()
}

#[tokio::test]
async fn test_creation_order_for_series_then_parallel() {
    let (recorder, runtime) = runtime();
    let ok = runtime
        .run(Runnable::series([
            Runnable::message("a"),
            Runnable::parallel([
                Runnable::call("b", |_task: Task| async { Ok("b done") }),
                Runnable::call("c", |_task: Task| async { Ok("c done") }),
            ]),
        ]))
        .await;

    assert!(ok);
    assert_eq!(
        recorder.created(),
        vec![(key("a"), None), (key("b"), None), (key("c"), None)]
    );
    assert!(recorder.events().contains(&Event::Complete(key("a"), Some(key("a")))));
    assert!(recorder.events().contains(&Event::Complete(key("c"), Some(key("c done")))));
}

#[tokio::test]
async fn test_progress_stays_with_its_own_task() {
    let (recorder, runtime) = runtime();
    let ok = runtime
        .run(Runnable::call("Download", |task: Task| async move {
            let packages = task.progress("packages", 2.0);
            packages.update(1.0);
            packages.update(1.0);
            Ok(Runnable::call("Verify", |task: Task| async move {
                let checksums = task.progress("checksums", 1.0);
                checksums.finish();
                Ok("verified")
            }))
        }))
        .await;

    assert!(ok);
    assert_eq!(
        recorder.created(),
        vec![(key("Download"), None), (key("Verify"), Some(key("Download")))]
    );

    let progress = recorder.progress();
    let packages: Vec<_> = progress.iter().filter(|p| p.name == "packages").collect();
    let checksums: Vec<_> = progress.iter().filter(|p| p.name == "checksums").collect();
    assert!(packages.iter().all(|p| p.parent == "Download" && p.key == "Download:packages"));
    assert!(checksums.iter().all(|p| p.parent == "Verify" && p.key == "Verify:checksums"));
    assert!(packages.last().unwrap().done);
    assert!(checksums.last().unwrap().done);

    let verify_done = recorder.position(&Event::Complete(key("Verify"), Some(key("verified"))));
    let download_done = recorder.position(&Event::Complete(key("Download"), None));
    assert!(verify_done < download_done);
}

#[tokio::test]
async fn test_progress_clamps_and_freezes_when_done() {
    let (recorder, runtime) = runtime();
    let handle = runtime.handle();
    let task = handle.task("fetch");
    let bytes = task.progress("bytes", 10.0);
    bytes.update(4.0);
    bytes.update(-3.0);
    bytes.update(100.0);
    bytes.update(1.0);

    let snapshot = bytes.snapshot().unwrap();
    assert_eq!(snapshot.value, 10.0);
    assert!(snapshot.done);
    // 생성 1회 + 유효 갱신 3회(음수 갱신도 이벤트는 남긴다). 완료 후 갱신은 무시된다.
    assert_eq!(recorder.progress().len(), 4);
}

#[tokio::test]
async fn test_child_failure_keeps_parent_complete_and_fails_run() {
    let (recorder, runtime) = runtime();
    let ok = runtime
        .run(Runnable::call("parent", |_task: Task| async {
            Ok(Runnable::call("child", |_task: Task| async {
                Err::<(), _>(anyhow!("boom"))
            }))
        }))
        .await;

    assert!(!ok);
    let events = recorder.events();
    assert!(events.contains(&Event::Error(key("child"), key("boom"))));
    assert!(events.contains(&Event::Complete(key("parent"), None)));
}

#[tokio::test]
async fn test_duplicate_names_get_unique_keys() {
    let (recorder, runtime) = runtime();
    runtime
        .run(Runnable::series([
            Runnable::call("build", |_task: Task| async { Ok(()) }),
            Runnable::call("build", |_task: Task| async { Ok(()) }),
        ]))
        .await;

    let keys: Vec<String> = recorder.created().into_iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec!["build", "build#2"]);
}

#[tokio::test]
async fn test_unattributed_log_goes_to_current_task() {
    let (recorder, runtime) = runtime();
    let handle = runtime.handle();
    let inner = handle.clone();
    runtime
        .run(Runnable::call("work", move |_task: Task| async move {
            inner.log(LogLevel::Warn, "careful");
            Ok(())
        }))
        .await;
    handle.log(LogLevel::Info, "outside");

    let logs: Vec<LogRecord> = recorder
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::Log(record) => Some(record),
            _ => None,
        })
        .collect();
    assert_eq!(logs[0].task.as_deref(), Some("work"));
    assert_eq!(logs[1].task, None);
}

#[tokio::test]
async fn test_lines_become_output_events() {
    let (recorder, runtime) = runtime();
    let ok = runtime.run(Runnable::lines(&b"one\ntwo\n"[..])).await;

    assert!(ok);
    let events = recorder.events();
    assert_eq!(recorder.created(), vec![(key("output"), None)]);
    assert!(events.contains(&Event::Output(key("output"), key("one"))));
    assert!(events.contains(&Event::Output(key("output"), key("two"))));
    assert!(events.contains(&Event::Complete(key("output"), None)));
}

#[tokio::test]
async fn test_explicit_skip_is_terminal() {
    let (recorder, runtime) = runtime();
    let ok = runtime
        .run(Runnable::call("lint", |task: Task| async move {
            task.skip(Some("cached"));
            Ok(())
        }))
        .await;

    assert!(ok);
    let events = recorder.events();
    assert!(events.contains(&Event::Skip(key("lint"))));
    assert!(!events.iter().any(|e| matches!(e, Event::Complete(k, _) if k == "lint")));
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_exit_code_becomes_error() {
    use std::process::Stdio;

    let (recorder, runtime) = runtime();
    let child = tokio::process::Command::new("sh")
        .args(["-c", "echo hi; exit 3"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let ok = runtime
        .run(Runnable::call("script", move |_task: Task| async move {
            Ok(Runnable::from(child))
        }))
        .await;

    assert!(!ok);
    let events = recorder.events();
    assert!(events.contains(&Event::Output(key("script"), key("hi"))));
    assert!(events.contains(&Event::Error(key("script"), key("exited with code 3"))));
}

#[tokio::test]
async fn test_plain_value_in_group_gets_its_own_node() {
    let (recorder, runtime) = runtime();
    let ok = runtime
        .run(Runnable::call("parent", |_task: Task| async {
            Ok(Runnable::series([
                Runnable::message("half"),
                Runnable::call("child", |_task: Task| async {
                    Err::<(), _>(anyhow!("boom"))
                }),
            ]))
        }))
        .await;

    assert!(!ok);
    assert_eq!(
        recorder.created(),
        vec![
            (key("parent"), None),
            (key("half"), Some(key("parent"))),
            (key("child"), Some(key("parent"))),
        ]
    );
    let events = recorder.events();
    assert!(!events.contains(&Event::Complete(key("parent"), Some(key("half")))));
    let half_done = recorder.position(&Event::Complete(key("half"), Some(key("half"))));
    let child_failed = recorder.position(&Event::Error(key("child"), key("boom")));
    let parent_done = recorder.position(&Event::Complete(key("parent"), None));
    assert!(half_done < child_failed);
    assert!(child_failed < parent_done);
}

#[tokio::test]
async fn test_failure_stops_later_serial_siblings() {
    let (recorder, runtime) = runtime();
    let ok = runtime
        .run(Runnable::series([
            Runnable::call("first", |_task: Task| async { Err::<(), _>(anyhow!("nope")) }),
            Runnable::call("after", |_task: Task| async { Ok(()) }),
        ]))
        .await;

    assert!(!ok);
    assert_eq!(recorder.created(), vec![(key("first"), None)]);
}

#[tokio::test]
async fn test_parallel_failure_does_not_cancel_siblings() {
    let (recorder, runtime) = runtime();
    let ok = runtime
        .run(Runnable::series([
            Runnable::parallel([
                Runnable::call("p1", |_task: Task| async { Err::<(), _>(anyhow!("broken")) }),
                Runnable::call("p2", |_task: Task| async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok("p2 done")
                }),
            ]),
            Runnable::call("after", |_task: Task| async { Ok(()) }),
        ]))
        .await;

    assert!(!ok);
    let events = recorder.events();
    assert!(events.contains(&Event::Error(key("p1"), key("broken"))));
    assert!(events.contains(&Event::Complete(key("p2"), Some(key("p2 done")))));
    assert!(!recorder.created().iter().any(|(k, _)| k == "after"));
}

#[tokio::test]
async fn test_concurrent_branch_keeps_current_task() {
    let (recorder, runtime) = runtime();
    let handle = runtime.handle();
    runtime
        .run(Runnable::call("outer", move |_task: Task| async move {
            Ok(Runnable::parallel([
                Runnable::call("left", move |_task: Task| async move {
                    handle.log(LogLevel::Warn, "from left");
                    Ok(())
                }),
                Runnable::call("right", |_task: Task| async { Ok(()) }),
            ]))
        }))
        .await;

    let logs: Vec<LogRecord> = recorder
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::Log(record) => Some(record),
            _ => None,
        })
        .collect();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].task.as_deref(), Some("outer"));
}

#[tokio::test]
async fn test_nested_vec_runs_inner_group_concurrently() {
    let (recorder, runtime) = runtime();
    let ok = runtime
        .run(Runnable::from(vec![
            vec![Runnable::call("a", |_task: Task| async { Ok(()) })],
            vec![
                Runnable::call("b", |_task: Task| async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(())
                }),
                Runnable::call("c", |_task: Task| async { Ok(()) }),
            ],
        ]))
        .await;

    assert!(ok);
    let a_done = recorder.position(&Event::Complete(key("a"), None));
    let b_start = recorder.position(&Event::Start(key("b")));
    let c_start = recorder.position(&Event::Start(key("c")));
    let b_done = recorder.position(&Event::Complete(key("b"), None));
    assert!(a_done < b_start);
    assert!(c_start < b_done);
}

#[tokio::test]
async fn test_zero_total_progress_starts_done() {
    let (recorder, runtime) = runtime();
    let task = runtime.handle().task("fetch");
    let empty = task.progress("empty", 0.0);
    empty.update(1.0);

    assert!(empty.snapshot().unwrap().done);
    let progress = recorder.progress();
    assert_eq!(progress.len(), 1);
    assert!(progress[0].done);
}
