//! `tasklane` 데모 바이너리 진입점.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing_subscriber::EnvFilter;

use tasklane::{
    ArgumentSpec, Cli, CommandSpec, Invocation, LogLevel, OptionSpec, PromptKind, PromptSpec,
    Runnable, Task, Value, ValueType,
};

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter.unwrap_or_else(|| "warn".into()))
        .with_filter_reloading();
    let reload = builder.reload_handle();
    builder.init();

    let mut cli = demo_cli();
    // RUST_LOG가 있으면 그쪽을 우선한다.
    if !from_env {
        cli = cli.level_hook(move |level: LogLevel| {
            let _ = reload.reload(EnvFilter::new(level.tracing_directive()));
        });
    }

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let ok = cli.run(argv).await;
    std::process::exit(if ok { 0 } else { 1 });
}

fn demo_cli() -> Cli {
    Cli::new("tasklane", env!("CARGO_PKG_VERSION"))
        .require_command()
        .command(
            CommandSpec::new("count")
                .describe("Count lines of files in parallel")
                .argument(
                    ArgumentSpec::new("file")
                        .kind(ValueType::Path)
                        .array()
                        .required()
                        .min(1)
                        .describe("Files to read"),
                ),
        )
        .command(
            CommandSpec::new("install")
                .describe("Simulate a download with nested verification")
                .option(
                    OptionSpec::new("steps")
                        .kind(ValueType::Number)
                        .default_value(5.0)
                        .describe("Number of packages"),
                ),
        )
        .command(
            CommandSpec::new("exec")
                .alias("x")
                .describe("Run a program and stream its output")
                .argument(ArgumentSpec::new("program").required().order(1))
                .argument(ArgumentSpec::new("args").array().order(2)),
        )
        .command(
            CommandSpec::new("login")
                .describe("Ask for credentials")
                .argument(
                    ArgumentSpec::new("username")
                        .required()
                        .order(1)
                        .prompt(PromptSpec::new(PromptKind::Input, "Username")),
                )
                .argument(
                    ArgumentSpec::new("password")
                        .required()
                        .order(2)
                        .prompt(PromptSpec::new(PromptKind::Password, "Password")),
                ),
        )
        .command(CommandSpec::new("options").describe("Print the resolved options as JSON"))
        .on("count", count)
        .on("install", install)
        .on("exec", exec)
        .on("login", login)
        .on("options", options)
}

async fn count(invocation: Invocation) -> Result<Runnable> {
    let files: Vec<PathBuf> = invocation
        .argument("file")
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(|value| value.as_path().cloned())
        .collect();

    Ok(Runnable::parallel(files.into_iter().map(|path| {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Runnable::call(name, move |_task: Task| async move {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok::<_, anyhow::Error>(format!("{} lines", text.lines().count()))
        })
    })))
}

async fn install(invocation: Invocation) -> Result<Runnable> {
    let steps = invocation
        .option("steps")
        .and_then(Value::as_f64)
        .unwrap_or(5.0)
        .max(1.0);

    let download = Runnable::call("Download", move |task: Task| async move {
        let packages = task.progress("packages", steps);
        for _ in 0..steps as usize {
            tokio::time::sleep(Duration::from_millis(150)).await;
            packages.update(1.0);
        }
        task.log(LogLevel::Info, "all packages fetched");
        Ok(Runnable::call("Verify", move |task: Task| async move {
            let checksums = task.progress("checksums", steps);
            for _ in 0..steps as usize {
                tokio::time::sleep(Duration::from_millis(80)).await;
                checksums.update(1.0);
            }
            Ok("checksums match")
        }))
    });
    let link = Runnable::call("Link", |_task: Task| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok("linked")
    });
    Ok(Runnable::series([download, link]))
}

async fn exec(invocation: Invocation) -> Result<Runnable> {
    let program = invocation
        .argument("program")
        .map(Value::stringify)
        .unwrap_or_default();
    let args: Vec<String> = invocation
        .argument("args")
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .map(Value::stringify)
        .collect();

    let child = Command::new(&program)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;
    Ok(Runnable::call(program, move |_task: Task| async move {
        Ok(Runnable::from(child))
    }))
}

async fn login(invocation: Invocation) -> Result<Runnable> {
    let username = invocation
        .argument("username")
        .map(Value::stringify)
        .unwrap_or_default();
    let password_len = invocation
        .argument("password")
        .map(|value| value.stringify().chars().count())
        .unwrap_or(0);

    Ok(Runnable::call("Login", move |task: Task| async move {
        task.log(
            LogLevel::Verbose,
            &format!("received a {password_len}-character password"),
        );
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(format!("logged in as {username}"))
    }))
}

async fn options(invocation: Invocation) -> Result<()> {
    let json = serde_json::to_string_pretty(&invocation.options)
        .context("failed to serialize options")?;
    println!("{json}");
    Ok(())
}
