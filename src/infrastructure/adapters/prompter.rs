//! 대화형 입력 포트 구현 어댑터.

use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::application::ports::{PromptRequest, Prompter};
use crate::domain::schema::PromptKind;

/// stderr에 질문을 쓰고 stdin에서 한 줄씩 답을 읽는 어댑터.
pub struct StdinPrompter;

#[async_trait]
impl Prompter for StdinPrompter {
    async fn prompt(&self, requests: &[PromptRequest]) -> Result<BTreeMap<String, String>> {
        let requests = requests.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut answers = BTreeMap::new();
            for request in &requests {
                let answer = ask(request)?;
                answers.insert(request.name.clone(), answer);
            }
            Ok::<_, anyhow::Error>(answers)
        })
        .await
        .context("prompt task panicked")?
    }
}

fn ask(request: &PromptRequest) -> Result<String> {
    let mut err = io::stderr();
    write!(err, "? {}", request.message)?;
    if !request.choices.is_empty() {
        write!(err, " ({})", request.choices.join("/"))?;
    }
    match (&request.kind, &request.default) {
        (PromptKind::Confirm, Some(default)) if default == "true" => write!(err, " (Y/n)")?,
        (PromptKind::Confirm, _) => write!(err, " (y/N)")?,
        (PromptKind::Password, _) => {}
        (_, Some(default)) => write!(err, " [{default}]")?,
        _ => {}
    }
    write!(err, " ")?;
    err.flush()?;

    let raw = if request.kind == PromptKind::Password && io::stdin().is_terminal() {
        read_hidden()?
    } else {
        read_line()?
    };
    Ok(normalize(request, raw.trim()))
}

/// 빈 입력은 기본값으로, confirm 응답은 true/false로 맞춘다.
fn normalize(request: &PromptRequest, answer: &str) -> String {
    if answer.is_empty() {
        return match (&request.kind, &request.default) {
            (_, Some(default)) => default.clone(),
            (PromptKind::Confirm, None) => "false".into(),
            _ => String::new(),
        };
    }
    if request.kind == PromptKind::Confirm {
        let yes = matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes" | "true");
        return yes.to_string();
    }
    answer.to_string()
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    let read = io::stdin().read_line(&mut line)?;
    if read == 0 {
        bail!("stdin closed while waiting for input");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// raw 모드에서 에코 없이 한 줄을 읽는다.
fn read_hidden() -> Result<String> {
    let _guard = RawGuard::enter()?;
    let mut input = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => break,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                bail!("input cancelled");
            }
            KeyCode::Char(ch) => input.push(ch),
            _ => {}
        }
    }
    Ok(input)
}

struct RawGuard;

impl RawGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = writeln!(io::stderr());
    }
}

/// 미리 정한 답을 돌려주는 어댑터(임베딩/테스트용). 없는 이름은 답하지 않는다.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    answers: BTreeMap<String, String>,
}

impl ScriptedPrompter {
    pub fn new<I, K, V>(answers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            answers: answers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn prompt(&self, requests: &[PromptRequest]) -> Result<BTreeMap<String, String>> {
        Ok(requests
            .iter()
            .filter_map(|request| {
                self.answers
                    .get(&request.name)
                    .map(|answer| (request.name.clone(), answer.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: PromptKind, default: Option<&str>) -> PromptRequest {
        PromptRequest {
            name: "name".into(),
            message: "Name?".into(),
            kind,
            choices: Vec::new(),
            default: default.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_empty_uses_default() {
        assert_eq!(normalize(&request(PromptKind::Input, Some("bob")), ""), "bob");
        assert_eq!(normalize(&request(PromptKind::Confirm, None), ""), "false");
        assert_eq!(normalize(&request(PromptKind::Confirm, None), "Y"), "true");
        assert_eq!(normalize(&request(PromptKind::Input, None), "alice"), "alice");
    }

    #[tokio::test]
    async fn test_scripted_prompter_answers_known_names() {
        let prompter = ScriptedPrompter::new([("name", "alice")]);
        let mut other = request(PromptKind::Input, None);
        other.name = "other".into();
        let answers = prompter
            .prompt(&[request(PromptKind::Input, None), other])
            .await
            .unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers["name"], "alice");
    }
}
