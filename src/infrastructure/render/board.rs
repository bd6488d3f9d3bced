//! 렌더러가 읽는 작업 트리 읽기 모델.
//! 표시 계층이 이벤트를 받을 때만 갱신한다.

use std::collections::HashMap;
use std::time::Instant;

use crate::domain::task::{ProgressData, TaskNode, TaskStatus};

#[derive(Debug, Default)]
pub struct Board {
    roots: Vec<String>,
    nodes: HashMap<String, TaskNode>,
    progress: HashMap<String, ProgressData>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// 같은 키가 이미 있으면 무시하고 false.
    pub fn create(&mut self, key: &str, name: &str, parent: Option<&str>) -> bool {
        if self.nodes.contains_key(key) {
            return false;
        }
        let parent = parent.filter(|p| self.nodes.contains_key(*p));
        match parent {
            Some(parent_key) => {
                if let Some(node) = self.nodes.get_mut(parent_key) {
                    node.children.push(key.to_string());
                }
            }
            None => self.roots.push(key.to_string()),
        }
        self.nodes.insert(
            key.to_string(),
            TaskNode::new(key, name, parent.map(str::to_string)),
        );
        true
    }

    pub fn start(&mut self, key: &str, at: Instant) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.start(at);
        }
    }

    /// 종료를 기록한다. 완료 메시지는 부모 노드의 메시지로도 올라간다.
    pub fn finish(
        &mut self,
        key: &str,
        status: TaskStatus,
        message: Option<&str>,
        at: Instant,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(key) else {
            return false;
        };
        if !node.finish(status, message.map(str::to_string), at) {
            return false;
        }
        let parent = node.parent.clone();
        if status == TaskStatus::Complete
            && let (Some(parent), Some(message)) = (parent, message)
            && let Some(parent) = self.nodes.get_mut(&parent)
        {
            parent.message = Some(message.to_string());
        }
        true
    }

    pub fn output(&mut self, key: &str, line: &str) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.output.push(line.to_string());
        }
    }

    pub fn set_message(&mut self, key: &str, message: String) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.message = Some(message);
        }
    }

    /// 진행률을 갱신한다. 소속 노드의 목록에만 키가 추가된다.
    pub fn progress(&mut self, data: &ProgressData) {
        if let Some(node) = self.nodes.get_mut(&data.parent)
            && !node.status.is_terminal()
            && !node.progress.contains(&data.key)
        {
            node.progress.push(data.key.clone());
        }
        self.progress.insert(data.key.clone(), data.clone());
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn node(&self, key: &str) -> Option<&TaskNode> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// 노드에 붙은 진행률(선언 순서).
    pub fn progress_of(&self, node: &TaskNode) -> Vec<&ProgressData> {
        node.progress
            .iter()
            .filter_map(|key| self.progress.get(key))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
