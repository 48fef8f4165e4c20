//! # 诊断模块
//!
//! 数据驱动脚本的静态检查，不依赖 IO 或场景。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 复用 [`Script`] 的解析与标签收集，不重复解析逻辑

use std::collections::{HashMap, HashSet};

use crate::drawing::{DrawingKind, DrawingOnScreen};
use crate::event::{FadeOutNode, Script, ScriptNode};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// 脚本 ID / 文件路径
    pub script_id: String,
    /// 节点下标（从 0 开始）
    pub node: Option<usize>,
    pub message: String,
    pub detail: Option<String>,
}

impl Diagnostic {
    fn with_level(
        level: DiagnosticLevel,
        script_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            script_id: script_id.into(),
            node: None,
            message: message.into(),
            detail: None,
        }
    }

    pub fn error(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, script_id, message)
    }

    pub fn warn(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, script_id, message)
    }

    pub fn info(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, script_id, message)
    }

    /// 设置节点下标
    pub fn with_node(mut self, node: usize) -> Self {
        self.node = Some(node);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.script_id)?;
        if let Some(node) = self.node {
            write!(f, "#{}", node)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

//=============================================================================
// 脚本分析 API
//=============================================================================

/// 解析并分析 JSON 脚本
///
/// 解析失败时返回单条错误诊断，`source` 用于定位（通常是文件路径）。
pub fn analyze_json(source: &str, json: &str) -> DiagnosticResult {
    match Script::from_json(json) {
        Ok(script) => analyze_script(&script),
        Err(e) => {
            let mut result = DiagnosticResult::new();
            result.push(Diagnostic::error(source, "脚本解析失败").with_detail(e.to_string()));
            result
        }
    }
}

/// 分析脚本，返回诊断结果
///
/// 执行以下检查：
/// - 重复定义的 label
/// - 未定义的跳转目标（goto / jump_if）
/// - `fade_out` 引用了没有任何 `fade_in` 绑定的名称
/// - 绑定后从未淡出的 `fade_in`（信息）
/// - `finish` / `goto` 之后、下一个 label 之前无法到达的节点
/// - 空的对话文本
pub fn analyze_script(script: &Script) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let id = script.id.as_str();

    if script.nodes.is_empty() {
        result.push(Diagnostic::warn(id, "脚本没有任何节点"));
    }

    let mut labels: HashMap<&str, usize> = HashMap::new();
    for (index, node) in script.nodes.iter().enumerate() {
        if let ScriptNode::Label { name } = node {
            if labels.insert(name.as_str(), index).is_some() {
                result.push(
                    Diagnostic::error(id, format!("重复定义的 label: {name}")).with_node(index),
                );
            }
        }
    }

    let bound: HashSet<&str> = script
        .nodes
        .iter()
        .filter_map(|node| match node {
            ScriptNode::FadeIn { bind, .. } => bind.as_deref(),
            _ => None,
        })
        .collect();
    let mut faded_out: HashSet<&str> = HashSet::new();

    // 最近一个 finish/goto 的下标，遇到 label 重置
    let mut dead_after: Option<usize> = None;
    let mut reported = false;
    for (index, node) in script.nodes.iter().enumerate() {
        if let ScriptNode::Label { .. } = node {
            dead_after = None;
            reported = false;
        } else if let Some(after) = dead_after {
            // 每段只报一次
            if !reported {
                result.push(
                    Diagnostic::warn(id, "无法到达的节点")
                        .with_node(index)
                        .with_detail(format!(
                            "位于节点 #{after} 的 finish/goto 之后且前面没有 label"
                        )),
                );
                reported = true;
            }
        }

        match node {
            ScriptNode::Goto { label } | ScriptNode::JumpIf { label, .. } => {
                if !labels.contains_key(label.as_str()) {
                    result.push(
                        Diagnostic::error(id, format!("未定义的跳转目标: {label}"))
                            .with_node(index),
                    );
                }
            }
            ScriptNode::FadeOut {
                target: FadeOutNode::Binding(name),
                ..
            } => {
                if bound.contains(name.as_str()) {
                    faded_out.insert(name.as_str());
                } else {
                    result.push(
                        Diagnostic::error(id, format!("淡出引用了未绑定的名称: {name}"))
                            .with_node(index)
                            .with_detail("没有任何 fade_in 节点以该名称 bind"),
                    );
                }
            }
            ScriptNode::Say { text, .. } if text.trim().is_empty() => {
                result.push(Diagnostic::warn(id, "对话文本为空").with_node(index));
            }
            _ => {}
        }

        if matches!(node, ScriptNode::Finish { .. } | ScriptNode::Goto { .. })
            && dead_after.is_none()
        {
            dead_after = Some(index);
        }
    }

    let mut lingering: Vec<&str> = bound.difference(&faded_out).copied().collect();
    lingering.sort_unstable();
    for name in lingering {
        result.push(
            Diagnostic::info(id, format!("绑定 {name} 的淡入从未淡出"))
                .with_detail("该绘制会在事件结束后继续显示"),
        );
    }

    result
}

/// 提取脚本中引用的精灵图路径（去重，按出现顺序）
///
/// 只看 `fade_in` 与 `fade_out` 节点直接携带的绘制对象；角色外观来自区域数据，不在脚本里。
pub fn extract_sprite_references(script: &Script) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    let mut push = |drawings: &[DrawingOnScreen]| {
        for drawing in drawings {
            if let DrawingKind::Sprite(path) = &drawing.drawing.kind
                && !refs.contains(path)
            {
                refs.push(path.clone());
            }
        }
    };
    for node in &script.nodes {
        match node {
            ScriptNode::FadeIn { drawings, .. }
            | ScriptNode::FadeOut {
                target: FadeOutNode::Drawings(drawings),
                ..
            } => push(drawings),
            _ => {}
        }
    }
    refs
}
