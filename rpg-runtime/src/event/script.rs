//! 数据驱动脚本
//!
//! 脚本以 JSON 描述为节点列表，由 [`ScriptRunner`] 逐节点执行。
//! 需要跨帧的节点（对话、淡入淡出、世界修改）交出一个 [`EventCall`]，
//! 控制流节点（标签、跳转）在同一次恢复内连续执行。
//!
//! ```json
//! {
//!   "id": "guard_talk",
//!   "cutscene": true,
//!   "nodes": [
//!     { "type": "say", "speaker": "@npc", "text": "Halt!" },
//!     { "type": "jump_if", "var": "has_pass", "label": "pass" },
//!     { "type": "finish" },
//!     { "type": "label", "name": "pass" },
//!     { "type": "finish", "completion": "dismiss" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::{
    EventCall, EventCompletion, EventResult, EventScript, FadeTarget, SayEvent, ScriptContext, Step,
    WorldUpdate,
};
use crate::background::BackgroundEventSentinel;
use crate::config::EngineConfig;
use crate::drawing::{Drawing, DrawingOnScreen, Vec2};
use crate::error::{ParseError, RuntimeError};
use crate::state::VarValue;
use crate::time::Millisecond;

/// 单次恢复内最多连续执行的控制流节点数
const MAX_STEPS_WITHOUT_YIELD: usize = 10_000;

/// 指代触发事件的 NPC
const NPC_ALIAS: &str = "@npc";
/// 指代玩家
const PLAYER_ALIAS: &str = "@player";

fn default_true() -> bool {
    true
}

/// 脚本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    /// 过场模式：开始前淡入上下遮幅，结束前淡出
    #[serde(default)]
    pub cutscene: bool,
    pub nodes: Vec<ScriptNode>,
}

/// 淡出节点的目标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeOutNode {
    /// `fade_in` 节点 `bind` 的名称
    Binding(String),
    /// 角色当前外观的快照（角色本身不受影响）
    Character(String),
    Drawings(Vec<DrawingOnScreen>),
}

/// 脚本节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptNode {
    /// 对话
    Say {
        #[serde(default)]
        speaker: Option<String>,
        text: String,
        #[serde(default = "default_true")]
        wait: bool,
        #[serde(default)]
        typing_delay: Option<Millisecond>,
    },
    /// 淡入；`bind` 记录其哨兵，供之后的 `fade_out` 使用
    FadeIn {
        drawings: Vec<DrawingOnScreen>,
        #[serde(default = "default_true")]
        wait: bool,
        #[serde(default)]
        duration: Option<Millisecond>,
        #[serde(default)]
        bind: Option<String>,
    },
    /// 淡出
    FadeOut {
        target: FadeOutNode,
        #[serde(default = "default_true")]
        wait: bool,
        #[serde(default)]
        duration: Option<Millisecond>,
    },
    /// 让角色淡出并隐藏
    FadeOutCharacter {
        name: String,
        #[serde(default)]
        duration: Option<Millisecond>,
    },
    SetVariable { name: String, value: VarValue },
    SetVisible { name: String, visible: bool },
    Label { name: String },
    Goto { label: String },
    /// 变量为真时跳转
    JumpIf { var: String, label: String },
    /// 结束脚本
    Finish {
        #[serde(default)]
        completion: EventCompletion,
    },
}

impl Script {
    /// 从 JSON 解析
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(|e| {
            // 节点无法解析时尽量报告脚本 id
            let script_id = serde_json::from_str::<serde_json::Value>(json)
                .ok()
                .and_then(|v| v.get("id")?.as_str().map(str::to_string))
                .unwrap_or_else(|| "<unknown>".to_string());
            ParseError::InvalidJson {
                script_id,
                message: e.to_string(),
            }
        })
    }

    /// 标签到节点下标的映射
    pub fn labels(&self) -> Result<HashMap<String, usize>, ParseError> {
        let mut labels = HashMap::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let ScriptNode::Label { name } = node else {
                continue;
            };
            if labels.insert(name.clone(), index).is_some() {
                return Err(ParseError::DuplicateLabel {
                    script_id: self.id.clone(),
                    label: name.clone(),
                });
            }
        }
        Ok(labels)
    }
}

/// 过场遮幅的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Letterbox {
    /// 非过场脚本
    Off,
    /// 尚未淡入
    Pending,
    /// 淡入中，等待哨兵
    Opening,
    Shown(BackgroundEventSentinel),
    /// 已淡出
    Closed,
}

/// [`Script`] 的执行器
#[derive(Debug)]
pub struct ScriptRunner {
    script: Arc<Script>,
    labels: Arc<HashMap<String, usize>>,
    /// 下一个节点
    pc: usize,
    bindings: HashMap<String, BackgroundEventSentinel>,
    /// 等待下一次恢复结果中的哨兵
    pending_bind: Option<String>,
    /// 一个节点展开出的后续调用
    queue: VecDeque<EventCall>,
    /// 遮幅淡出后交出的完成结果
    finishing: Option<EventCompletion>,
    letterbox: Letterbox,
}

impl ScriptRunner {
    pub fn new(script: Script) -> Result<Self, ParseError> {
        let labels = script.labels()?;
        Ok(Self::from_parts(Arc::new(script), Arc::new(labels)))
    }

    pub(crate) fn from_parts(script: Arc<Script>, labels: Arc<HashMap<String, usize>>) -> Self {
        let letterbox = if script.cutscene {
            Letterbox::Pending
        } else {
            Letterbox::Off
        };
        Self {
            script,
            labels,
            pc: 0,
            bindings: HashMap::new(),
            pending_bind: None,
            queue: VecDeque::new(),
            finishing: None,
            letterbox,
        }
    }

    fn jump(&mut self, label: &str) -> Result<(), RuntimeError> {
        self.pc = *self
            .labels
            .get(label)
            .ok_or_else(|| RuntimeError::LabelNotFound {
                label: label.to_string(),
            })?;
        Ok(())
    }

    /// 解析 `@npc` / `@player`
    fn resolve_name(&self, name: &str, ctx: &ScriptContext<'_>) -> String {
        match name {
            NPC_ALIAS => ctx.npc.to_string(),
            PLAYER_ALIAS => ctx.player().name().to_string(),
            other => other.to_string(),
        }
    }

    /// 结束脚本；过场模式下先淡出遮幅
    fn finish(&mut self, completion: EventCompletion, config: &EngineConfig) -> Step {
        match self.letterbox {
            Letterbox::Shown(sentinel) => {
                self.letterbox = Letterbox::Closed;
                self.finishing = Some(completion);
                Step::Yield(EventCall::FadeOut {
                    target: FadeTarget::Sentinel(sentinel),
                    wait: config.cutscene.wait,
                    duration: Some(config.cutscene.duration_or(&config.animation)),
                })
            }
            _ => Step::Done(completion),
        }
    }

    /// 执行节点直到交出调用或结束
    fn run_nodes(&mut self, ctx: &ScriptContext<'_>) -> Result<Step, RuntimeError> {
        let script = Arc::clone(&self.script);
        for _ in 0..MAX_STEPS_WITHOUT_YIELD {
            let Some(node) = script.nodes.get(self.pc) else {
                return Ok(self.finish(EventCompletion::Nothing, ctx.config));
            };
            self.pc += 1;
            let call = match node {
                ScriptNode::Say {
                    speaker,
                    text,
                    wait,
                    typing_delay,
                } => EventCall::Say(SayEvent {
                    speaker: speaker.as_deref().map(|s| self.resolve_name(s, ctx)),
                    text: text.clone(),
                    wait: *wait,
                    typing_delay: *typing_delay,
                }),
                ScriptNode::FadeIn {
                    drawings,
                    wait,
                    duration,
                    bind,
                } => {
                    self.pending_bind = bind.clone();
                    EventCall::FadeIn {
                        resource: drawings.clone().into(),
                        wait: *wait,
                        duration: *duration,
                    }
                }
                ScriptNode::FadeOut {
                    target,
                    wait,
                    duration,
                } => {
                    let target = match target {
                        FadeOutNode::Binding(name) => {
                            let sentinel = self.bindings.remove(name).ok_or_else(|| {
                                RuntimeError::UnboundName { name: name.clone() }
                            })?;
                            FadeTarget::Sentinel(sentinel)
                        }
                        FadeOutNode::Character(name) => {
                            let name = self.resolve_name(name, ctx);
                            FadeTarget::Drawings(ctx.character(&name)?.drawing_on_screens())
                        }
                        FadeOutNode::Drawings(drawings) => FadeTarget::Drawings(drawings.clone()),
                    };
                    EventCall::FadeOut {
                        target,
                        wait: *wait,
                        duration: *duration,
                    }
                }
                ScriptNode::FadeOutCharacter { name, duration } => {
                    let name = self.resolve_name(name, ctx);
                    let snapshot = ctx.character(&name)?.drawing_on_screens();
                    self.queue
                        .push_back(EventCall::Update(WorldUpdate::SetVisible {
                            name,
                            visible: false,
                        }));
                    EventCall::FadeOut {
                        target: FadeTarget::Drawings(snapshot),
                        wait: false,
                        duration: *duration,
                    }
                }
                ScriptNode::SetVariable { name, value } => {
                    EventCall::Update(WorldUpdate::SetVariable {
                        name: name.clone(),
                        value: value.clone(),
                    })
                }
                ScriptNode::SetVisible { name, visible } => {
                    EventCall::Update(WorldUpdate::SetVisible {
                        name: self.resolve_name(name, ctx),
                        visible: *visible,
                    })
                }
                ScriptNode::Label { .. } => continue,
                ScriptNode::Goto { label } => {
                    self.jump(label)?;
                    continue;
                }
                ScriptNode::JumpIf { var, label } => {
                    if ctx.var(var).is_some_and(VarValue::is_truthy) {
                        self.jump(label)?;
                    }
                    continue;
                }
                ScriptNode::Finish { completion } => {
                    return Ok(self.finish(completion.clone(), ctx.config));
                }
            };
            return Ok(Step::Yield(call));
        }
        Err(RuntimeError::invalid_state(format!(
            "脚本 '{}' 连续执行 {} 个节点仍未挂起",
            script.id, MAX_STEPS_WITHOUT_YIELD
        )))
    }
}

/// 上下遮幅
fn letterbox_drawings(config: &EngineConfig) -> Vec<DrawingOnScreen> {
    let width = config.screen.width;
    let height = config.screen.height * config.cutscene.cover_scaling;
    let color = config.cutscene.background_or(&config.screen);
    vec![
        Drawing::rectangle(color, Vec2::new(width, height)).at(Vec2::zero()),
        Drawing::rectangle(color, Vec2::new(width, height))
            .at(Vec2::new(0.0, config.screen.height - height)),
    ]
}

impl EventScript for ScriptRunner {
    fn name(&self) -> &str {
        &self.script.id
    }

    fn resume(
        &mut self,
        result: EventResult,
        ctx: &ScriptContext<'_>,
    ) -> Result<Step, RuntimeError> {
        if let Some(name) = self.pending_bind.take() {
            let sentinel = result.sentinel().ok_or_else(|| {
                RuntimeError::invalid_state(format!("绑定 '{name}' 需要淡入返回的哨兵"))
            })?;
            self.bindings.insert(name, sentinel);
        }
        if self.letterbox == Letterbox::Opening {
            let sentinel = result
                .sentinel()
                .ok_or_else(|| RuntimeError::invalid_state("遮幅淡入没有返回哨兵"))?;
            self.letterbox = Letterbox::Shown(sentinel);
        }

        if let Some(call) = self.queue.pop_front() {
            return Ok(Step::Yield(call));
        }
        if let Some(completion) = self.finishing.take() {
            return Ok(Step::Done(completion));
        }
        if self.letterbox == Letterbox::Pending {
            self.letterbox = Letterbox::Opening;
            return Ok(Step::Yield(EventCall::FadeIn {
                resource: letterbox_drawings(ctx.config).into(),
                wait: ctx.config.cutscene.wait,
                duration: Some(ctx.config.cutscene.duration_or(&ctx.config.animation)),
            }));
        }
        self.run_nodes(ctx)
    }
}
