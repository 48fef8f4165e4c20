//! # Event 模块
//!
//! 脚本事件的执行契约。
//!
//! ## 执行模型
//!
//! ```text
//! EventfulScene                    EventScript
//!   │                                  │
//!   │──── start() ───────────────────►│
//!   │◄─── Step::Yield(EventCall) ─────│  包装场景运行若干帧
//!   │                                  │
//!   │──── resume(EventResult) ───────►│
//!   │◄─── Step::Yield / Step::Done ───│
//! ```
//!
//! 脚本被实现为显式的状态机：每次 `resume` 返回下一个要展示的包装场景
//! （[`EventCall`]）或完成结果（[`EventCompletion`]）。包装场景结束后，
//! 它的结果（[`EventResult`]）在下一帧交还给脚本。
//!
//! 脚本可以用 Rust 闭包编写（[`StepScript`]），也可以由 JSON 描述
//! （[`Script`] + [`ScriptRunner`]）。

mod call;
mod script;

pub use call::{EventCall, FadeTarget, SayEvent, SceneFactory, WorldUpdate};
pub use script::{FadeOutNode, Script, ScriptNode, ScriptRunner};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::background::BackgroundEventSentinel;
use crate::config::EngineConfig;
use crate::error::RuntimeError;
use crate::scene::EventfulScene;
use crate::state::{GameState, VarValue};
use crate::world::{Character, Npc, Player};

/// 包装场景交还给脚本的结果
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventResult {
    /// 无结果
    #[default]
    None,
    /// 淡入等步骤注册的后台事件哨兵
    Sentinel(BackgroundEventSentinel),
    /// 普通值
    Value(VarValue),
}

impl EventResult {
    pub fn sentinel(&self) -> Option<BackgroundEventSentinel> {
        match self {
            EventResult::Sentinel(sentinel) => Some(*sentinel),
            _ => None,
        }
    }
}

/// 脚本的完成结果，决定触发它的 NPC 之后如何变化
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCompletion {
    /// NPC 保持可再次触发
    #[default]
    Nothing,
    /// NPC 的事件永久不再触发（`restart_event = false`）
    Dismiss,
    /// 替换 NPC 之后的事件
    Replace(crate::world::EventSpec),
    /// 携带数据结束，NPC 保持可再次触发
    Data(VarValue),
}

/// 脚本单步的产出
#[derive(Debug)]
pub enum Step {
    /// 挂起，交出一个包装场景
    Yield(EventCall),
    /// 结束
    Done(EventCompletion),
}

/// 脚本恢复时可读取的上下文
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    /// 当前区域场景（世界已推进到本帧）
    pub scene: &'a EventfulScene,
    /// 游戏状态
    pub state: &'a GameState,
    /// 触发事件的 NPC 名称
    pub npc: &'a str,
    /// 引擎配置
    pub config: &'a EngineConfig,
}

impl<'a> ScriptContext<'a> {
    pub fn player(&self) -> &'a Player {
        self.scene.player()
    }

    /// 触发事件的 NPC
    pub fn npc(&self) -> Result<&'a Npc, RuntimeError> {
        self.scene.npc(self.npc)
    }

    pub fn character(&self, name: &str) -> Result<&'a Character, RuntimeError> {
        self.scene.get_character(name)
    }

    pub fn var(&self, name: &str) -> Option<&'a VarValue> {
        self.state.get_var(name)
    }
}

/// 事件脚本
///
/// 第一次调用 `resume` 时 `result` 为 [`EventResult::None`]；
/// 之后每次传入上一个包装场景的结果。返回 [`Step::Done`] 后不会再被调用。
pub trait EventScript: fmt::Debug {
    /// 脚本名称（日志用）
    fn name(&self) -> &str;

    fn resume(
        &mut self,
        result: EventResult,
        ctx: &ScriptContext<'_>,
    ) -> Result<Step, RuntimeError>;
}

/// 协程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroutineStatus {
    /// 已创建，尚未启动
    Created,
    /// 已交出包装场景，等待恢复
    Suspended,
    /// 已结束（正常完成或出错）
    Finished,
}

/// 事件协程
///
/// 包装一个 [`EventScript`]，保证它按 `start` → `resume`* 的顺序被驱动，
/// 结束后不再被恢复。
#[derive(Debug)]
pub struct EventCoroutine {
    script: Box<dyn EventScript>,
    status: CoroutineStatus,
}

impl EventCoroutine {
    pub fn new(script: Box<dyn EventScript>) -> Self {
        Self {
            script,
            status: CoroutineStatus::Created,
        }
    }

    pub fn name(&self) -> &str {
        self.script.name()
    }

    pub fn status(&self) -> CoroutineStatus {
        self.status
    }

    /// 启动协程，执行到第一个挂起点
    pub fn start(&mut self, ctx: &ScriptContext<'_>) -> Result<Step, RuntimeError> {
        if self.status != CoroutineStatus::Created {
            return Err(RuntimeError::coroutine_misuse(format!(
                "脚本 '{}' 已经启动过",
                self.name()
            )));
        }
        self.step(EventResult::None, ctx)
    }

    /// 以上一步的结果恢复协程
    pub fn resume(
        &mut self,
        result: EventResult,
        ctx: &ScriptContext<'_>,
    ) -> Result<Step, RuntimeError> {
        match self.status {
            CoroutineStatus::Suspended => self.step(result, ctx),
            CoroutineStatus::Created => Err(RuntimeError::coroutine_misuse(format!(
                "脚本 '{}' 尚未启动",
                self.name()
            ))),
            CoroutineStatus::Finished => Err(RuntimeError::coroutine_misuse(format!(
                "脚本 '{}' 已经结束",
                self.name()
            ))),
        }
    }

    fn step(&mut self, result: EventResult, ctx: &ScriptContext<'_>) -> Result<Step, RuntimeError> {
        match self.script.resume(result, ctx) {
            Ok(step) => {
                self.status = match step {
                    Step::Yield(_) => CoroutineStatus::Suspended,
                    Step::Done(_) => CoroutineStatus::Finished,
                };
                Ok(step)
            }
            Err(e) => {
                self.status = CoroutineStatus::Finished;
                Err(e)
            }
        }
    }
}

/// 以闭包编写的脚本
///
/// 闭包收到当前步序号（从 0 开始）和上一步结果：
///
/// ```ignore
/// StepScript::new("guard", |step, result, ctx| match step {
///     0 => Ok(Step::Yield(EventCall::say(Some("guard"), "Halt!"))),
///     _ => Ok(Step::Done(EventCompletion::Dismiss)),
/// })
/// ```
pub struct StepScript<F> {
    name: String,
    step: usize,
    f: F,
}

impl<F> StepScript<F>
where
    F: FnMut(usize, EventResult, &ScriptContext<'_>) -> Result<Step, RuntimeError>,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            step: 0,
            f,
        }
    }
}

impl<F> fmt::Debug for StepScript<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepScript")
            .field("name", &self.name)
            .field("step", &self.step)
            .finish_non_exhaustive()
    }
}

impl<F> EventScript for StepScript<F>
where
    F: FnMut(usize, EventResult, &ScriptContext<'_>) -> Result<Step, RuntimeError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(
        &mut self,
        result: EventResult,
        ctx: &ScriptContext<'_>,
    ) -> Result<Step, RuntimeError> {
        let step = (self.f)(self.step, result, ctx)?;
        self.step += 1;
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::demo_scene;

    fn two_step_script() -> Box<dyn EventScript> {
        Box::new(StepScript::new("two_step", |step, _result, _ctx| match step {
            0 => Ok(Step::Yield(EventCall::Update(WorldUpdate::SetVariable {
                name: "x".to_string(),
                value: VarValue::Int(1),
            }))),
            _ => Ok(Step::Done(EventCompletion::Nothing)),
        }))
    }

    #[test]
    fn test_coroutine_lifecycle() {
        let scene = demo_scene();
        let state = GameState::new();
        let config = EngineConfig::default();
        let ctx = ScriptContext {
            scene: &scene,
            state: &state,
            npc: "guard",
            config: &config,
        };

        let mut coroutine = EventCoroutine::new(two_step_script());
        assert_eq!(coroutine.status(), CoroutineStatus::Created);
        assert!(matches!(
            coroutine.resume(EventResult::None, &ctx),
            Err(RuntimeError::CoroutineMisuse { .. })
        ));

        assert!(matches!(coroutine.start(&ctx), Ok(Step::Yield(_))));
        assert_eq!(coroutine.status(), CoroutineStatus::Suspended);
        assert!(matches!(
            coroutine.start(&ctx),
            Err(RuntimeError::CoroutineMisuse { .. })
        ));

        assert!(matches!(
            coroutine.resume(EventResult::None, &ctx),
            Ok(Step::Done(EventCompletion::Nothing))
        ));
        assert_eq!(coroutine.status(), CoroutineStatus::Finished);
        assert!(matches!(
            coroutine.resume(EventResult::None, &ctx),
            Err(RuntimeError::CoroutineMisuse { .. })
        ));
    }

    #[test]
    fn test_script_error_finishes_coroutine() {
        let scene = demo_scene();
        let state = GameState::new();
        let config = EngineConfig::default();
        let ctx = ScriptContext {
            scene: &scene,
            state: &state,
            npc: "guard",
            config: &config,
        };
        let failing = StepScript::new("failing", |_, _, ctx| {
            ctx.character("nobody")?;
            Ok(Step::Done(EventCompletion::Nothing))
        });
        let mut coroutine = EventCoroutine::new(Box::new(failing));
        assert!(matches!(
            coroutine.start(&ctx),
            Err(RuntimeError::CharacterNotFound { .. })
        ));
        assert_eq!(coroutine.status(), CoroutineStatus::Finished);
    }

    #[test]
    fn test_completion_json() {
        let completion: EventCompletion = serde_json::from_str(r#""dismiss""#).unwrap();
        assert_eq!(completion, EventCompletion::Dismiss);
        let completion: EventCompletion =
            serde_json::from_str(r#"{"replace":{"script":"guard_after","start_mode":"collide"}}"#)
                .unwrap();
        assert_eq!(
            completion,
            EventCompletion::Replace(crate::world::EventSpec::collide("guard_after"))
        );
    }
}
