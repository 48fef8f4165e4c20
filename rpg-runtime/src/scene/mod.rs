//! # Scene 模块
//!
//! 场景与事件包装场景链。
//!
//! ## 结构
//!
//! ```text
//! Scene::Event(SayEventScene)
//!   └── parent: EventfulScene      （根：玩家、NPC、后台事件、协程）
//! ```
//!
//! 当前场景要么是根 [`EventfulScene`]，要么是拥有根的包装场景
//! （[`EventScene`]）。包装场景每帧先让根推进世界（不检测触发），
//! 再执行自身逻辑；结束时调用 [`EventfulScene::complete`] 把结果交还给根，
//! 根在下一帧以该结果恢复脚本协程。

mod eventful;
mod fade;
mod say;
mod update;

pub use eventful::EventfulScene;
pub use fade::{FadeInEventScene, FadeOutEventScene};
pub use say::{SayEventScene, SayState};
pub use update::UpdateFromEvent;

use std::fmt;

use crate::config::EngineConfig;
use crate::drawing::DrawingOnScreen;
use crate::error::RuntimeError;
use crate::input::InputEvent;
use crate::registry::ScriptRegistry;
use crate::state::GameState;
use crate::time::Millisecond;

/// 每帧 tick 的上下文
pub struct TickContext<'a> {
    pub registry: &'a ScriptRegistry,
    pub config: &'a EngineConfig,
    pub state: &'a mut GameState,
}

/// 事件包装场景
///
/// 包装场景独占其父场景（根 [`EventfulScene`]），没有反向指针。
pub trait EventScene: fmt::Debug {
    fn parent(&self) -> &EventfulScene;

    /// 丢弃包装，取回父场景
    fn into_parent(self: Box<Self>) -> EventfulScene;

    /// 推进一帧：返回自身（继续）或完成后的父场景
    fn tick(
        self: Box<Self>,
        delta: Millisecond,
        ctx: &mut TickContext<'_>,
    ) -> Result<Scene, RuntimeError>;

    fn handle_input(&mut self, _input: &InputEvent) {}

    /// 绘制在父场景之上的内容
    fn overlay(&self) -> Vec<DrawingOnScreen> {
        Vec::new()
    }

    fn drawing_on_screens(&self) -> Vec<DrawingOnScreen> {
        let mut drawings = self.parent().drawing_on_screens();
        drawings.extend(self.overlay());
        drawings
    }
}

/// 当前场景
#[derive(Debug)]
pub enum Scene {
    Eventful(EventfulScene),
    Event(Box<dyn EventScene>),
}

impl Scene {
    pub fn tick(
        self,
        delta: Millisecond,
        ctx: &mut TickContext<'_>,
    ) -> Result<Scene, RuntimeError> {
        match self {
            Scene::Eventful(scene) => scene.tick(delta, ctx),
            Scene::Event(scene) => scene.tick(delta, ctx),
        }
    }

    pub fn handle_input(&mut self, input: &InputEvent, config: &EngineConfig) {
        match self {
            Scene::Eventful(scene) => scene.handle_input(input, config),
            Scene::Event(scene) => scene.handle_input(input),
        }
    }

    /// 从后到前排序的绘制列表
    pub fn drawing_on_screens(&self) -> Vec<DrawingOnScreen> {
        match self {
            Scene::Eventful(scene) => scene.drawing_on_screens(),
            Scene::Event(scene) => scene.drawing_on_screens(),
        }
    }

    /// 根场景
    pub fn root(&self) -> &EventfulScene {
        match self {
            Scene::Eventful(scene) => scene,
            Scene::Event(scene) => scene.parent(),
        }
    }

    pub fn into_root(self) -> EventfulScene {
        match self {
            Scene::Eventful(scene) => scene,
            Scene::Event(scene) => scene.into_parent(),
        }
    }

    /// 是否有包装场景占据控制权
    pub fn is_wrapped(&self) -> bool {
        matches!(self, Scene::Event(_))
    }
}

impl From<EventfulScene> for Scene {
    fn from(scene: EventfulScene) -> Self {
        Scene::Eventful(scene)
    }
}
