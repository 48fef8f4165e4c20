//! 脚本单步交出的包装场景描述

use std::fmt;

use crate::animation::{AnimationResource, TimedAnimationGroup};
use crate::background::BackgroundEventSentinel;
use crate::config::EngineConfig;
use crate::drawing::DrawingOnScreen;
use crate::error::RuntimeError;
use crate::scene::{
    EventScene, EventfulScene, FadeInEventScene, FadeOutEventScene, SayEventScene, Scene,
    UpdateFromEvent,
};
use crate::state::VarValue;
use crate::time::Millisecond;
use crate::world::{Npc, Player};

/// 自定义包装场景的构造函数
pub type SceneFactory =
    Box<dyn FnOnce(EventfulScene, &EngineConfig) -> Result<Box<dyn EventScene>, RuntimeError>>;

/// 对话
#[derive(Debug, Clone, PartialEq)]
pub struct SayEvent {
    /// 说话者：角色唯一名称（显示其显示名称）或任意文本，None 不显示名称
    pub speaker: Option<String>,
    pub text: String,
    /// 为 true 时文本显示完毕后等待确认键
    pub wait: bool,
    /// 打字机每字间隔（None 使用配置）
    pub typing_delay: Option<Millisecond>,
}

impl SayEvent {
    pub fn new(speaker: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.map(str::to_string),
            text: text.into(),
            wait: true,
            typing_delay: None,
        }
    }

    /// 设置是否等待确认
    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    /// 设置打字机间隔
    pub fn with_typing_delay(mut self, delay: Millisecond) -> Self {
        self.typing_delay = Some(delay);
        self
    }
}

/// 淡出目标
#[derive(Debug, Clone, PartialEq)]
pub enum FadeTarget {
    /// 之前淡入注册的后台事件（淡出时将其移除）
    Sentinel(BackgroundEventSentinel),
    /// 任意绘制对象
    Drawings(Vec<DrawingOnScreen>),
}

/// 对世界的直接修改
#[derive(Debug, Clone, PartialEq)]
pub enum WorldUpdate {
    /// 替换玩家（保留事件冻结状态）
    Player(Player),
    /// 替换同名 NPC（保留事件冻结状态）
    Npc(Npc),
    /// 设置脚本变量
    SetVariable { name: String, value: VarValue },
    /// 显示/隐藏角色
    SetVisible { name: String, visible: bool },
}

/// 脚本单步交出的调用
pub enum EventCall {
    Say(SayEvent),
    FadeIn {
        resource: AnimationResource,
        wait: bool,
        duration: Option<Millisecond>,
    },
    FadeOut {
        target: FadeTarget,
        wait: bool,
        duration: Option<Millisecond>,
    },
    Update(WorldUpdate),
    /// 由调用方提供的包装场景
    Custom(SceneFactory),
}

impl fmt::Debug for EventCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCall::Say(say) => f.debug_tuple("Say").field(say).finish(),
            EventCall::FadeIn {
                resource,
                wait,
                duration,
            } => f
                .debug_struct("FadeIn")
                .field("resource", resource)
                .field("wait", wait)
                .field("duration", duration)
                .finish(),
            EventCall::FadeOut {
                target,
                wait,
                duration,
            } => f
                .debug_struct("FadeOut")
                .field("target", target)
                .field("wait", wait)
                .field("duration", duration)
                .finish(),
            EventCall::Update(update) => f.debug_tuple("Update").field(update).finish(),
            EventCall::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl EventCall {
    pub fn say(speaker: Option<&str>, text: impl Into<String>) -> Self {
        Self::Say(SayEvent::new(speaker, text))
    }

    /// 等待完成的淡入
    pub fn fade_in(resource: impl Into<AnimationResource>) -> Self {
        Self::FadeIn {
            resource: resource.into(),
            wait: true,
            duration: None,
        }
    }

    /// 等待完成的淡出
    pub fn fade_out(target: FadeTarget) -> Self {
        Self::FadeOut {
            target,
            wait: true,
            duration: None,
        }
    }

    pub fn update(update: WorldUpdate) -> Self {
        Self::Update(update)
    }

    /// 在 `parent` 之上构造包装场景
    pub fn into_scene(
        self,
        parent: EventfulScene,
        config: &EngineConfig,
    ) -> Result<Scene, RuntimeError> {
        let timed = |duration: Option<Millisecond>| {
            (
                duration.unwrap_or(config.animation.default_duration),
                config.animation.easing,
            )
        };
        let scene: Box<dyn EventScene> = match self {
            EventCall::Say(say) => Box::new(SayEventScene::new(parent, say, config)),
            EventCall::FadeIn {
                resource,
                wait,
                duration,
            } => {
                let (duration, easing) = timed(duration);
                let fade = TimedAnimationGroup::fade_in(resource, duration).with_easing(easing);
                Box::new(FadeInEventScene::new(parent, fade, wait))
            }
            EventCall::FadeOut {
                target,
                wait,
                duration,
            } => {
                let (duration, easing) = timed(duration);
                Box::new(FadeOutEventScene::new(parent, target, wait, duration, easing)?)
            }
            EventCall::Update(update) => Box::new(UpdateFromEvent::new(parent, update)),
            EventCall::Custom(factory) => factory(parent, config)?,
        };
        Ok(Scene::Event(scene))
    }
}
