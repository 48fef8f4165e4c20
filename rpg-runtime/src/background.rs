//! # Background 模块
//!
//! 后台事件：脚本不等待完成的效果（fire-and-forget），由 [`EventfulScene`]
//! 在每帧世界推进时独立 tick，完成即移除。
//!
//! 后台事件以哨兵（sentinel）标识。哨兵由所属场景分配、全局唯一，
//! 脚本在后续步骤中凭哨兵查找或撤销之前启动的效果，无需跨挂起点持有引用。
//!
//! [`EventfulScene`]: crate::scene::EventfulScene

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::animation::TimedAnimationGroup;
use crate::drawing::DrawingOnScreen;
use crate::state::GameState;
use crate::time::Millisecond;

/// 后台事件哨兵
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackgroundEventSentinel(u64);

impl BackgroundEventSentinel {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BackgroundEventSentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 后台事件
pub trait BackgroundEvent: fmt::Debug {
    fn sentinel(&self) -> BackgroundEventSentinel;

    /// 推进时间
    fn tick(self: Box<Self>, delta: Millisecond, state: &mut GameState) -> Box<dyn BackgroundEvent>;

    fn is_complete(&self) -> bool;

    fn drawing_on_screens(&self) -> Vec<DrawingOnScreen>;
}

/// 后台淡入
///
/// 淡入结束后继续保持显示，永不自行完成，直到被脚本凭哨兵淡出。
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundFadeIn {
    sentinel: BackgroundEventSentinel,
    fade: TimedAnimationGroup,
}

impl BackgroundFadeIn {
    pub fn new(sentinel: BackgroundEventSentinel, fade: TimedAnimationGroup) -> Self {
        Self { sentinel, fade }
    }
}

impl BackgroundEvent for BackgroundFadeIn {
    fn sentinel(&self) -> BackgroundEventSentinel {
        self.sentinel
    }

    fn tick(
        self: Box<Self>,
        delta: Millisecond,
        _state: &mut GameState,
    ) -> Box<dyn BackgroundEvent> {
        let this = *self;
        Box::new(Self {
            fade: this.fade.tick(delta),
            ..this
        })
    }

    fn is_complete(&self) -> bool {
        false
    }

    fn drawing_on_screens(&self) -> Vec<DrawingOnScreen> {
        self.fade.drawing_on_screens()
    }
}

/// 后台淡出，淡出完成时移除
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundFadeOut {
    sentinel: BackgroundEventSentinel,
    fade: TimedAnimationGroup,
}

impl BackgroundFadeOut {
    pub fn new(sentinel: BackgroundEventSentinel, fade: TimedAnimationGroup) -> Self {
        Self { sentinel, fade }
    }
}

impl BackgroundEvent for BackgroundFadeOut {
    fn sentinel(&self) -> BackgroundEventSentinel {
        self.sentinel
    }

    fn tick(
        self: Box<Self>,
        delta: Millisecond,
        _state: &mut GameState,
    ) -> Box<dyn BackgroundEvent> {
        let this = *self;
        Box::new(Self {
            fade: this.fade.tick(delta),
            ..this
        })
    }

    fn is_complete(&self) -> bool {
        self.fade.is_complete()
    }

    fn drawing_on_screens(&self) -> Vec<DrawingOnScreen> {
        self.fade.drawing_on_screens()
    }
}
