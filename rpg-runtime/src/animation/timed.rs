//! # Timed 模块
//!
//! 有限时长的变换效果组（淡入淡出、缩放、移动）。
//!
//! ## 组合
//!
//! - `compose`：以自身为唯一资源构造新效果，时长与计时器共享，用于叠加变换
//! - `concur`：追加一个并行资源
//! - `reverse`：计时器时间反转，嵌套的定时资源递归反转；
//!   由"进场"效果自动得到视觉上严格对称的"退场"效果

use serde::{Deserialize, Serialize};

use super::{CyclicAnimation, EasingFunction, Typewriter};
use crate::drawing::{DrawingOnScreen, Vec2};
use crate::time::{Millisecond, Timer};

/// 定时效果的种类
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimedEffect {
    /// 透明度 0 -> target
    FadeIn { target: f32 },
    /// 透明度 target -> 0
    FadeOut { target: f32 },
    /// 缩放 1 -> scale
    ScaleTo { scale: f32 },
    /// 缩放 scale -> 1
    ScaleFrom { scale: f32 },
    /// 从原位置移出 offset
    MoveFrom { offset: Vec2 },
    /// 从 -offset 处移回原位置
    MoveTo { offset: Vec2 },
}

impl TimedEffect {
    pub fn fade_in() -> Self {
        Self::FadeIn { target: 1.0 }
    }

    pub fn fade_out() -> Self {
        Self::FadeOut { target: 1.0 }
    }

    /// 按计时器进度变换一个绘制对象
    fn apply(
        &self,
        drawing: DrawingOnScreen,
        timer: &Timer,
        easing: EasingFunction,
    ) -> DrawingOnScreen {
        let completed = easing.apply(timer.completed_percentage());
        let remaining = easing.apply(timer.remaining_percentage());
        match *self {
            TimedEffect::FadeIn { target } => drawing.fade(completed * target),
            TimedEffect::FadeOut { target } => drawing.fade(remaining * target),
            TimedEffect::ScaleTo { scale } => drawing.scale(1.0 + (scale - 1.0) * completed),
            TimedEffect::ScaleFrom { scale } => drawing.scale(scale + (1.0 - scale) * completed),
            TimedEffect::MoveFrom { offset } => drawing.shift(offset.scaled(completed)),
            TimedEffect::MoveTo { offset } => drawing.shift(offset.scaled(-remaining)),
        }
    }
}

/// 定时效果组中的资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationResource {
    /// 静态绘制对象
    Drawings(Vec<DrawingOnScreen>),
    /// 循环动画（放置在 `top_left`）
    Cyclic {
        animation: CyclicAnimation,
        top_left: Vec2,
    },
    /// 打字机文本
    Typewriter(Typewriter),
    /// 嵌套的定时效果
    Timed(Box<TimedAnimationGroup>),
}

impl AnimationResource {
    #[must_use]
    fn tick(self, delta: Millisecond) -> Self {
        match self {
            AnimationResource::Drawings(_) => self,
            AnimationResource::Cyclic {
                animation,
                top_left,
            } => AnimationResource::Cyclic {
                animation: animation.tick(delta),
                top_left,
            },
            AnimationResource::Typewriter(typewriter) => {
                AnimationResource::Typewriter(typewriter.tick(delta))
            }
            AnimationResource::Timed(group) => {
                AnimationResource::Timed(Box::new(group.tick(delta)))
            }
        }
    }

    /// 是否已完成
    ///
    /// 循环动画自身永不完成，但不阻止所在效果组完成，否则淡出一个行走中的角色永远不会结束。
    fn is_complete(&self) -> bool {
        match self {
            AnimationResource::Drawings(_) | AnimationResource::Cyclic { .. } => true,
            AnimationResource::Typewriter(typewriter) => typewriter.is_complete(),
            AnimationResource::Timed(group) => group.is_complete(),
        }
    }

    #[must_use]
    fn reverse(self) -> Self {
        match self {
            AnimationResource::Timed(group) => AnimationResource::Timed(Box::new(group.reverse())),
            other => other,
        }
    }

    fn drawing_on_screens(&self) -> Vec<DrawingOnScreen> {
        match self {
            AnimationResource::Drawings(drawings) => drawings.clone(),
            AnimationResource::Cyclic {
                animation,
                top_left,
            } => vec![animation.drawing().clone().at(*top_left)],
            AnimationResource::Typewriter(typewriter) => vec![typewriter.drawing_on_screen()],
            AnimationResource::Timed(group) => group.drawing_on_screens(),
        }
    }
}

impl From<Vec<DrawingOnScreen>> for AnimationResource {
    fn from(drawings: Vec<DrawingOnScreen>) -> Self {
        Self::Drawings(drawings)
    }
}

impl From<DrawingOnScreen> for AnimationResource {
    fn from(drawing: DrawingOnScreen) -> Self {
        Self::Drawings(vec![drawing])
    }
}

impl From<TimedAnimationGroup> for AnimationResource {
    fn from(group: TimedAnimationGroup) -> Self {
        Self::Timed(Box::new(group))
    }
}

impl From<Typewriter> for AnimationResource {
    fn from(typewriter: Typewriter) -> Self {
        Self::Typewriter(typewriter)
    }
}

/// 定时效果组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedAnimationGroup {
    resources: Vec<AnimationResource>,
    effect: TimedEffect,
    timer: Timer,
    #[serde(default)]
    easing: EasingFunction,
}

impl TimedAnimationGroup {
    pub fn new(
        resource: impl Into<AnimationResource>,
        effect: TimedEffect,
        duration: Millisecond,
    ) -> Self {
        Self {
            resources: vec![resource.into()],
            effect,
            timer: Timer::new(duration),
            easing: EasingFunction::default(),
        }
    }

    pub fn fade_in(resource: impl Into<AnimationResource>, duration: Millisecond) -> Self {
        Self::new(resource, TimedEffect::fade_in(), duration)
    }

    pub fn fade_out(resource: impl Into<AnimationResource>, duration: Millisecond) -> Self {
        Self::new(resource, TimedEffect::fade_out(), duration)
    }

    /// 设置缓动函数
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    pub fn effect(&self) -> TimedEffect {
        self.effect
    }

    pub fn timer(&self) -> Timer {
        self.timer
    }

    pub fn duration(&self) -> Millisecond {
        self.timer.duration()
    }

    /// 在自身之上叠加另一种变换，时长与进度共享
    #[must_use]
    pub fn compose(self, effect: TimedEffect) -> Self {
        let timer = self.timer;
        let easing = self.easing;
        Self {
            resources: vec![AnimationResource::Timed(Box::new(self))],
            effect,
            timer,
            easing,
        }
    }

    /// 追加一个并行资源
    #[must_use]
    pub fn concur(mut self, resource: impl Into<AnimationResource>) -> Self {
        self.resources.push(resource.into());
        self
    }

    /// 时间反转
    #[must_use]
    pub fn reverse(self) -> Self {
        Self {
            resources: self
                .resources
                .into_iter()
                .map(AnimationResource::reverse)
                .collect(),
            effect: self.effect,
            timer: self.timer.reversed(),
            easing: self.easing,
        }
    }

    /// 所有资源均已完成且计时器完成
    pub fn is_complete(&self) -> bool {
        self.timer.is_complete() && self.resources.iter().all(AnimationResource::is_complete)
    }

    /// 推进时间（完成后不再变化）
    #[must_use]
    pub fn tick(self, delta: Millisecond) -> Self {
        if self.is_complete() {
            return self;
        }
        Self {
            resources: self.resources.into_iter().map(|r| r.tick(delta)).collect(),
            timer: self.timer.tick(delta),
            ..self
        }
    }

    /// 当前时刻的绘制结果
    pub fn drawing_on_screens(&self) -> Vec<DrawingOnScreen> {
        self.resources
            .iter()
            .flat_map(AnimationResource::drawing_on_screens)
            .map(|d| self.effect.apply(d, &self.timer, self.easing))
            .collect()
    }
}
