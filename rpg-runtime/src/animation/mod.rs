//! # Animation 模块
//!
//! 动画代数：循环帧动画、有限时长的定时效果组以及打字机文本。
//!
//! ## 核心概念
//!
//! - [`CyclicAnimation`]：无限循环的帧序列，支持逐帧时长与单次 tick 跨多帧追帧
//! - [`TimedAnimationGroup`]：对一组资源施加淡入淡出/缩放/移动，
//!   支持 `compose`（叠加变换）与 `reverse`（时间反转）
//! - [`Typewriter`]：逐字显示文本
//! - [`EasingFunction`]：作用于定时效果进度的缓动函数
//!
//! 所有动画都是值类型，`tick` 消费旧值并返回新值。

mod cyclic;
mod easing;
mod timed;
mod typewriter;

pub use cyclic::{CyclicAnimation, FrameDurations};
pub use easing::EasingFunction;
pub use timed::{AnimationResource, TimedAnimationGroup, TimedEffect};
pub use typewriter::Typewriter;
