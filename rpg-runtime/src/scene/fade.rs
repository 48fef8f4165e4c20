//! 淡入/淡出包装场景

use super::{EventScene, EventfulScene, Scene, TickContext};
use crate::animation::{EasingFunction, TimedAnimationGroup};
use crate::background::{BackgroundFadeIn, BackgroundFadeOut};
use crate::drawing::DrawingOnScreen;
use crate::error::RuntimeError;
use crate::event::{EventResult, FadeTarget};
use crate::time::Millisecond;

/// 淡入包装场景
///
/// 完成时把淡入结果注册为 [`BackgroundFadeIn`] 常驻显示，并以其哨兵作为结果；
/// `wait == false` 时第一帧即完成，淡入在后台继续。
#[derive(Debug)]
pub struct FadeInEventScene {
    parent: EventfulScene,
    fade: TimedAnimationGroup,
    wait: bool,
}

impl FadeInEventScene {
    pub fn new(parent: EventfulScene, fade: TimedAnimationGroup, wait: bool) -> Self {
        Self { parent, fade, wait }
    }
}

impl EventScene for FadeInEventScene {
    fn parent(&self) -> &EventfulScene {
        &self.parent
    }

    fn into_parent(self: Box<Self>) -> EventfulScene {
        self.parent
    }

    fn tick(
        self: Box<Self>,
        delta: Millisecond,
        ctx: &mut TickContext<'_>,
    ) -> Result<Scene, RuntimeError> {
        let this = *self;
        let mut parent = this.parent.tick_without_event(delta, ctx.config, ctx.state);
        let fade = this.fade.tick(delta);
        if this.wait && !fade.is_complete() {
            return Ok(Scene::Event(Box::new(Self {
                parent,
                fade,
                wait: this.wait,
            })));
        }
        let sentinel = parent.allocate_sentinel();
        let background = Box::new(BackgroundFadeIn::new(sentinel, fade));
        let parent = parent.complete(EventResult::Sentinel(sentinel), Some(background))?;
        Ok(Scene::Eventful(parent))
    }

    fn overlay(&self) -> Vec<DrawingOnScreen> {
        self.fade.drawing_on_screens()
    }
}

/// 淡出包装场景
///
/// 目标为哨兵时，对应的后台事件立即被移除，其当前画面作为淡出内容。
/// `wait == false` 时第一帧即把淡出注册为 [`BackgroundFadeOut`] 并完成。
#[derive(Debug)]
pub struct FadeOutEventScene {
    parent: EventfulScene,
    fade: TimedAnimationGroup,
    wait: bool,
}

impl FadeOutEventScene {
    pub fn new(
        mut parent: EventfulScene,
        target: FadeTarget,
        wait: bool,
        duration: Millisecond,
        easing: EasingFunction,
    ) -> Result<Self, RuntimeError> {
        let drawings = match target {
            FadeTarget::Sentinel(sentinel) => parent
                .remove_background_event(sentinel)
                .ok_or(RuntimeError::BackgroundEventNotFound { sentinel })?
                .drawing_on_screens(),
            FadeTarget::Drawings(drawings) => drawings,
        };
        Ok(Self {
            parent,
            fade: TimedAnimationGroup::fade_out(drawings, duration).with_easing(easing),
            wait,
        })
    }
}

impl EventScene for FadeOutEventScene {
    fn parent(&self) -> &EventfulScene {
        &self.parent
    }

    fn into_parent(self: Box<Self>) -> EventfulScene {
        self.parent
    }

    fn tick(
        self: Box<Self>,
        delta: Millisecond,
        ctx: &mut TickContext<'_>,
    ) -> Result<Scene, RuntimeError> {
        let this = *self;
        let mut parent = this.parent.tick_without_event(delta, ctx.config, ctx.state);
        let fade = this.fade.tick(delta);
        if !this.wait {
            let sentinel = parent.allocate_sentinel();
            let background = Box::new(BackgroundFadeOut::new(sentinel, fade));
            let parent = parent.complete(EventResult::None, Some(background))?;
            return Ok(Scene::Eventful(parent));
        }
        if fade.is_complete() {
            return Ok(Scene::Eventful(parent.complete(EventResult::None, None)?));
        }
        Ok(Scene::Event(Box::new(Self {
            parent,
            fade,
            wait: this.wait,
        })))
    }

    fn overlay(&self) -> Vec<DrawingOnScreen> {
        self.fade.drawing_on_screens()
    }
}
