//! 对话包装场景
//!
//! 三个阶段：对话框淡入 → 打字机显示文本（`wait` 时显示完毕后等待确认）→ 对话框连同文本淡出。

use super::{EventScene, EventfulScene, Scene, TickContext};
use crate::animation::{EasingFunction, TimedAnimationGroup, Typewriter};
use crate::config::EngineConfig;
use crate::drawing::{Drawing, DrawingOnScreen, Vec2};
use crate::error::RuntimeError;
use crate::event::{EventResult, SayEvent};
use crate::input::InputEvent;
use crate::time::Millisecond;

/// 对外可见的对话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SayState {
    FadeIn,
    Typing,
    /// 文本已全部显示，等待确认
    StandBy,
    FadeOut,
}

#[derive(Debug)]
enum Phase {
    FadeIn {
        background: TimedAnimationGroup,
        text: Typewriter,
    },
    Typing {
        background: Vec<DrawingOnScreen>,
        text: Typewriter,
    },
    FadeOut {
        fade: TimedAnimationGroup,
    },
}

/// 本地推进的结果
#[derive(Debug)]
enum Advance {
    Running(SayEventScene),
    /// 淡出完成，交还父场景
    Finished(EventfulScene),
}

/// 对话包装场景
#[derive(Debug)]
pub struct SayEventScene {
    parent: EventfulScene,
    phase: Phase,
    wait: bool,
    fade_duration: Millisecond,
    easing: EasingFunction,
    /// 自上次 tick 以来收到过确认键
    confirmed: bool,
}

impl SayEventScene {
    pub fn new(parent: EventfulScene, say: SayEvent, config: &EngineConfig) -> Self {
        let style = &config.say_event;
        let screen = &config.screen;
        let box_size = Vec2::new(screen.width - 2.0 * style.padding, style.box_height);
        let box_top_left = Vec2::new(
            style.padding,
            screen.height - style.box_height - style.padding,
        );
        let mut background = vec![Drawing::rectangle(style.color, box_size).at(box_top_left)];

        let mut text_top_left = box_top_left + Vec2::new(style.padding, style.padding);
        if let Some(speaker) = &say.speaker {
            // 角色名解析为显示名称，否则原样显示
            let label = parent
                .get_character(speaker)
                .map(|c| c.display_name.clone())
                .unwrap_or_else(|_| speaker.clone());
            let size = Vec2::new(
                label.chars().count() as f32 * style.glyph_width,
                style.glyph_width,
            );
            background.push(Drawing::text(label, size).at(text_top_left));
            text_top_left = text_top_left + Vec2::new(0.0, style.glyph_width + style.padding);
        }

        let text_size = Vec2::new(
            box_size.x - 2.0 * style.padding,
            box_top_left.y + box_size.y - style.padding - text_top_left.y,
        );
        let text = Typewriter::new(
            Drawing::text(say.text, text_size).at(text_top_left),
            say.typing_delay.unwrap_or(style.text_delay),
        );
        let background = TimedAnimationGroup::fade_in(background, style.fade_duration)
            .with_easing(config.animation.easing);

        Self {
            parent,
            phase: Phase::FadeIn { background, text },
            wait: say.wait,
            fade_duration: style.fade_duration,
            easing: config.animation.easing,
            confirmed: false,
        }
    }

    pub fn state(&self) -> SayState {
        match &self.phase {
            Phase::FadeIn { .. } => SayState::FadeIn,
            Phase::Typing { text, .. } if text.is_complete() && self.wait => SayState::StandBy,
            Phase::Typing { .. } => SayState::Typing,
            Phase::FadeOut { .. } => SayState::FadeOut,
        }
    }

    /// 推进对话阶段（不推进世界）
    fn advance(mut self, delta: Millisecond) -> Advance {
        let confirmed = std::mem::take(&mut self.confirmed);
        self.phase = match self.phase {
            Phase::FadeIn { background, text } => {
                let background = background.tick(delta);
                if background.is_complete() {
                    Phase::Typing {
                        background: background.drawing_on_screens(),
                        text,
                    }
                } else {
                    Phase::FadeIn { background, text }
                }
            }
            Phase::Typing { background, text } => {
                if confirmed && text.is_complete() {
                    fade_out(background, &text, self.fade_duration, self.easing)
                } else {
                    // 确认键跳过打字
                    let text = if confirmed {
                        text.reveal_all()
                    } else {
                        text.tick(delta)
                    };
                    if !self.wait && text.is_complete() {
                        fade_out(background, &text, self.fade_duration, self.easing)
                    } else {
                        Phase::Typing { background, text }
                    }
                }
            }
            Phase::FadeOut { fade } => {
                let fade = fade.tick(delta);
                if fade.is_complete() {
                    return Advance::Finished(self.parent);
                }
                Phase::FadeOut { fade }
            }
        };
        Advance::Running(self)
    }
}

/// 对话框连同完整文本一起淡出
fn fade_out(
    background: Vec<DrawingOnScreen>,
    text: &Typewriter,
    duration: Millisecond,
    easing: EasingFunction,
) -> Phase {
    let mut drawings = background;
    drawings.push(text.full_text().clone());
    Phase::FadeOut {
        fade: TimedAnimationGroup::fade_out(drawings, duration).with_easing(easing),
    }
}

impl EventScene for SayEventScene {
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
        let mut this = *self;
        this.parent = this.parent.tick_without_event(delta, ctx.config, ctx.state);
        match this.advance(delta) {
            Advance::Running(scene) => Ok(Scene::Event(Box::new(scene))),
            Advance::Finished(parent) => {
                Ok(Scene::Eventful(parent.complete(EventResult::None, None)?))
            }
        }
    }

    fn handle_input(&mut self, input: &InputEvent) {
        if input.is_confirm() {
            self.confirmed = true;
        }
    }

    fn overlay(&self) -> Vec<DrawingOnScreen> {
        match &self.phase {
            Phase::FadeIn { background, .. } => background.drawing_on_screens(),
            Phase::Typing { background, text } => {
                let mut drawings = background.clone();
                drawings.push(text.drawing_on_screen());
                drawings
            }
            Phase::FadeOut { fade } => fade.drawing_on_screens(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::demo_scene;

    fn say_scene(text: &str, wait: bool) -> SayEventScene {
        let config = EngineConfig::default();
        SayEventScene::new(
            demo_scene(),
            SayEvent::new(Some("guard"), text).with_wait(wait),
            &config,
        )
    }

    fn running(advance: Advance) -> SayEventScene {
        match advance {
            Advance::Running(scene) => scene,
            Advance::Finished(_) => panic!("say scene finished early"),
        }
    }

    fn texts(scene: &SayEventScene) -> Vec<String> {
        scene
            .overlay()
            .iter()
            .filter_map(|d| d.text().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_speaker_uses_display_name() {
        let scene = say_scene("Hi", true);
        assert_eq!(texts(&scene), vec!["Guard".to_string()]);
        assert_eq!(scene.state(), SayState::FadeIn);

        let stranger = SayEventScene::new(
            demo_scene(),
            SayEvent::new(Some("???"), "Hi"),
            &EngineConfig::default(),
        );
        assert_eq!(texts(&stranger), vec!["???".to_string()]);
    }

    #[test]
    fn test_waits_for_confirm_before_fade_out() {
        let fade = EngineConfig::default().say_event.fade_duration;
        let scene = running(say_scene("Hi", true).advance(fade));
        assert_eq!(scene.state(), SayState::Typing);
        assert_eq!(texts(&scene), vec!["Guard".to_string(), "H".to_string()]);

        let scene = running(scene.advance(1_000));
        assert_eq!(scene.state(), SayState::StandBy);
        assert_eq!(texts(&scene)[1], "Hi");
        let mut scene = running(scene.advance(10_000));
        assert_eq!(scene.state(), SayState::StandBy);

        scene.handle_input(&InputEvent::Confirm);
        let scene = running(scene.advance(0));
        assert_eq!(scene.state(), SayState::FadeOut);
        assert!((scene.overlay()[0].alpha() - 1.0).abs() < 1e-5);

        let scene = running(scene.advance(fade / 2));
        assert!(scene.overlay().iter().all(|d| d.alpha() < 1.0));
        assert!(matches!(scene.advance(fade), Advance::Finished(_)));
    }

    #[test]
    fn test_confirm_while_typing_reveals_all() {
        let fade = EngineConfig::default().say_event.fade_duration;
        let mut scene = running(say_scene("A long line of text", true).advance(fade));
        scene.handle_input(&InputEvent::Confirm);
        let scene = running(scene.advance(0));
        assert_eq!(scene.state(), SayState::StandBy);
        assert_eq!(texts(&scene)[1], "A long line of text");
    }

    #[test]
    fn test_no_wait_fades_out_after_typing() {
        let fade = EngineConfig::default().say_event.fade_duration;
        let scene = running(say_scene("Hi", false).advance(fade));
        let scene = running(scene.advance(1_000));
        assert_eq!(scene.state(), SayState::FadeOut);
    }

    #[test]
    fn test_fade_out_uses_configured_easing() {
        let mut config = EngineConfig::default();
        config.animation.easing = EasingFunction::EaseInQuad;
        let fade = config.say_event.fade_duration;
        let say = SayEvent::new(Some("guard"), "Hi").with_wait(false);
        let scene = SayEventScene::new(demo_scene(), say, &config);

        let scene = running(scene.advance(fade));
        let scene = running(scene.advance(1_000));
        assert_eq!(scene.state(), SayState::FadeOut);
        let scene = running(scene.advance(fade / 4));

        let box_drawing = Drawing::rectangle([0, 0, 0, 255], Vec2::new(1.0, 1.0)).at(Vec2::zero());
        let expected = TimedAnimationGroup::fade_out(box_drawing, fade)
            .with_easing(EasingFunction::EaseInQuad)
            .tick(fade / 4)
            .drawing_on_screens()[0]
            .alpha();
        assert!((scene.overlay()[0].alpha() - expected).abs() < 1e-5);
    }
}
