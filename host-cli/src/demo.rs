//! 演示区域、内置脚本与预设输入

use rpg_runtime::{
    Character, CyclicAnimation, Direction, Drawing, EngineConfig, EventCall, EventCompletion,
    EventSpec, EventfulScene, FrameDurations, InputEvent, Npc, NpcSpec, Patrol, Player, Rect,
    ScriptRegistry, Step, StepScript, VarValue, Vec2,
};
use tracing::warn;

const SPRITE_SIZE: Vec2 = Vec2::new(16.0, 16.0);

/// 左上角位于 (x, y) 的单格区域
fn tile_at(x: f32, y: f32) -> Rect {
    Rect::new(x, y, SPRITE_SIZE.x, SPRITE_SIZE.y)
}

fn still(path: &str) -> CyclicAnimation {
    CyclicAnimation::still(Drawing::sprite(path, SPRITE_SIZE))
}

/// 两帧行走动画，构造失败时退化为静止图
fn walking(base: &str) -> CyclicAnimation {
    let frames = vec![
        Drawing::sprite(format!("{base}_0.png"), SPRITE_SIZE),
        Drawing::sprite(format!("{base}_1.png"), SPRITE_SIZE),
    ];
    CyclicAnimation::new(frames, FrameDurations::Uniform(200)).unwrap_or_else(|e| {
        warn!(error = %e, sprite = base, "行走动画无效");
        still(&format!("{base}_0.png"))
    })
}

/// 村庄：玩家、守门的卫兵（确认触发）、站在南边的长老（碰撞触发）和一个巡逻的村民
pub fn village(config: &EngineConfig) -> EventfulScene {
    let hero =
        Character::new("hero", tile_at(100.0, 100.0), walking("hero")).with_display_name("Hero");
    let player = Player::new(hero, config.world.player_speed);
    let guard = Npc::new(
        NpcSpec::new("guard")
            .with_display_name("Gate Guard")
            .with_event(EventSpec::confirm("guard_talk")),
        Character::new("guard", tile_at(140.0, 100.0), still("guard.png"))
            .with_facing(Direction::Left),
    );
    let elder = Npc::new(
        NpcSpec::new("elder")
            .with_display_name("Elder")
            .with_event(EventSpec::collide("elder_greeting")),
        Character::new("elder", tile_at(120.0, 160.0), still("elder.png")),
    );
    let villager = Npc::new(
        NpcSpec::new("villager"),
        Character::new("villager", tile_at(300.0, 300.0), walking("villager")),
    )
    .with_patrol(Patrol::new(
        vec![Vec2::new(400.0, 300.0), Vec2::new(300.0, 300.0)],
        30.0,
        1_000,
    ));

    let screen = Vec2::new(config.screen.width, config.screen.height);
    let ground = Drawing::rectangle([60, 120, 60, 255], screen).at(Vec2::zero());
    EventfulScene::new("village", player, vec![guard, elder, villager])
        .with_decorations(vec![ground])
}

/// 注册以 Rust 编写的内置脚本
pub fn register_builtin(registry: &mut ScriptRegistry) {
    registry.register_fn("elder_greeting", || {
        StepScript::new("elder_greeting", |step, _, ctx| match step {
            0 => Ok(Step::Yield(EventCall::say(Some(ctx.npc), "Welcome, traveller."))),
            1 => {
                let text = if ctx.var("met_guard").is_some_and(VarValue::is_truthy) {
                    "I see the guard let you through."
                } else {
                    "Mind the guard by the gate."
                };
                Ok(Step::Yield(EventCall::say(Some(ctx.npc), text)))
            }
            2 => {
                // 长老点亮的灯笼在事件结束后一直亮着
                let lantern =
                    Drawing::sprite("lantern.png", SPRITE_SIZE).at(Vec2::new(124.0, 140.0));
                Ok(Step::Yield(EventCall::FadeIn {
                    resource: lantern.into(),
                    wait: false,
                    duration: Some(500),
                }))
            }
            _ => Ok(Step::Done(EventCompletion::Dismiss)),
        })
    });
}

/// 预设输入：走到卫兵身边、对话，再走向长老；确认键每 40 帧按一次推进对话
pub fn inputs_at(frame: u64) -> Vec<InputEvent> {
    let mut inputs = match frame {
        10 => vec![InputEvent::press(Direction::Right)],
        25 => vec![InputEvent::release(Direction::Right)],
        400 => vec![InputEvent::press(Direction::Down)],
        430 => vec![InputEvent::release(Direction::Down)],
        _ => Vec::new(),
    };
    if frame >= 40 && frame % 40 == 0 {
        inputs.push(InputEvent::Confirm);
    }
    inputs
}
