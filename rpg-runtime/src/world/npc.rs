//! # NPC 模块
//!
//! NPC 数据、事件规格与巡逻移动。

use serde::{Deserialize, Serialize};

use super::Character;
use crate::drawing::{DrawingOnScreen, Rect, Vec2};
use crate::time::{Millisecond, Timer};

/// NPC 事件的触发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcEventStartMode {
    /// 玩家与 NPC 接触并按下确认键
    #[default]
    Confirm,
    /// 玩家进入 NPC 的触发区域
    Collide,
}

/// NPC 事件规格
///
/// `script` 是 [`crate::registry::ScriptRegistry`] 中的脚本名，启动时才解析。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpec {
    pub script: String,
    #[serde(default)]
    pub start_mode: NpcEventStartMode,
}

impl EventSpec {
    pub fn confirm(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            start_mode: NpcEventStartMode::Confirm,
        }
    }

    pub fn collide(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            start_mode: NpcEventStartMode::Collide,
        }
    }
}

/// NPC 规格
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcSpec {
    pub unique_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub event: Option<EventSpec>,
}

impl NpcSpec {
    pub fn new(unique_name: impl Into<String>) -> Self {
        Self {
            unique_name: unique_name.into(),
            display_name: None,
            event: None,
        }
    }

    /// 设置事件
    pub fn with_event(mut self, event: EventSpec) -> Self {
        self.event = Some(event);
        self
    }

    /// 设置显示名称
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// 巡逻路线
///
/// 依次走向每个路点，到达后停留 `pause` 毫秒，循环往复。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patrol {
    pub waypoints: Vec<Vec2>,
    /// 移动速度（像素/秒）
    pub speed: f32,
    next: usize,
    pause: Timer,
}

impl Patrol {
    pub fn new(waypoints: Vec<Vec2>, speed: f32, pause: Millisecond) -> Self {
        Self {
            waypoints,
            speed,
            next: 0,
            // 首次出发不需要停留
            pause: Timer::new(pause).tick(pause),
        }
    }

    pub fn next_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.next).copied()
    }

    /// 从 `from` 出发推进 `delta`，返回新的左上角坐标
    ///
    /// 单次最多走到当前路点为止，剩余时间丢弃。
    fn step(&mut self, from: Vec2, delta: Millisecond) -> Vec2 {
        let Some(target) = self.next_waypoint() else {
            return from;
        };
        if delta == 0 {
            return from;
        }
        if !self.pause.is_complete() {
            self.pause = self.pause.tick(delta);
            return from;
        }
        let to_target = target - from;
        let remaining = (to_target.x * to_target.x + to_target.y * to_target.y).sqrt();
        let distance = self.speed * delta as f32 / 1000.0;
        if distance >= remaining {
            self.next = (self.next + 1) % self.waypoints.len();
            self.pause = self.pause.reset();
            target
        } else {
            from + to_target.scaled(distance / remaining)
        }
    }
}

/// NPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub character: Character,
    pub spec: NpcSpec,
    /// 为 false 时该 NPC 的事件不再触发
    pub restart_event: bool,
    #[serde(default)]
    pub patrol: Option<Patrol>,
}

impl Npc {
    pub fn new(spec: NpcSpec, character: Character) -> Self {
        let character = match &spec.display_name {
            Some(name) => character.with_display_name(name.clone()),
            None => character,
        };
        Self {
            character,
            spec,
            restart_event: true,
            patrol: None,
        }
    }

    /// 设置巡逻路线
    pub fn with_patrol(mut self, patrol: Patrol) -> Self {
        self.patrol = Some(patrol);
        self
    }

    pub fn name(&self) -> &str {
        &self.spec.unique_name
    }

    pub fn rect(&self) -> Rect {
        self.character.rect
    }

    /// 玩家是否处在该 NPC 的事件触发区域内
    ///
    /// 没有事件或不可见的 NPC 永远返回 false。
    pub fn collides_trigger(&self, player: &Rect, padding: f32) -> bool {
        self.spec.event.is_some()
            && self.character.visible
            && self.character.rect.inflate(padding).collide(player)
    }

    /// 巡逻并推进动画；事件期间冻结，目标位置与障碍重叠时原地不动
    #[must_use]
    pub(crate) fn tick(self, delta: Millisecond, obstacles: &[Rect]) -> Self {
        let mut character = self.character;
        let mut patrol = self.patrol;
        let mut moving = false;
        if let (false, Some(route)) = (character.in_event, patrol.as_mut()) {
            let mut attempt = route.clone();
            let top_left = attempt.step(character.rect.top_left, delta);
            let target = Rect {
                top_left,
                size: character.rect.size,
            };
            if !obstacles.iter().any(|o| o.collide(&target)) {
                moving = top_left != character.rect.top_left;
                if moving {
                    character.facing =
                        super::Direction::toward(character.rect.top_left, top_left);
                }
                character.rect = target;
                *route = attempt;
            }
        }
        Self {
            character: character.animate(moving, delta),
            patrol,
            ..self
        }
    }

    pub fn start_event(&mut self, player: &Rect) {
        self.character.start_event(player);
    }

    pub fn complete_event(&mut self) {
        self.character.complete_event();
    }

    pub fn drawing_on_screens(&self) -> Vec<DrawingOnScreen> {
        self.character.drawing_on_screens()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::CyclicAnimation;
    use crate::drawing::Drawing;

    fn npc(event: Option<EventSpec>) -> Npc {
        let animation = CyclicAnimation::still(Drawing::sprite("npc.png", Vec2::new(16.0, 16.0)));
        let character = Character::new("guard", Rect::new(0.0, 0.0, 16.0, 16.0), animation);
        let mut spec = NpcSpec::new("guard").with_display_name("Guard");
        spec.event = event;
        Npc::new(spec, character)
    }

    #[test]
    fn test_trigger_area_uses_padding() {
        let npc = npc(Some(EventSpec::collide("talk")));
        let player = Rect::new(18.0, 0.0, 16.0, 16.0);
        assert!(!npc.collides_trigger(&player, 0.0));
        assert!(npc.collides_trigger(&player, 4.0));
        assert_eq!(npc.character.display_name, "Guard");
    }

    #[test]
    fn test_no_event_never_triggers() {
        let npc = npc(None);
        assert!(!npc.collides_trigger(&Rect::new(0.0, 0.0, 16.0, 16.0), 4.0));

        let mut hidden = self::npc(Some(EventSpec::confirm("talk")));
        hidden.character.visible = false;
        assert!(!hidden.collides_trigger(&Rect::new(0.0, 0.0, 16.0, 16.0), 4.0));
    }

    #[test]
    fn test_patrol_walks_and_pauses() {
        let route = Patrol::new(vec![Vec2::new(10.0, 0.0), Vec2::new(0.0, 0.0)], 100.0, 50);
        let npc = npc(None).with_patrol(route);

        let npc = npc.tick(50, &[]);
        assert_eq!(npc.rect().top_left, Vec2::new(5.0, 0.0));
        let npc = npc.tick(100, &[]);
        assert_eq!(npc.rect().top_left, Vec2::new(10.0, 0.0));
        let next = npc.patrol.as_ref().and_then(Patrol::next_waypoint);
        assert_eq!(next, Some(Vec2::zero()));

        // 到达后停留 50ms
        let npc = npc.tick(30, &[]);
        assert_eq!(npc.rect().top_left, Vec2::new(10.0, 0.0));
        let npc = npc.tick(20, &[]).tick(10, &[]);
        assert_eq!(npc.rect().top_left, Vec2::new(9.0, 0.0));
    }

    #[test]
    fn test_patrol_frozen_during_event() {
        let route = Patrol::new(vec![Vec2::new(10.0, 0.0)], 100.0, 0);
        let mut npc = npc(None).with_patrol(route);
        npc.start_event(&Rect::new(0.0, 30.0, 16.0, 16.0));
        let npc = npc.tick(50, &[]);
        assert_eq!(npc.rect().top_left, Vec2::zero());
    }

    #[test]
    fn test_patrol_blocked_by_player() {
        let route = Patrol::new(vec![Vec2::new(10.0, 0.0)], 100.0, 0);
        let npc = npc(None).with_patrol(route);
        let player = Rect::new(20.0, 0.0, 16.0, 16.0);
        let npc = npc.tick(50, &[player]);
        assert_eq!(npc.rect().top_left, Vec2::zero());
    }
}
