//! # Player 模块
//!
//! 玩家角色：根据方向键移动，被其它角色阻挡。

use serde::{Deserialize, Serialize};

use super::{Character, Direction};
use crate::drawing::{DrawingOnScreen, Rect};
use crate::input::InputEvent;
use crate::time::Millisecond;

/// 玩家
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub character: Character,
    /// 移动速度（像素/秒）
    pub speed: f32,
    /// 当前按住的方向键，最后一个为前进方向
    #[serde(skip)]
    held: Vec<Direction>,
}

impl Player {
    pub fn new(character: Character, speed: f32) -> Self {
        Self {
            character,
            speed,
            held: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.character.unique_name
    }

    pub fn rect(&self) -> Rect {
        self.character.rect
    }

    /// 前进方向（最后按下且仍按住的方向键）
    pub fn heading(&self) -> Option<Direction> {
        self.held.last().copied()
    }

    pub fn is_moving(&self) -> bool {
        !self.character.in_event && self.heading().is_some()
    }

    /// 处理方向键输入，其它输入忽略
    pub fn handle_input(&mut self, input: &InputEvent) {
        let InputEvent::Move { direction, pressed } = *input else {
            return;
        };
        self.held.retain(|d| *d != direction);
        if pressed {
            self.held.push(direction);
        }
    }

    /// 移动并推进动画
    ///
    /// 目标位置与任一障碍矩形重叠时原地不动。
    #[must_use]
    pub(crate) fn tick(self, delta: Millisecond, obstacles: &[Rect]) -> Self {
        let moving = self.is_moving();
        let mut character = self.character;
        if let (true, Some(heading)) = (moving, self.held.last().copied()) {
            character.facing = heading;
            let distance = self.speed * delta as f32 / 1000.0;
            let target = character.rect.translate(heading.unit().scaled(distance));
            if !obstacles.iter().any(|o| o.collide(&target)) {
                character.rect = target;
            }
        }
        Self {
            character: character.animate(moving, delta),
            ..self
        }
    }

    /// 进入事件：转向 NPC、冻结并清空按键
    pub fn start_event(&mut self, npc: &Rect) {
        self.character.start_event(npc);
        self.held.clear();
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
    use crate::drawing::{Drawing, Vec2};

    fn player() -> Player {
        let animation = CyclicAnimation::still(Drawing::sprite("hero.png", Vec2::new(16.0, 16.0)));
        let character = Character::new("hero", Rect::new(0.0, 0.0, 16.0, 16.0), animation);
        Player::new(character, 100.0)
    }

    #[test]
    fn test_move_with_held_key() {
        let mut player = player();
        player.handle_input(&InputEvent::press(Direction::Right));
        let player = player.tick(100, &[]);
        assert_eq!(player.rect().top_left, Vec2::new(10.0, 0.0));
        assert_eq!(player.character.facing, Direction::Right);
    }

    #[test]
    fn test_last_pressed_wins_and_release() {
        let mut player = player();
        player.handle_input(&InputEvent::press(Direction::Right));
        player.handle_input(&InputEvent::press(Direction::Down));
        assert_eq!(player.heading(), Some(Direction::Down));
        player.handle_input(&InputEvent::release(Direction::Down));
        assert_eq!(player.heading(), Some(Direction::Right));
        player.handle_input(&InputEvent::release(Direction::Right));
        assert!(!player.is_moving());
    }

    #[test]
    fn test_blocked_by_obstacle() {
        let mut player = player();
        player.handle_input(&InputEvent::press(Direction::Right));
        let wall = Rect::new(20.0, 0.0, 16.0, 16.0);
        let player = player.tick(100, &[wall]);
        assert_eq!(player.rect().top_left, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn test_event_freezes_and_clears_keys() {
        let mut player = player();
        player.handle_input(&InputEvent::press(Direction::Left));
        player.start_event(&Rect::new(0.0, 40.0, 16.0, 16.0));
        assert_eq!(player.character.facing, Direction::Down);
        assert!(!player.is_moving());
        let player = player.tick(100, &[]);
        assert_eq!(player.rect().top_left, Vec2::zero());
    }
}
