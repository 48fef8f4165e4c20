//! # Character 模块
//!
//! 玩家与 NPC 共享的角色数据。

use serde::{Deserialize, Serialize};

use crate::animation::CyclicAnimation;
use crate::drawing::{DrawingOnScreen, Rect, Vec2};
use crate::time::Millisecond;

/// 朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// 单位向量（屏幕坐标，y 轴向下）
    pub fn unit(&self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// `from` 指向 `to` 的主方向（按位移较大的轴）
    pub fn toward(from: Vec2, to: Vec2) -> Self {
        let delta = to - from;
        if delta.x.abs() >= delta.y.abs() {
            if delta.x >= 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if delta.y >= 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

/// 角色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// 唯一名称（脚本与存档中的引用键）
    pub unique_name: String,
    /// 显示名称（对话框标题）
    pub display_name: String,
    /// 碰撞矩形
    pub rect: Rect,
    /// 朝向
    pub facing: Direction,
    /// 行走/待机动画
    pub animation: CyclicAnimation,
    /// 是否可见（不可见的角色不绘制、不触发事件）
    pub visible: bool,
    /// 是否处于事件中（冻结移动）
    pub in_event: bool,
}

impl Character {
    pub fn new(unique_name: impl Into<String>, rect: Rect, animation: CyclicAnimation) -> Self {
        let unique_name = unique_name.into();
        Self {
            display_name: unique_name.clone(),
            unique_name,
            rect,
            facing: Direction::default(),
            animation,
            visible: true,
            in_event: false,
        }
    }

    /// 设置显示名称
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// 设置朝向
    pub fn with_facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    /// 进入事件：转向对方并冻结
    pub fn start_event(&mut self, other: &Rect) {
        self.facing = Direction::toward(self.rect.center(), other.center());
        self.in_event = true;
    }

    /// 结束事件：解除冻结
    pub fn complete_event(&mut self) {
        self.in_event = false;
    }

    /// 推进行走动画；静止时回到第 0 帧
    #[must_use]
    pub(crate) fn animate(self, moving: bool, delta: Millisecond) -> Self {
        let animation = if moving {
            self.animation.tick(delta)
        } else if self.animation.index() == 0 && self.animation.elapsed() == 0 {
            self.animation
        } else {
            self.animation.reset()
        };
        Self { animation, ..self }
    }

    pub fn drawing_on_screens(&self) -> Vec<DrawingOnScreen> {
        if !self.visible {
            return Vec::new();
        }
        vec![self.animation.drawing().clone().at(self.rect.top_left)]
    }
}
