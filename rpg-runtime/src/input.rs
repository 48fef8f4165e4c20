//! # Input 模块
//!
//! Host 向 Runtime 传递的语义化输入。
//!
//! Runtime 不直接处理键盘/手柄事件，Host 负责按键映射。

use serde::{Deserialize, Serialize};

use crate::world::Direction;

/// Host 向 Runtime 传递的输入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    /// 确认键按下（对话推进、Confirm 模式触发）
    Confirm,

    /// 取消键按下
    Cancel,

    /// 方向键按下/抬起
    Move { direction: Direction, pressed: bool },
}

impl InputEvent {
    /// 创建方向键按下输入
    pub fn press(direction: Direction) -> Self {
        Self::Move {
            direction,
            pressed: true,
        }
    }

    /// 创建方向键抬起输入
    pub fn release(direction: Direction) -> Self {
        Self::Move {
            direction,
            pressed: false,
        }
    }

    pub fn is_confirm(&self) -> bool {
        matches!(self, Self::Confirm)
    }
}
