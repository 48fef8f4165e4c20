//! # World 模块
//!
//! 可探索地图上的角色：玩家与 NPC。
//!
//! 地图加载、寻路与精灵解码不在 Runtime 范围内，这里只保留事件系统依赖的部分：
//! 矩形位置、朝向、碰撞谓词、行走动画与事件期间的冻结/恢复。

mod character;
mod npc;
mod player;

pub use character::{Character, Direction};
pub use npc::{EventSpec, Npc, NpcEventStartMode, NpcSpec, Patrol};
pub use player::Player;
