//! # RPG Runtime
//!
//! 俯视角 RPG 的实时运行时核心：角色在地图上移动，NPC 触发脚本事件，
//! 事件以包装场景的形式逐帧播放对话、淡入淡出与世界修改。
//!
//! ## 架构概述
//!
//! `rpg-runtime` 是纯逻辑核心，不做渲染、音频或窗口管理。
//! Host 每帧送入时间与输入，取回绘制列表：
//!
//! ```text
//! Host                                GameLoop
//!   │                                    │
//!   │──── frame(Δt, &[InputEvent]) ────►│ Scene::tick()
//!   │◄─── Vec<DrawingOnScreen> ─────────│
//!   │                                    │
//! ```
//!
//! 场景是值：每次 `tick` 消耗旧场景并返回新场景。事件进行时，
//! 当前场景是包裹着根场景（[`EventfulScene`]）的包装场景，
//! 包装场景结束后把结果交还给根场景，由根场景恢复脚本。
//!
//! ## 核心类型
//!
//! - [`Timer`]：所有动画的计时基础
//! - [`CyclicAnimation`] / [`TimedAnimationGroup`] / [`Typewriter`]：动画代数
//! - [`EventfulScene`]：可探索的根场景，负责触发检测与脚本调度
//! - [`EventScene`]：包装场景（对话、淡入、淡出、世界修改）
//! - [`EventScript`]：脚本契约，Rust 闭包（[`StepScript`]）或 JSON（[`Script`]）
//! - [`BackgroundEvent`]：事件结束后继续存在的绘制，以哨兵寻址
//!
//! ## 使用示例
//!
//! ```ignore
//! let mut registry = ScriptRegistry::new();
//! registry.register_json(include_str!("guard_talk.json"))?;
//!
//! let mut game = GameLoop::new(area, registry, EngineConfig::default());
//! loop {
//!     let drawings = game.frame(16, &host.poll_inputs())?;
//!     host.draw(&drawings);
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`time`]：计时器
//! - [`drawing`]：几何与绘制描述
//! - [`animation`]：动画代数
//! - [`world`]：玩家与 NPC
//! - [`background`]：后台事件与哨兵
//! - [`event`]：脚本协程与数据驱动脚本
//! - [`scene`]：根场景与包装场景
//! - [`registry`]：脚本注册表
//! - [`area`]：区域缓存与快进
//! - [`save`]：存档
//! - [`game`]：帧循环
//! - [`diagnostic`]：脚本静态检查

pub mod animation;
pub mod area;
pub mod background;
pub mod config;
pub mod diagnostic;
pub mod drawing;
pub mod error;
pub mod event;
pub mod game;
pub mod input;
pub mod registry;
pub mod save;
pub mod scene;
pub mod state;
pub mod time;
pub mod world;

// 重导出核心类型
pub use animation::{
    AnimationResource, CyclicAnimation, EasingFunction, FrameDurations, TimedAnimationGroup,
    TimedEffect, Typewriter,
};
pub use area::{AreaCache, fast_forward};
pub use background::{BackgroundEvent, BackgroundEventSentinel, BackgroundFadeIn, BackgroundFadeOut};
pub use config::EngineConfig;
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_json, analyze_script,
    extract_sprite_references,
};
pub use drawing::{Drawing, DrawingKind, DrawingOnScreen, Rect, Transform, Vec2};
pub use error::{
    AnimationError, ConfigError, ParseError, RpgError, RpgResult, RuntimeError, SaveError,
};
pub use event::{
    CoroutineStatus, EventCall, EventCompletion, EventCoroutine, EventResult, EventScript,
    FadeTarget, SayEvent, Script, ScriptContext, ScriptNode, ScriptRunner, Step, StepScript,
    WorldUpdate,
};
pub use game::GameLoop;
pub use input::InputEvent;
pub use registry::ScriptRegistry;
pub use save::{AreaSave, FsSaveIo, GameSave, MemorySaveIo, NpcSave, SaveIo, SaveVersion};
pub use scene::{EventScene, EventfulScene, Scene, TickContext};
pub use state::{GameState, VarValue};
pub use time::{Millisecond, Timer, TimerDirection};
pub use world::{Character, Direction, EventSpec, Npc, NpcEventStartMode, NpcSpec, Patrol, Player};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _timer = Timer::new(100).countdown();
        let _input = InputEvent::Confirm;
        let _config = EngineConfig::default();
        let _registry = ScriptRegistry::new();
        let _state = GameState::new();
    }
}
