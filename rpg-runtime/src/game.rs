//! # Game 模块
//!
//! Host 驱动的帧循环。
//!
//! ```text
//! Host                         GameLoop
//!  │── frame(Δt, inputs) ───────►│  输入交给当前场景，再 tick
//!  │◄── Vec<DrawingOnScreen> ────│
//! ```
//!
//! 场景出错时记录错误并停止推进：之后的 `frame` 都返回错误，
//! 不会带着半完成的世界状态继续运行。

use tracing::{debug, error, info};

use crate::area::AreaCache;
use crate::config::EngineConfig;
use crate::drawing::DrawingOnScreen;
use crate::error::{RpgError, RuntimeError, SaveError};
use crate::input::InputEvent;
use crate::registry::ScriptRegistry;
use crate::save::{GameSave, SaveIo};
use crate::scene::{EventfulScene, Scene, TickContext};
use crate::state::GameState;
use crate::time::Millisecond;

/// 帧循环
pub struct GameLoop {
    /// None 表示已因错误停止
    scene: Option<Scene>,
    registry: ScriptRegistry,
    config: EngineConfig,
    state: GameState,
    areas: AreaCache,
    save_io: Option<Box<dyn SaveIo>>,
}

impl std::fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoop")
            .field("scene", &self.scene)
            .field("registry", &self.registry)
            .field("state", &self.state)
            .field("areas", &self.areas.len())
            .field("save_io", &self.save_io.is_some())
            .finish()
    }
}

impl GameLoop {
    pub fn new(scene: EventfulScene, registry: ScriptRegistry, config: EngineConfig) -> Self {
        let areas = AreaCache::new(config.area.cache_size);
        Self {
            scene: Some(Scene::Eventful(scene)),
            registry,
            config,
            state: GameState::new(),
            areas,
            save_io: None,
        }
    }

    /// 设置存档存储
    pub fn with_save_io(mut self, io: impl SaveIo + 'static) -> Self {
        self.save_io = Some(Box::new(io));
        self
    }

    /// 设置初始游戏状态
    pub fn with_state(mut self, state: GameState) -> Self {
        self.state = state;
        self
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    pub fn is_halted(&self) -> bool {
        self.scene.is_none()
    }

    fn halted() -> RpgError {
        RuntimeError::invalid_state("场景已因错误停止").into()
    }

    /// 推进一帧并返回绘制列表
    pub fn frame(
        &mut self,
        delta: Millisecond,
        inputs: &[InputEvent],
    ) -> Result<Vec<DrawingOnScreen>, RpgError> {
        let mut scene = self.scene.take().ok_or_else(Self::halted)?;
        for input in inputs {
            scene.handle_input(input, &self.config);
        }

        let mut ctx = TickContext {
            registry: &self.registry,
            config: &self.config,
            state: &mut self.state,
        };
        match scene.tick(delta, &mut ctx) {
            Ok(next) => {
                self.state.play_time += delta;
                let drawings = next.drawing_on_screens();
                self.scene = Some(next);
                Ok(drawings)
            }
            Err(e) => {
                error!(error = %e, "场景出错，停止推进");
                Err(e.into())
            }
        }
    }

    /// 取出空闲的根场景（包装场景或事件进行中时报错，场景原样保留）
    fn take_idle_root(&mut self, action: &str) -> Result<EventfulScene, RpgError> {
        match self.scene.take() {
            Some(Scene::Eventful(root))
                if !root.is_event_active() && root.started_npc().is_none() =>
            {
                Ok(root)
            }
            Some(other) => {
                self.scene = Some(other);
                Err(RuntimeError::invalid_state(format!("事件进行中，不能{action}")).into())
            }
            None => Err(Self::halted()),
        }
    }

    /// 切换区域
    ///
    /// 当前区域进入缓存；目标区域优先从缓存恢复（快进离开期间的时间），
    /// 否则由 `build` 构造。
    pub fn enter_area(
        &mut self,
        id: &str,
        build: impl FnOnce() -> EventfulScene,
    ) -> Result<(), RpgError> {
        let current = self.take_idle_root("切换区域")?;
        let now = self.state.play_time;
        self.areas.leave(current, now);
        let scene = match self.areas.enter(id, now, &self.config, &mut self.state) {
            Some(scene) => scene,
            None => {
                debug!(area = id, "区域未缓存，重新构造");
                build()
            }
        };
        info!(area = scene.id(), "进入区域");
        self.scene = Some(Scene::Eventful(scene));
        Ok(())
    }

    fn save_io(&self) -> Result<&dyn SaveIo, SaveError> {
        self.save_io
            .as_deref()
            .ok_or_else(|| SaveError::IoError("未配置存档存储".to_string()))
    }

    /// 保存当前区域与游戏状态
    pub fn save(&mut self, key: &str) -> Result<(), RpgError> {
        let root = self.scene.as_ref().ok_or_else(Self::halted)?.root();
        let json = GameSave {
            area: root.save_data(),
            state: self.state.clone(),
        }
        .to_json()?;
        let io = self
            .save_io
            .as_deref_mut()
            .ok_or_else(|| SaveError::IoError("未配置存档存储".to_string()))?;
        io.save(key, &json)?;
        info!(key, "存档完成");
        Ok(())
    }

    /// 读取存档到当前区域
    ///
    /// 存档必须属于当前区域，且当前没有进行中的事件。
    pub fn load(&mut self, key: &str) -> Result<(), RpgError> {
        let json = self
            .save_io()?
            .load(key)?
            .ok_or_else(|| SaveError::NotFound(key.to_string()))?;
        let save = GameSave::from_json(&json)?;

        let root = self.take_idle_root("读档")?;
        if save.area.area != root.id() {
            let message = format!(
                "存档属于区域 '{}'，当前区域为 '{}'",
                save.area.area,
                root.id()
            );
            self.scene = Some(Scene::Eventful(root));
            return Err(SaveError::DeserializationFailed(message).into());
        }
        self.scene = Some(Scene::Eventful(root.update_from_save(save.area)?));
        self.state = save.state;
        info!(key, "读档完成");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::MemorySaveIo;
    use crate::scene::tests::demo_scene;

    #[test]
    fn test_frame_accumulates_play_time() {
        let mut game = GameLoop::new(demo_scene(), ScriptRegistry::new(), EngineConfig::default());
        let drawings = game.frame(16, &[]).unwrap();
        assert_eq!(drawings.len(), 2);
        game.frame(16, &[]).unwrap();
        assert_eq!(game.state().play_time, 32);
    }

    #[test]
    fn test_error_halts_loop() {
        // 守卫的脚本没有注册
        let mut game = GameLoop::new(demo_scene(), ScriptRegistry::new(), EngineConfig::default());
        let result = game.frame(16, &[InputEvent::Confirm]);
        assert!(matches!(
            result,
            Err(RpgError::Runtime(RuntimeError::ScriptNotFound { .. }))
        ));
        assert!(game.is_halted());
        assert!(matches!(
            game.frame(16, &[]),
            Err(RpgError::Runtime(RuntimeError::InvalidState { .. }))
        ));
    }

    #[test]
    fn test_save_without_io_fails() {
        let mut game = GameLoop::new(demo_scene(), ScriptRegistry::new(), EngineConfig::default());
        assert!(matches!(
            game.save("slot1"),
            Err(RpgError::Save(SaveError::IoError(_)))
        ));
        assert!(matches!(
            game.load("slot1"),
            Err(RpgError::Save(SaveError::IoError(_)))
        ));
    }

    #[test]
    fn test_load_missing_key() {
        let mut game = GameLoop::new(demo_scene(), ScriptRegistry::new(), EngineConfig::default())
            .with_save_io(MemorySaveIo::new());
        assert!(matches!(
            game.load("nothing"),
            Err(RpgError::Save(SaveError::NotFound(_)))
        ));
    }

    #[test]
    fn test_corrupt_save_keeps_loop_running() {
        let save = GameSave {
            area: demo_scene().save_data(),
            state: GameState::new(),
        };
        let mut json: serde_json::Value = serde_json::from_str(&save.to_json().unwrap()).unwrap();
        json["area"]["player"]["character"]["animation"]["frames"] = serde_json::json!([]);
        let mut io = MemorySaveIo::new();
        io.save("slot1", &json.to_string()).unwrap();

        let mut game = GameLoop::new(demo_scene(), ScriptRegistry::new(), EngineConfig::default())
            .with_save_io(io);
        assert!(matches!(
            game.load("slot1"),
            Err(RpgError::Save(SaveError::DeserializationFailed(_)))
        ));
        assert_eq!(game.frame(16, &[]).unwrap().len(), 2);
    }
}
