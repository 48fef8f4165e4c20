//! # EventfulScene
//!
//! 区域根场景：玩家、NPC、后台事件，以及至多一个正在运行的脚本协程。
//!
//! ## 状态
//!
//! ```text
//! Idle ──触发──► Triggered ──start──► Running ──Done──► Idle
//!                                      │  ▲
//!                          Yield(包装) │  │ complete(结果)
//!                                      ▼  │
//!                                   包装场景
//! ```
//!
//! - `started_npc` 在事件启动到结束期间有值
//! - `ended_npc` 记录刚结束事件的 NPC，玩家离开所有 NPC 的触发区域时清空，
//!   防止站在原地的碰撞触发反复执行
//! - `active` 有值时不检测任何触发

use tracing::{debug, trace};

use super::{Scene, TickContext};
use crate::background::{BackgroundEvent, BackgroundEventSentinel};
use crate::config::EngineConfig;
use crate::drawing::{DrawingOnScreen, Rect};
use crate::error::{RuntimeError, SaveError};
use crate::event::{EventCompletion, EventCoroutine, EventResult, ScriptContext, Step};
use crate::input::InputEvent;
use crate::save::{AreaSave, NpcSave};
use crate::state::GameState;
use crate::time::Millisecond;
use crate::world::{Character, Npc, NpcEventStartMode, Player};

/// 正在运行的事件
#[derive(Debug)]
struct ActiveEvent {
    coroutine: EventCoroutine,
    /// 当前包装场景交还的结果；None 表示包装场景尚未完成
    result: Option<EventResult>,
}

/// 区域根场景
#[derive(Debug)]
pub struct EventfulScene {
    id: String,
    player: Player,
    npcs: Vec<Npc>,
    /// 地图等静态背景
    decorations: Vec<DrawingOnScreen>,
    started_npc: Option<String>,
    ended_npc: Option<String>,
    active: Option<ActiveEvent>,
    background_events: Vec<Box<dyn BackgroundEvent>>,
    /// 最近一次分配的哨兵编号
    last_sentinel: u64,
}

impl EventfulScene {
    pub fn new(id: impl Into<String>, player: Player, npcs: Vec<Npc>) -> Self {
        Self {
            id: id.into(),
            player,
            npcs,
            decorations: Vec::new(),
            started_npc: None,
            ended_npc: None,
            active: None,
            background_events: Vec::new(),
            last_sentinel: 0,
        }
    }

    /// 设置静态背景
    pub fn with_decorations(mut self, decorations: Vec<DrawingOnScreen>) -> Self {
        self.decorations = decorations;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn npc(&self, name: &str) -> Result<&Npc, RuntimeError> {
        self.npcs
            .iter()
            .find(|n| n.name() == name)
            .ok_or_else(|| character_not_found(name))
    }

    fn npc_mut(&mut self, name: &str) -> Result<&mut Npc, RuntimeError> {
        self.npcs
            .iter_mut()
            .find(|n| n.name() == name)
            .ok_or_else(|| character_not_found(name))
    }

    pub fn started_npc(&self) -> Option<&str> {
        self.started_npc.as_deref()
    }

    pub fn ended_npc(&self) -> Option<&str> {
        self.ended_npc.as_deref()
    }

    /// 是否有事件正在运行
    pub fn is_event_active(&self) -> bool {
        self.active.is_some()
    }

    /// 按唯一名称查找角色（玩家或 NPC）
    pub fn get_character(&self, name: &str) -> Result<&Character, RuntimeError> {
        if self.player.name() == name {
            return Ok(&self.player.character);
        }
        self.npc(name).map(|n| &n.character)
    }

    pub(crate) fn character_mut(&mut self, name: &str) -> Result<&mut Character, RuntimeError> {
        if self.player.name() == name {
            return Ok(&mut self.player.character);
        }
        self.npc_mut(name).map(|n| &mut n.character)
    }

    /// 替换玩家，保留事件冻结状态
    pub(crate) fn replace_player(&mut self, mut player: Player) {
        player.character.in_event = self.player.character.in_event;
        self.player = player;
    }

    /// 替换同名 NPC，保留事件冻结状态
    pub(crate) fn replace_npc(&mut self, mut npc: Npc) -> Result<(), RuntimeError> {
        let slot = self.npc_mut(npc.name())?;
        npc.character.in_event = slot.character.in_event;
        *slot = npc;
        Ok(())
    }

    pub fn background_events(&self) -> impl Iterator<Item = &dyn BackgroundEvent> {
        self.background_events.iter().map(|e| e.as_ref())
    }

    pub fn get_background_event(
        &self,
        sentinel: BackgroundEventSentinel,
    ) -> Result<&dyn BackgroundEvent, RuntimeError> {
        self.background_events()
            .find(|e| e.sentinel() == sentinel)
            .ok_or(RuntimeError::BackgroundEventNotFound { sentinel })
    }

    /// 凭哨兵撤销后台事件
    pub fn remove_background_event(
        &mut self,
        sentinel: BackgroundEventSentinel,
    ) -> Option<Box<dyn BackgroundEvent>> {
        let index = self
            .background_events
            .iter()
            .position(|e| e.sentinel() == sentinel)?;
        Some(self.background_events.remove(index))
    }

    /// 分配一个新的哨兵
    pub fn allocate_sentinel(&mut self) -> BackgroundEventSentinel {
        self.last_sentinel += 1;
        BackgroundEventSentinel::new(self.last_sentinel)
    }

    /// 推进一帧
    pub fn tick(
        mut self,
        delta: Millisecond,
        ctx: &mut TickContext<'_>,
    ) -> Result<Scene, RuntimeError> {
        if self.active.is_some() {
            return self.resume_event(delta, ctx);
        }
        if self.started_npc.is_some() {
            return self.start_event(delta, ctx);
        }
        if let Some(name) = self.collide_trigger(ctx.config) {
            debug!(npc = %name, "碰撞触发事件");
            self.started_npc = Some(name);
            return self.start_event(delta, ctx);
        }
        Ok(Scene::Eventful(self.tick_without_event(delta, ctx.config, ctx.state)))
    }

    /// 处理输入
    ///
    /// 空闲时按下确认键且玩家处在 Confirm 模式 NPC 的触发区域内，选中该 NPC，
    /// 事件在随后的 tick 中启动；其它输入交给玩家。
    pub fn handle_input(&mut self, input: &InputEvent, config: &EngineConfig) {
        if input.is_confirm() && self.started_npc.is_none() && self.active.is_none() {
            let selected = self
                .trigger_candidates(config)
                .find(|n| start_mode(n) == Some(NpcEventStartMode::Confirm))
                .map(|n| n.name().to_string());
            if let Some(name) = selected {
                debug!(npc = %name, "确认键触发事件");
                self.started_npc = Some(name);
                return;
            }
        }
        self.player.handle_input(input);
    }

    /// 只推进世界：玩家与 NPC 移动、后台事件，不检测触发
    #[must_use]
    pub fn tick_without_event(
        mut self,
        delta: Millisecond,
        config: &EngineConfig,
        state: &mut GameState,
    ) -> Self {
        let snapshot: Vec<(String, Rect)> = self
            .npcs
            .iter()
            .filter(|n| n.character.visible)
            .map(|n| (n.name().to_string(), n.rect()))
            .collect();
        let npc_rects: Vec<Rect> = snapshot.iter().map(|(_, rect)| *rect).collect();
        self.player = self.player.tick(delta, &npc_rects);

        // NPC 被玩家和其它可见 NPC（推进前的位置）阻挡
        let player_rect = self.player.rect();
        self.npcs = std::mem::take(&mut self.npcs)
            .into_iter()
            .map(|npc| {
                let obstacles: Vec<Rect> = std::iter::once(player_rect)
                    .chain(
                        snapshot
                            .iter()
                            .filter(|(other, _)| other != npc.name())
                            .map(|(_, rect)| *rect),
                    )
                    .collect();
                npc.tick(delta, &obstacles)
            })
            .collect();

        let padding = config.world.trigger_padding;
        if self.ended_npc.is_some()
            && !self
                .npcs
                .iter()
                .any(|n| n.collides_trigger(&player_rect, padding))
        {
            trace!(npc = ?self.ended_npc, "玩家离开触发区域");
            self.ended_npc = None;
        }

        let events = std::mem::take(&mut self.background_events);
        self.background_events = events
            .into_iter()
            .map(|e| e.tick(delta, state))
            .filter(|e| !e.is_complete())
            .collect();
        self
    }

    /// 包装场景完成时调用：记录结果，可选地注册后台事件
    pub fn complete(
        mut self,
        result: EventResult,
        background: Option<Box<dyn BackgroundEvent>>,
    ) -> Result<Self, RuntimeError> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| RuntimeError::invalid_state("没有正在运行的事件，无法完成包装场景"))?;
        if active.result.is_some() {
            return Err(RuntimeError::invalid_state("包装场景重复完成"));
        }
        active.result = Some(result);
        if let Some(event) = background {
            debug!(sentinel = %event.sentinel(), "注册后台事件");
            self.background_events.push(event);
        }
        Ok(self)
    }

    /// 玩家当前所处的、可以触发事件的 NPC
    fn trigger_candidates<'a>(
        &'a self,
        config: &EngineConfig,
    ) -> impl Iterator<Item = &'a Npc> + 'a {
        let player_rect = self.player.rect();
        let padding = config.world.trigger_padding;
        self.npcs
            .iter()
            .filter(move |n| n.restart_event && n.collides_trigger(&player_rect, padding))
    }

    /// 碰撞触发
    ///
    /// 只看第一个碰到的 NPC：它须是 Collide 模式且不是刚结束事件的 NPC。
    /// 同时站在多个触发区域内不会让它们轮流触发。
    fn collide_trigger(&self, config: &EngineConfig) -> Option<String> {
        let npc = self.trigger_candidates(config).next()?;
        if start_mode(npc) != Some(NpcEventStartMode::Collide)
            || self.ended_npc.as_deref() == Some(npc.name())
        {
            return None;
        }
        Some(npc.name().to_string())
    }

    /// 启动 `started_npc` 的事件
    ///
    /// 脚本在修改任何 NPC/玩家状态之前实例化，找不到脚本时直接返回错误。
    fn start_event(
        self,
        delta: Millisecond,
        ctx: &mut TickContext<'_>,
    ) -> Result<Scene, RuntimeError> {
        let name = self
            .started_npc
            .clone()
            .ok_or_else(|| RuntimeError::invalid_state("启动事件时没有选中的 NPC"))?;
        let npc = self.npc(&name)?;
        let spec = npc
            .spec
            .event
            .clone()
            .ok_or_else(|| RuntimeError::invalid_state(format!("NPC '{name}' 没有事件")))?;
        let script = ctx.registry.instantiate(&spec.script)?;
        let npc_rect = npc.rect();
        let player_rect = self.player.rect();

        let mut scene = self;
        scene.npc_mut(&name)?.start_event(&player_rect);
        scene.player.start_event(&npc_rect);
        let mut scene = scene.tick_without_event(delta, ctx.config, ctx.state);

        let mut coroutine = EventCoroutine::new(script);
        debug!(npc = %name, script = coroutine.name(), "事件开始");
        let step = coroutine.start(&ScriptContext {
            scene: &scene,
            state: &*ctx.state,
            npc: &name,
            config: ctx.config,
        })?;
        scene.active = Some(ActiveEvent {
            coroutine,
            result: None,
        });
        scene.apply_step(step, ctx.config)
    }

    /// 推进世界后以包装场景的结果恢复协程
    fn resume_event(
        self,
        delta: Millisecond,
        ctx: &mut TickContext<'_>,
    ) -> Result<Scene, RuntimeError> {
        let mut scene = self.tick_without_event(delta, ctx.config, ctx.state);
        let mut active = scene
            .active
            .take()
            .ok_or_else(|| RuntimeError::invalid_state("没有正在运行的事件"))?;
        let result = active
            .result
            .take()
            .ok_or_else(|| RuntimeError::invalid_state("包装场景尚未完成就恢复了协程"))?;
        let name = scene
            .started_npc
            .clone()
            .ok_or_else(|| RuntimeError::invalid_state("运行中的事件没有 started_npc"))?;

        let step = active.coroutine.resume(
            result,
            &ScriptContext {
                scene: &scene,
                state: &*ctx.state,
                npc: &name,
                config: ctx.config,
            },
        )?;
        scene.active = Some(active);
        scene.apply_step(step, ctx.config)
    }

    fn apply_step(self, step: Step, config: &EngineConfig) -> Result<Scene, RuntimeError> {
        match step {
            Step::Yield(call) => {
                trace!(?call, "脚本挂起");
                call.into_scene(self, config)
            }
            Step::Done(completion) => Ok(Scene::Eventful(self.complete_event(completion)?)),
        }
    }

    /// 协程结束：按完成结果修改 NPC，解除双方冻结
    fn complete_event(mut self, completion: EventCompletion) -> Result<Self, RuntimeError> {
        let name = self
            .started_npc
            .take()
            .ok_or_else(|| RuntimeError::invalid_state("完成事件时没有 started_npc"))?;
        let active = self
            .active
            .take()
            .ok_or_else(|| RuntimeError::invalid_state("完成事件时没有正在运行的协程"))?;

        let npc = self.npc_mut(&name)?;
        match &completion {
            EventCompletion::Dismiss => npc.restart_event = false,
            EventCompletion::Replace(spec) => npc.spec.event = Some(spec.clone()),
            EventCompletion::Nothing | EventCompletion::Data(_) => {}
        }
        npc.complete_event();
        self.player.complete_event();

        debug!(npc = %name, script = active.coroutine.name(), ?completion, "事件结束");
        self.ended_npc = Some(name);
        Ok(self)
    }

    /// 从后到前的绘制列表：静态背景、按底边排序的角色、后台事件
    pub fn drawing_on_screens(&self) -> Vec<DrawingOnScreen> {
        let mut characters: Vec<&Character> = std::iter::once(&self.player.character)
            .chain(self.npcs.iter().map(|n| &n.character))
            .collect();
        characters.sort_by(|a, b| a.rect.bottom().total_cmp(&b.rect.bottom()));

        let mut drawings = self.decorations.clone();
        drawings.extend(
            characters
                .into_iter()
                .flat_map(Character::drawing_on_screens),
        );
        drawings.extend(
            self.background_events
                .iter()
                .flat_map(|e| e.drawing_on_screens()),
        );
        drawings
    }

    /// 存档数据
    pub fn save_data(&self) -> AreaSave {
        AreaSave::new(
            self.id.clone(),
            self.player.clone(),
            self.npcs
                .iter()
                .map(|n| NpcSave {
                    name: n.name().to_string(),
                    restart_event: n.restart_event,
                    event: n.spec.event.clone(),
                    visible: n.character.visible,
                })
                .collect(),
        )
    }

    /// 从存档恢复玩家与 NPC 状态
    ///
    /// 存档中不存在于本区域的 NPC 被忽略。
    pub fn update_from_save(mut self, save: AreaSave) -> Result<Self, SaveError> {
        save.check_version()?;
        if save.area != self.id {
            return Err(SaveError::DeserializationFailed(format!(
                "存档属于区域 '{}'，当前区域为 '{}'",
                save.area, self.id
            )));
        }
        self.player = save.player;
        for record in save.npcs {
            if let Some(npc) = self.npcs.iter_mut().find(|n| n.name() == record.name) {
                npc.restart_event = record.restart_event;
                npc.spec.event = record.event;
                npc.character.visible = record.visible;
            }
        }
        Ok(self)
    }
}

fn character_not_found(name: &str) -> RuntimeError {
    RuntimeError::CharacterNotFound {
        name: name.to_string(),
    }
}

fn start_mode(npc: &Npc) -> Option<NpcEventStartMode> {
    npc.spec.event.as_ref().map(|e| e.start_mode)
}
