//! # Area 模块
//!
//! 区域缓存：离开区域时保存其根场景，重新进入时快进离开期间的世界时间。
//!
//! 快进只重放 [`EventfulScene::tick_without_event`]，不检测触发。
//! 重放按 `area.catch_up_step` 分段，总时长上限为 `area.max_catch_up`，
//! 超出部分直接丢弃，长时间未访问的区域不会造成一次巨大的同步追帧。

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::scene::EventfulScene;
use crate::state::GameState;
use crate::time::Millisecond;

#[derive(Debug)]
struct CachedArea {
    scene: EventfulScene,
    /// 离开时的游戏时间
    left_at: Millisecond,
}

/// LRU 区域缓存
#[derive(Debug)]
pub struct AreaCache {
    capacity: usize,
    /// 最近离开的在队尾
    areas: VecDeque<CachedArea>,
}

impl AreaCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            areas: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.areas.iter().any(|a| a.scene.id() == id)
    }

    /// 离开区域，缓存其场景；超出容量时淘汰最久未访问的区域
    pub fn leave(&mut self, scene: EventfulScene, now: Millisecond) {
        self.areas.retain(|a| a.scene.id() != scene.id());
        debug!(area = scene.id(), now, "缓存区域");
        self.areas.push_back(CachedArea {
            scene,
            left_at: now,
        });
        while self.areas.len() > self.capacity {
            if let Some(evicted) = self.areas.pop_front() {
                debug!(area = evicted.scene.id(), "淘汰区域缓存");
            }
        }
    }

    /// 重新进入区域：取出缓存并快进离开期间的时间
    ///
    /// 未缓存（从未访问或已被淘汰）时返回 None，由调用方重新构造。
    pub fn enter(
        &mut self,
        id: &str,
        now: Millisecond,
        config: &EngineConfig,
        state: &mut GameState,
    ) -> Option<EventfulScene> {
        let index = self.areas.iter().position(|a| a.scene.id() == id)?;
        let cached = self.areas.remove(index)?;
        let gap = now.saturating_sub(cached.left_at);
        Some(fast_forward(cached.scene, gap, config, state))
    }
}

/// 分段重放 `gap` 毫秒的世界推进
pub fn fast_forward(
    mut scene: EventfulScene,
    gap: Millisecond,
    config: &EngineConfig,
    state: &mut GameState,
) -> EventfulScene {
    let total = gap.min(config.area.max_catch_up);
    if total < gap {
        debug!(
            area = scene.id(),
            gap,
            replayed = total,
            "快进时长超过上限，多余部分丢弃"
        );
    }
    let step = config.area.catch_up_step.max(1);
    let mut remaining = total;
    while remaining > 0 {
        let delta = remaining.min(step);
        scene = scene.tick_without_event(delta, config, state);
        remaining -= delta;
    }
    trace!(area = scene.id(), replayed = total, "区域快进完成");
    scene
}
