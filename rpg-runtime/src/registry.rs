//! # Registry 模块
//!
//! 脚本注册表：脚本名 → 脚本工厂。
//!
//! 注册表是显式对象，由 Host 在开始游戏前填充并交给 [`crate::game::GameLoop`]。
//! NPC 的 [`crate::world::EventSpec`] 只保存脚本名，事件启动时才通过注册表实例化，
//! 每次触发都得到一个全新的脚本实例。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ParseError, RuntimeError};
use crate::event::{EventScript, Script, ScriptRunner};

type ScriptFactory = Box<dyn Fn() -> Box<dyn EventScript>>;

/// 脚本注册表
#[derive(Default)]
pub struct ScriptRegistry {
    factories: HashMap<String, ScriptFactory>,
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("scripts", &self.names())
            .finish()
    }
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: String, factory: ScriptFactory) {
        if self.factories.insert(name.clone(), factory).is_some() {
            warn!(script = %name, "脚本被重复注册，旧脚本已被替换");
        } else {
            debug!(script = %name, "注册脚本");
        }
    }

    /// 注册以 Rust 编写的脚本
    pub fn register_fn<F, S>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> S + 'static,
        S: EventScript + 'static,
    {
        self.insert(
            name.into(),
            Box::new(move || -> Box<dyn EventScript> { Box::new(factory()) }),
        );
    }

    /// 注册数据驱动脚本（以 `script.id` 为名），标签在注册时校验
    pub fn register_script(&mut self, script: Script) -> Result<(), ParseError> {
        let labels = Arc::new(script.labels()?);
        let name = script.id.clone();
        let script = Arc::new(script);
        self.insert(
            name,
            Box::new(move || -> Box<dyn EventScript> {
                Box::new(ScriptRunner::from_parts(Arc::clone(&script), Arc::clone(&labels)))
            }),
        );
        Ok(())
    }

    /// 解析并注册 JSON 脚本，返回脚本名
    pub fn register_json(&mut self, json: &str) -> Result<String, ParseError> {
        let script = Script::from_json(json)?;
        let name = script.id.clone();
        self.register_script(script)?;
        Ok(name)
    }

    /// 实例化脚本
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn EventScript>, RuntimeError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RuntimeError::ScriptNotFound {
                name: name.to_string(),
            })?;
        Ok(factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// 已注册的脚本名（排序）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
