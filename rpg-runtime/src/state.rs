//! # State 模块
//!
//! 贯穿每一帧的游戏状态。
//!
//! ## 设计原则
//!
//! - 所有状态必须**显式建模**，随 `tick` 显式传递
//! - 所有状态必须**可序列化**（支持存档/读档）
//! - 不允许隐式全局状态

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 脚本变量值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    /// 布尔值
    Bool(bool),
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    String(String),
}

impl VarValue {
    /// 条件判断用的真值
    ///
    /// `false`、`0`、`0.0`、空字符串为假，其余为真。
    pub fn is_truthy(&self) -> bool {
        match self {
            VarValue::Bool(b) => *b,
            VarValue::Int(i) => *i != 0,
            VarValue::Float(f) => *f != 0.0,
            VarValue::String(s) => !s.is_empty(),
        }
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// 游戏状态
///
/// 脚本变量与累计游戏时长。事件脚本通过 [`crate::event::ScriptContext`] 读取，
/// 通过 `WorldUpdate::SetVariable` 写入。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// 脚本变量
    #[serde(default)]
    pub variables: HashMap<String, VarValue>,

    /// 累计游戏时长（毫秒）
    #[serde(default)]
    pub play_time: u64,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置变量
    pub fn set_var(&mut self, name: impl Into<String>, value: VarValue) {
        self.variables.insert(name.into(), value);
    }

    /// 获取变量
    pub fn get_var(&self, name: &str) -> Option<&VarValue> {
        self.variables.get(name)
    }

    /// 变量是否存在且为真
    pub fn is_set(&self, name: &str) -> bool {
        self.get_var(name).is_some_and(VarValue::is_truthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_state_vars() {
        let mut state = GameState::new();
        assert!(!state.is_set("met_guard"));

        state.set_var("met_guard", VarValue::Bool(true));
        state.set_var("coins", VarValue::Int(0));
        assert!(state.is_set("met_guard"));
        assert!(!state.is_set("coins"));
        assert_eq!(state.get_var("coins"), Some(&VarValue::Int(0)));
    }

    #[test]
    fn test_var_value_untagged_json() {
        let values: Vec<VarValue> = serde_json::from_str(r#"[true, 3, 1.5, "hi"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                VarValue::Bool(true),
                VarValue::Int(3),
                VarValue::Float(1.5),
                VarValue::String("hi".to_string()),
            ]
        );
    }
}
