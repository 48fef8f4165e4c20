//! # Save 模块
//!
//! 存档数据模型与存取接口。
//!
//! ## 设计原则
//!
//! - 存档数据均可序列化为 JSON
//! - 必须有版本号，读取时检查兼容性
//! - 只保存事件相关的持久状态：玩家、NPC 的 `restart_event` / 事件 / 可见性、
//!   脚本变量；动画进度与后台事件等临时状态不保存
//! - 实际的存储介质由 [`SaveIo`] 实现决定

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::error::SaveError;
use crate::state::GameState;
use crate::world::{EventSpec, Player};

/// 存档格式版本
///
/// - MAJOR: 不兼容的格式变更
/// - MINOR: 向后兼容的新字段
pub const SAVE_VERSION_MAJOR: u32 = 1;
pub const SAVE_VERSION_MINOR: u32 = 0;

/// 存档版本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveVersion {
    pub major: u32,
    pub minor: u32,
}

impl SaveVersion {
    pub fn current() -> Self {
        Self {
            major: SAVE_VERSION_MAJOR,
            minor: SAVE_VERSION_MINOR,
        }
    }

    /// major 相同即兼容
    pub fn is_compatible(&self) -> bool {
        self.major == SAVE_VERSION_MAJOR
    }
}

impl Default for SaveVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// NPC 的持久状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSave {
    pub name: String,
    pub restart_event: bool,
    #[serde(default)]
    pub event: Option<EventSpec>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// 区域存档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSave {
    pub version: SaveVersion,
    /// 区域 id
    pub area: String,
    pub player: Player,
    pub npcs: Vec<NpcSave>,
}

impl AreaSave {
    pub fn new(area: impl Into<String>, player: Player, npcs: Vec<NpcSave>) -> Self {
        Self {
            version: SaveVersion::current(),
            area: area.into(),
            player,
            npcs,
        }
    }

    pub fn check_version(&self) -> Result<(), SaveError> {
        if self.version.is_compatible() {
            Ok(())
        } else {
            Err(SaveError::IncompatibleVersion {
                save_version: self.version.to_string(),
                current_version: SaveVersion::current().to_string(),
            })
        }
    }
}

/// 完整存档：当前区域与游戏状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSave {
    pub area: AreaSave,
    #[serde(default)]
    pub state: GameState,
}

impl GameSave {
    pub fn to_json(&self) -> Result<String, SaveError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SaveError::SerializationFailed(e.to_string()))
    }

    /// 反序列化并检查版本
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let save: GameSave = serde_json::from_str(json)
            .map_err(|e| SaveError::DeserializationFailed(e.to_string()))?;
        save.area.check_version()?;
        Ok(save)
    }
}

/// 存档存取接口
pub trait SaveIo {
    fn save(&mut self, key: &str, blob: &str) -> Result<(), SaveError>;

    /// 不存在时返回 `Ok(None)`
    fn load(&self, key: &str) -> Result<Option<String>, SaveError>;
}

/// 内存存档（测试与无盘环境）
#[derive(Debug, Clone, Default)]
pub struct MemorySaveIo {
    blobs: HashMap<String, String>,
}

impl MemorySaveIo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveIo for MemorySaveIo {
    fn save(&mut self, key: &str, blob: &str) -> Result<(), SaveError> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, SaveError> {
        Ok(self.blobs.get(key).cloned())
    }
}

/// 文件存档：每个 key 一个 `<key>.json`
#[derive(Debug, Clone)]
pub struct FsSaveIo {
    root: PathBuf,
}

impl FsSaveIo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &str) -> Result<PathBuf, SaveError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SaveError::IoError(format!("非法的存档 key: '{key}'")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl SaveIo for FsSaveIo {
    fn save(&mut self, key: &str, blob: &str) -> Result<(), SaveError> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.root).map_err(|e| SaveError::IoError(e.to_string()))?;
        fs::write(&path, blob).map_err(|e| SaveError::IoError(e.to_string()))
    }

    fn load(&self, key: &str) -> Result<Option<String>, SaveError> {
        let path = self.path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| SaveError::IoError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::CyclicAnimation;
    use crate::drawing::{Drawing, Rect, Vec2};
    use crate::world::Character;

    fn area_save() -> AreaSave {
        let animation = CyclicAnimation::still(Drawing::sprite("hero.png", Vec2::new(16.0, 16.0)));
        let character = Character::new("hero", Rect::new(1.0, 2.0, 16.0, 16.0), animation);
        let player = Player::new(character, 80.0);
        AreaSave::new(
            "village",
            player,
            vec![NpcSave {
                name: "guard".to_string(),
                restart_event: false,
                event: Some(EventSpec::collide("guard_after")),
                visible: true,
            }],
        )
    }

    #[test]
    fn test_save_version_compatibility() {
        assert!(SaveVersion::current().is_compatible());
        assert!(SaveVersion { major: 1, minor: 7 }.is_compatible());
        assert!(!SaveVersion { major: 2, minor: 0 }.is_compatible());
        assert_eq!(SaveVersion::current().to_string(), "1.0");
    }

    #[test]
    fn test_incompatible_version_error() {
        let mut save = GameSave {
            area: area_save(),
            state: GameState::new(),
        };
        save.area.version.major = 99;
        let json = save.to_json().unwrap();
        assert!(matches!(
            GameSave::from_json(&json),
            Err(SaveError::IncompatibleVersion { .. })
        ));
    }

    #[test]
    fn test_memory_io() {
        let mut io = MemorySaveIo::new();
        assert_eq!(io.load("slot1").unwrap(), None);
        io.save("slot1", "{}").unwrap();
        assert_eq!(io.load("slot1").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_fs_io_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut io = FsSaveIo::new(dir.path().join("saves"));
        let save = GameSave {
            area: area_save(),
            state: GameState::new(),
        };
        io.save("slot1", &save.to_json().unwrap()).unwrap();

        let loaded = GameSave::from_json(&io.load("slot1").unwrap().unwrap()).unwrap();
        assert_eq!(loaded, save);
        assert_eq!(io.load("slot2").unwrap(), None);
    }

    #[test]
    fn test_fs_io_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut io = FsSaveIo::new(dir.path());
        assert!(matches!(io.save("../escape", "{}"), Err(SaveError::IoError(_))));
        assert!(matches!(io.save("存档", "{}"), Err(SaveError::IoError(_))));
        assert!(matches!(io.save("", "{}"), Err(SaveError::IoError(_))));
        assert!(io.save("slot_1-b", "{}").is_ok());
    }

    #[test]
    fn test_corrupt_animation_rejected() {
        let save = GameSave {
            area: area_save(),
            state: GameState::new(),
        };
        let mut json: serde_json::Value = serde_json::from_str(&save.to_json().unwrap()).unwrap();
        json["area"]["player"]["character"]["animation"]["frames"] = serde_json::json!([]);
        assert!(matches!(
            GameSave::from_json(&json.to_string()),
            Err(SaveError::DeserializationFailed(_))
        ));
    }
}
