//! # Config 模块
//!
//! 引擎配置，集中管理所有可调参数。
//!
//! ## 配置优先级
//!
//! 1. Host 代码中显式覆盖（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）
//!
//! 配置对象在构造 [`crate::game::GameLoop`] 时显式传入，Runtime 不读取任何全局配置。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::animation::EasingFunction;
use crate::error::ConfigError;
use crate::time::Millisecond;

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 屏幕配置
    #[serde(default)]
    pub screen: ScreenConfig,

    /// 对话事件配置
    #[serde(default)]
    pub say_event: SayEventConfig,

    /// 定时动画配置
    #[serde(default)]
    pub animation: AnimationConfig,

    /// 过场（上下遮幅）配置
    #[serde(default)]
    pub cutscene: CutsceneConfig,

    /// 地图世界配置
    #[serde(default)]
    pub world: WorldConfig,

    /// 区域缓存配置
    #[serde(default)]
    pub area: AreaConfig,
}

/// 屏幕配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// 逻辑宽度
    #[serde(default = "default_screen_width")]
    pub width: f32,
    /// 逻辑高度
    #[serde(default = "default_screen_height")]
    pub height: f32,
    /// 背景色 (RGBA)
    #[serde(default = "default_background")]
    pub background: [u8; 4],
}

/// 对话事件配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SayEventConfig {
    /// 对话框淡入淡出时长
    #[serde(default = "default_say_fade_duration")]
    pub fade_duration: Millisecond,
    /// 打字机每字间隔（0 表示立即全部显示）
    #[serde(default = "default_text_delay")]
    pub text_delay: Millisecond,
    /// 对话框内边距
    #[serde(default = "default_padding")]
    pub padding: f32,
    /// 对话框高度
    #[serde(default = "default_box_height")]
    pub box_height: f32,
    /// 对话框底色 (RGBA)
    #[serde(default = "default_box_color")]
    pub color: [u8; 4],
    /// 单字宽度估算（文本绘制尺寸，由 Host 按实际字体重新排版）
    #[serde(default = "default_glyph_width")]
    pub glyph_width: f32,
}

/// 定时动画配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// 脚本未指定时长时使用的默认时长
    #[serde(default = "default_timed_duration")]
    pub default_duration: Millisecond,
    /// 默认缓动函数
    #[serde(default)]
    pub easing: EasingFunction,
}

/// 过场配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutsceneConfig {
    /// 遮幅高度占屏幕高度的比例
    #[serde(default = "default_cover_scaling")]
    pub cover_scaling: f32,
    /// 是否等待遮幅淡入淡出完成
    #[serde(default = "default_true")]
    pub wait: bool,
    /// 遮幅淡入淡出时长（None 使用 animation.default_duration）
    #[serde(default)]
    pub duration: Option<Millisecond>,
    /// 遮幅颜色（None 使用 screen.background）
    #[serde(default)]
    pub background: Option<[u8; 4]>,
}

/// 地图世界配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// NPC 事件触发区域相对碰撞矩形的外扩距离
    #[serde(default = "default_trigger_padding")]
    pub trigger_padding: f32,
    /// 玩家移动速度（像素/秒）
    #[serde(default = "default_player_speed")]
    pub player_speed: f32,
}

/// 区域缓存配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaConfig {
    /// 最多缓存的区域数量
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    /// 重新进入区域时追帧的步长
    #[serde(default = "default_catch_up_step")]
    pub catch_up_step: Millisecond,
    /// 追帧总时长上限，超出部分丢弃
    #[serde(default = "default_max_catch_up")]
    pub max_catch_up: Millisecond,
}

// 默认值函数

fn default_true() -> bool {
    true
}

fn default_screen_width() -> f32 {
    1280.0
}

fn default_screen_height() -> f32 {
    720.0
}

fn default_background() -> [u8; 4] {
    [0, 0, 0, 255]
}

fn default_say_fade_duration() -> Millisecond {
    200
}

fn default_text_delay() -> Millisecond {
    15
}

fn default_padding() -> f32 {
    12.0
}

fn default_box_height() -> f32 {
    160.0
}

fn default_box_color() -> [u8; 4] {
    [255, 255, 255, 200]
}

fn default_glyph_width() -> f32 {
    14.0
}

fn default_timed_duration() -> Millisecond {
    300
}

fn default_cover_scaling() -> f32 {
    0.1
}

fn default_trigger_padding() -> f32 {
    4.0
}

fn default_player_speed() -> f32 {
    120.0
}

fn default_cache_size() -> usize {
    8
}

fn default_catch_up_step() -> Millisecond {
    100
}

fn default_max_catch_up() -> Millisecond {
    60_000
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
            background: default_background(),
        }
    }
}

impl Default for SayEventConfig {
    fn default() -> Self {
        Self {
            fade_duration: default_say_fade_duration(),
            text_delay: default_text_delay(),
            padding: default_padding(),
            box_height: default_box_height(),
            color: default_box_color(),
            glyph_width: default_glyph_width(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            default_duration: default_timed_duration(),
            easing: EasingFunction::default(),
        }
    }
}

impl Default for CutsceneConfig {
    fn default() -> Self {
        Self {
            cover_scaling: default_cover_scaling(),
            wait: true,
            duration: None,
            background: None,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            trigger_padding: default_trigger_padding(),
            player_speed: default_player_speed(),
        }
    }
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
            catch_up_step: default_catch_up_step(),
            max_catch_up: default_max_catch_up(),
        }
    }
}

impl CutsceneConfig {
    /// 实际使用的遮幅时长
    pub fn duration_or(&self, animation: &AnimationConfig) -> Millisecond {
        self.duration.unwrap_or(animation.default_duration)
    }

    /// 实际使用的遮幅颜色
    pub fn background_or(&self, screen: &ScreenConfig) -> [u8; 4] {
        self.background.unwrap_or(screen.background)
    }
}

impl EngineConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match Self::from_json(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::SerializationFailed(e.to_string()))
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;
        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen.width <= 0.0 || self.screen.height <= 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "屏幕尺寸必须为正: {}x{}",
                self.screen.width, self.screen.height
            )));
        }

        if !(0.0..=0.5).contains(&self.cutscene.cover_scaling) {
            return Err(ConfigError::ValidationFailed(format!(
                "cutscene.cover_scaling 必须在 0.0 - 0.5 之间: {}",
                self.cutscene.cover_scaling
            )));
        }

        if self.area.cache_size == 0 {
            return Err(ConfigError::ValidationFailed("area.cache_size 至少为 1".to_string()));
        }

        // 步长为 0 时追帧循环无法推进
        if self.area.catch_up_step == 0 {
            return Err(ConfigError::ValidationFailed("area.catch_up_step 必须大于 0".to_string()));
        }

        if self.world.trigger_padding < 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "world.trigger_padding 不能为负: {}",
                self.world.trigger_padding
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.say_event.fade_duration, 200);
        assert_eq!(config.area.cache_size, 8);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "say_event": { "text_delay": 0 }, "area": { "cache_size": 2 } }"#,
        )
        .unwrap();
        assert_eq!(config.say_event.text_delay, 0);
        assert_eq!(config.say_event.fade_duration, 200);
        assert_eq!(config.area.cache_size, 2);
        assert_eq!(config.area.catch_up_step, 100);
        assert_eq!(config.screen.width, 1280.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.area.catch_up_step = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationFailed(_))));

        let mut config = EngineConfig::default();
        config.cutscene.cover_scaling = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cutscene_fallbacks() {
        let config = EngineConfig::default();
        assert_eq!(config.cutscene.duration_or(&config.animation), 300);
        let background = config.cutscene.background_or(&config.screen);
        assert_eq!(background, [0, 0, 0, 255]);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = EngineConfig::load("/definitely/not/here/config.json");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = EngineConfig::default();
        config.world.player_speed = 42.0;
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path), config);
    }
}
