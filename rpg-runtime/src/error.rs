//! # Error 模块
//!
//! 定义 rpg-runtime 中使用的错误类型。
//!
//! 零时长计时器不是错误（视为已完成）；其余不变量破坏一律以错误返回，
//! 由 Host 负责停止当前场景并记录日志，不允许静默吞掉。

use thiserror::Error;

use crate::background::BackgroundEventSentinel;

/// 动画构造错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// 循环动画没有任何帧
    #[error("循环动画至少需要一帧")]
    EmptyFrames,

    /// 逐帧时长列表与帧数不一致
    #[error("逐帧时长数量 {durations} 与帧数 {frames} 不一致")]
    FrameCountMismatch { frames: usize, durations: usize },

    /// 帧时长为 0（会导致追帧循环无法终止）
    #[error("第 {index} 帧的时长为 0")]
    ZeroFrameDuration { index: usize },

    /// 当前帧序号超出帧数
    #[error("帧序号 {index} 超出帧数 {frames}")]
    FrameIndexOutOfRange { index: usize, frames: usize },
}

/// 脚本解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// JSON 格式错误
    #[error("脚本 '{script_id}' 解析失败: {message}")]
    InvalidJson { script_id: String, message: String },

    /// 重复定义的标签
    #[error("脚本 '{script_id}' 中标签 '{label}' 重复定义")]
    DuplicateLabel { script_id: String, label: String },
}

/// 运行时错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 注册表中不存在该脚本
    #[error("脚本 '{name}' 未注册")]
    ScriptNotFound { name: String },

    /// 场景中不存在该角色
    #[error("角色 '{name}' 不存在")]
    CharacterNotFound { name: String },

    /// 后台事件不存在
    #[error("后台事件 {sentinel} 不存在")]
    BackgroundEventNotFound { sentinel: BackgroundEventSentinel },

    /// 协程使用错误（重复启动、恢复已结束的协程等）
    #[error("协程使用错误: {message}")]
    CoroutineMisuse { message: String },

    /// 脚本引用了未绑定的名称
    #[error("脚本变量 '{name}' 未绑定")]
    UnboundName { name: String },

    /// 标签未找到
    #[error("标签 '{label}' 未找到")]
    LabelNotFound { label: String },

    /// 动画构造失败
    #[error("动画错误: {0}")]
    Animation(#[from] AnimationError),

    /// 无效的状态操作
    #[error("无效的状态操作: {message}")]
    InvalidState { message: String },
}

impl RuntimeError {
    /// 创建状态错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// 创建协程使用错误
    pub fn coroutine_misuse(message: impl Into<String>) -> Self {
        Self::CoroutineMisuse {
            message: message.into(),
        }
    }
}

/// 存档错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    /// 序列化失败
    #[error("序列化失败: {0}")]
    SerializationFailed(String),

    /// 反序列化失败
    #[error("反序列化失败: {0}")]
    DeserializationFailed(String),

    /// 版本不兼容
    #[error("存档版本不兼容: 存档版本 {save_version} vs 当前版本 {current_version}")]
    IncompatibleVersion {
        save_version: String,
        current_version: String,
    },

    /// 文件操作失败
    #[error("文件操作失败: {0}")]
    IoError(String),

    /// 存档不存在
    #[error("存档不存在: {0}")]
    NotFound(String),
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// 文件读写失败
    #[error("配置文件读写失败: {0}")]
    IoError(String),

    /// 校验失败
    #[error("配置校验失败: {0}")]
    ValidationFailed(String),
}

/// rpg-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpgError {
    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),

    /// 运行时错误
    #[error("运行时错误: {0}")]
    Runtime(#[from] RuntimeError),

    /// 存档错误
    #[error("存档错误: {0}")]
    Save(#[from] SaveError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

impl From<AnimationError> for RpgError {
    fn from(e: AnimationError) -> Self {
        Self::Runtime(RuntimeError::Animation(e))
    }
}

/// Result 类型别名
pub type RpgResult<T> = Result<T, RpgError>;
