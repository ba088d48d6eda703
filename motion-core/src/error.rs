//! # Error 模块
//!
//! 定义 motion-core 中使用的错误类型。
//!
//! 动画本身是装饰性的，`bind` / `destroy` / 光标事件 / 滚动辅助都不会返回错误。
//! 错误只出现在配置与字符串解析（缓动名称、触发位置）阶段。

use thiserror::Error;

/// 解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 未知的缓动曲线名称
    #[error("未知的缓动曲线 '{name}'")]
    UnknownEasing { name: String },

    /// 无效的触发位置描述
    #[error("无效的触发位置 '{input}' - {message}")]
    InvalidTriggerPosition { input: String, message: String },
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
