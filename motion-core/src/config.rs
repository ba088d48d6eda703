//! # Config 模块
//!
//! 运动配置，集中管理断点、时长、触发默认值、光标与滚动参数。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高，由宿主处理）
//! 2. 配置文件（`config.json`）
//! 3. 默认值（最低）
//!
//! 每个字段都有默认值，配置文件只需写出需要覆盖的部分。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cursor::CursorConfig;
use crate::error::ConfigError;
use crate::policy::Breakpoints;
use crate::scroll::ScrollConfig;
use crate::timing::DurationTable;
use crate::trigger::ViewportCondition;

/// 运动配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionConfig {
    /// 设备断点
    #[serde(default)]
    pub breakpoints: Breakpoints,

    /// 具名时长
    #[serde(default)]
    pub durations: DurationTable,

    /// 默认视口触发条件
    #[serde(default)]
    pub trigger: ViewportCondition,

    /// 光标指示器
    #[serde(default)]
    pub cursor: CursorConfig,

    /// 平滑滚动
    #[serde(default)]
    pub scroll: ScrollConfig,
}

impl MotionConfig {
    /// 加载配置文件
    ///
    /// 文件不存在或解析失败时返回默认配置并输出警告。
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

    /// 从 JSON 文本解析
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::SerializationFailed(e.to_string()))
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bp = &self.breakpoints;
        if bp.mobile_max <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "mobile_max 必须大于 0".to_string(),
            ));
        }
        if bp.tablet_min <= bp.mobile_max || bp.tablet_max < bp.tablet_min {
            return Err(ConfigError::ValidationFailed(format!(
                "断点顺序错误: mobile_max={} tablet_min={} tablet_max={}",
                bp.mobile_max, bp.tablet_min, bp.tablet_max
            )));
        }

        // 检查时长
        let named = ["fast", "normal", "slow", "slower"];
        for (name, value) in named.iter().zip(self.durations.values()) {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::ValidationFailed(format!(
                    "时长 {name} 必须为非负数: {value}"
                )));
            }
        }
        if !(self.scroll.duration >= 0.0 && self.scroll.by_duration >= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "滚动时长必须为非负数".to_string(),
            ));
        }

        // 检查光标
        let cursor = &self.cursor;
        if cursor.label_attribute.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "cursor.label_attribute 不能为空".to_string(),
            ));
        }
        if cursor.circle_size <= 0.0 || cursor.pill_height <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "光标尺寸必须大于 0".to_string(),
            ));
        }
        if cursor.padding_x < 0.0 || cursor.min_pill_width < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "光标内边距与最小宽度不能为负数".to_string(),
            ));
        }
        if !cursor.spring.is_valid() {
            return Err(ConfigError::ValidationFailed(format!(
                "弹簧参数无效: stiffness={} damping={} mass={}",
                cursor.spring.stiffness, cursor.spring.damping, cursor.spring.mass
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::EasingFunction;

    #[test]
    fn test_default_config() {
        let config = MotionConfig::default();
        assert_eq!(config.breakpoints.mobile_max, 768.0);
        assert_eq!(config.durations.values(), [0.2, 0.5, 0.8, 1.2]);
        assert_eq!(config.trigger.start.to_string(), "top 80%");
        assert!(config.trigger.once);
        assert_eq!(config.cursor.circle_size, 16.0);
        assert_eq!(config.cursor.label_attribute, "data-cursor-text");
        assert_eq!(config.scroll.ease, EasingFunction::Power2InOut);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = MotionConfig::from_json(
            r#"{
                "durations": { "slow": 1.0 },
                "cursor": { "spring": { "stiffness": 500 } },
                "scroll": { "ease": "power3.out" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.durations.slow, 1.0);
        assert_eq!(config.durations.fast, 0.2);
        assert_eq!(config.cursor.spring.stiffness, 500.0);
        assert_eq!(config.cursor.spring.damping, 40.0);
        assert_eq!(config.scroll.ease, EasingFunction::Power3Out);
    }

    #[test]
    fn test_unknown_easing_is_rejected() {
        let result = MotionConfig::from_json(r#"{ "scroll": { "ease": "bounce" } }"#);
        assert!(matches!(result, Err(ConfigError::SerializationFailed(_))));
    }

    #[test]
    fn test_validate_breakpoints() {
        let mut config = MotionConfig::default();
        config.breakpoints.tablet_min = 500.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_validate_durations() {
        let mut config = MotionConfig::default();
        config.durations.normal = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_cursor() {
        let mut config = MotionConfig::default();
        config.cursor.label_attribute = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = MotionConfig::default();
        config.cursor.spring.mass = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = MotionConfig::load("/nonexistent/motion/config.json");
        assert_eq!(config, MotionConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = MotionConfig::default();
        config.trigger = config.trigger.repeating();
        config.save(&path).unwrap();

        let loaded = MotionConfig::load(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(MotionConfig::load(&path), MotionConfig::default());
    }
}
