//! # Easing 模块
//!
//! 缓动函数库，用于动画的时间插值。
//!
//! 曲线以名称标识（如 `"power2.out"`），名称同时用于配置文件与序列化输出。
//! 解析时也接受品牌预设名（如 `"calm"`），解析结果为预设对应的曲线。

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParseError;
use crate::timing::EasePreset;

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum EasingFunction {
    /// 线性（匀速）
    #[serde(rename = "none")]
    Linear,
    /// 柔和缓出
    #[serde(rename = "ease.out")]
    EaseOut,
    /// 柔和缓入缓出
    #[serde(rename = "ease.inOut")]
    EaseInOut,
    /// 二次缓入
    #[serde(rename = "power1.in")]
    Power1In,
    /// 二次缓出
    #[default]
    #[serde(rename = "power1.out")]
    Power1Out,
    /// 二次缓入缓出
    #[serde(rename = "power1.inOut")]
    Power1InOut,
    /// 三次缓入
    #[serde(rename = "power2.in")]
    Power2In,
    /// 三次缓出
    #[serde(rename = "power2.out")]
    Power2Out,
    /// 三次缓入缓出
    #[serde(rename = "power2.inOut")]
    Power2InOut,
    /// 四次缓入
    #[serde(rename = "power3.in")]
    Power3In,
    /// 四次缓出
    #[serde(rename = "power3.out")]
    Power3Out,
    /// 四次缓入缓出
    #[serde(rename = "power3.inOut")]
    Power3InOut,
}

const NAMES: &[(EasingFunction, &str)] = &[
    (EasingFunction::Linear, "none"),
    (EasingFunction::EaseOut, "ease.out"),
    (EasingFunction::EaseInOut, "ease.inOut"),
    (EasingFunction::Power1In, "power1.in"),
    (EasingFunction::Power1Out, "power1.out"),
    (EasingFunction::Power1InOut, "power1.inOut"),
    (EasingFunction::Power2In, "power2.in"),
    (EasingFunction::Power2Out, "power2.out"),
    (EasingFunction::Power2InOut, "power2.inOut"),
    (EasingFunction::Power3In, "power3.in"),
    (EasingFunction::Power3Out, "power3.out"),
    (EasingFunction::Power3InOut, "power3.inOut"),
];

impl EasingFunction {
    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值 (0.0 - 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseOut => (t * PI / 2.0).sin(),
            EasingFunction::EaseInOut => -((PI * t).cos() - 1.0) / 2.0,
            EasingFunction::Power1In => ease_in(t, 2),
            EasingFunction::Power1Out => ease_out(t, 2),
            EasingFunction::Power1InOut => ease_in_out(t, 2),
            EasingFunction::Power2In => ease_in(t, 3),
            EasingFunction::Power2Out => ease_out(t, 3),
            EasingFunction::Power2InOut => ease_in_out(t, 3),
            EasingFunction::Power3In => ease_in(t, 4),
            EasingFunction::Power3Out => ease_out(t, 4),
            EasingFunction::Power3InOut => ease_in_out(t, 4),
        }
    }

    /// 曲线名称
    pub fn name(&self) -> &'static str {
        NAMES
            .iter()
            .find(|(easing, _)| easing == self)
            .map(|(_, name)| *name)
            .unwrap_or("none")
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EasingFunction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name == "linear" {
            return Ok(EasingFunction::Linear);
        }

        NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(easing, _)| *easing)
            .or_else(|| EasePreset::from_name(name).map(|preset| preset.easing()))
            .ok_or_else(|| ParseError::UnknownEasing {
                name: name.to_string(),
            })
    }
}

impl<'de> Deserialize<'de> for EasingFunction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

fn ease_in(t: f32, power: i32) -> f32 {
    t.powi(power)
}

fn ease_out(t: f32, power: i32) -> f32 {
    1.0 - (1.0 - t).powi(power)
}

fn ease_in_out(t: f32, power: i32) -> f32 {
    if t < 0.5 {
        2.0_f32.powi(power - 1) * t.powi(power)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(power) / 2.0
    }
}
