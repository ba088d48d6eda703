//! # Timing 模块
//!
//! 时长与缓动解析：把具名的时长/缓动意图映射为具体数值与曲线。
//!
//! 所有动画时长都必须经过 [`resolve_duration`]，这是减少动态效果策略的唯一关口。

use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;
use crate::policy::{self, Environment};

/// 解析动画时长
///
/// 减少动态效果时无条件返回 `0`，否则原样返回 `nominal`。
pub fn resolve_duration(env: &dyn Environment, nominal: f32) -> f32 {
    if policy::reduced_motion(env) {
        0.0
    } else {
        nominal
    }
}

/// 具名时长
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationPreset {
    Fast,
    Normal,
    Slow,
    Slower,
}

/// 具名时长对应的秒数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationTable {
    #[serde(default = "default_fast")]
    pub fast: f32,
    #[serde(default = "default_normal")]
    pub normal: f32,
    #[serde(default = "default_slow")]
    pub slow: f32,
    #[serde(default = "default_slower")]
    pub slower: f32,
}

fn default_fast() -> f32 {
    0.2
}

fn default_normal() -> f32 {
    0.5
}

fn default_slow() -> f32 {
    0.8
}

fn default_slower() -> f32 {
    1.2
}

impl Default for DurationTable {
    fn default() -> Self {
        Self {
            fast: default_fast(),
            normal: default_normal(),
            slow: default_slow(),
            slower: default_slower(),
        }
    }
}

impl DurationTable {
    /// 名义时长（不考虑运动策略）
    pub fn nominal(&self, preset: DurationPreset) -> f32 {
        match preset {
            DurationPreset::Fast => self.fast,
            DurationPreset::Normal => self.normal,
            DurationPreset::Slow => self.slow,
            DurationPreset::Slower => self.slower,
        }
    }

    /// 经过运动策略解析后的时长
    pub fn resolve(&self, env: &dyn Environment, preset: DurationPreset) -> f32 {
        resolve_duration(env, self.nominal(preset))
    }

    /// 全部时长（按 fast → slower 顺序）
    pub fn values(&self) -> [f32; 4] {
        [self.fast, self.normal, self.slow, self.slower]
    }
}

/// 品牌缓动预设
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EasePreset {
    /// 柔和：轻微的入场、过渡
    Calm,
    /// 精致：重要元素、首屏
    Intelligent,
    /// 强调：首屏揭示、主要 CTA
    Dramatic,
    /// 亲和：悬停与微交互
    Approachable,
    /// 干脆：点击反馈
    Snappy,
}

impl EasePreset {
    pub const ALL: [EasePreset; 5] = [
        EasePreset::Calm,
        EasePreset::Intelligent,
        EasePreset::Dramatic,
        EasePreset::Approachable,
        EasePreset::Snappy,
    ];

    /// 预设名称（小写）
    pub fn name(&self) -> &'static str {
        match self {
            EasePreset::Calm => "calm",
            EasePreset::Intelligent => "intelligent",
            EasePreset::Dramatic => "dramatic",
            EasePreset::Approachable => "approachable",
            EasePreset::Snappy => "snappy",
        }
    }

    /// 按名称查找预设
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.name() == name)
    }

    /// 对应的缓动曲线
    pub fn easing(&self) -> EasingFunction {
        match self {
            EasePreset::Calm => EasingFunction::EaseOut,
            EasePreset::Intelligent => EasingFunction::Power2Out,
            EasePreset::Dramatic => EasingFunction::Power3Out,
            EasePreset::Approachable => EasingFunction::EaseInOut,
            EasePreset::Snappy => EasingFunction::Power1InOut,
        }
    }
}

impl From<EasePreset> for EasingFunction {
    fn from(preset: EasePreset) -> Self {
        preset.easing()
    }
}
