//! # Policy 模块
//!
//! 运动策略：从环境推导"减少动态效果"偏好与设备断点。
//!
//! ## 设计说明
//!
//! - 环境通过 [`Environment`] trait 注入，而不是读取全局状态
//! - 每次查询都直接读取环境，**不缓存**：用户可能在运行中切换系统设置
//! - 没有浏览上下文时（预渲染、测试），所有查询都返回 `false`

use serde::{Deserialize, Serialize};

/// 环境能力提供者
///
/// 对应浏览器的 media query 状态。实现者负责返回实时值。
pub trait Environment {
    /// 是否存在浏览上下文
    fn has_browsing_context(&self) -> bool;

    /// 是否匹配 `prefers-reduced-motion: reduce`
    fn prefers_reduced_motion(&self) -> bool;

    /// 当前视口宽度（CSS 像素）
    fn viewport_width(&self) -> f32;
}

/// 无浏览上下文的环境
///
/// 所有查询返回安全默认值：完整动效、非移动设备。
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Environment for Headless {
    fn has_browsing_context(&self) -> bool {
        false
    }

    fn prefers_reduced_motion(&self) -> bool {
        false
    }

    fn viewport_width(&self) -> f32 {
        0.0
    }
}

/// 设备断点（CSS 像素，闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoints {
    /// 移动设备最大宽度
    #[serde(default = "default_mobile_max")]
    pub mobile_max: f32,

    /// 平板最小宽度
    #[serde(default = "default_tablet_min")]
    pub tablet_min: f32,

    /// 平板最大宽度
    #[serde(default = "default_tablet_max")]
    pub tablet_max: f32,
}

fn default_mobile_max() -> f32 {
    768.0
}

fn default_tablet_min() -> f32 {
    769.0
}

fn default_tablet_max() -> f32 {
    1024.0
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            mobile_max: default_mobile_max(),
            tablet_min: default_tablet_min(),
            tablet_max: default_tablet_max(),
        }
    }
}

impl Breakpoints {
    /// 宽度是否落在移动设备区间
    pub fn is_mobile_width(&self, width: f32) -> bool {
        width <= self.mobile_max
    }

    /// 宽度是否落在平板区间
    pub fn is_tablet_width(&self, width: f32) -> bool {
        width >= self.tablet_min && width <= self.tablet_max
    }
}

/// 某一时刻的运动策略快照
///
/// 需要在一次逻辑操作中保持一致时，调用方应 `query` 一次并持有该值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MotionPolicy {
    pub reduced_motion: bool,
    pub is_mobile: bool,
    pub is_tablet: bool,
}

impl MotionPolicy {
    /// 从环境读取当前策略
    pub fn query(env: &dyn Environment, breakpoints: &Breakpoints) -> Self {
        if !env.has_browsing_context() {
            return Self::default();
        }

        let width = env.viewport_width();
        Self {
            reduced_motion: env.prefers_reduced_motion(),
            is_mobile: breakpoints.is_mobile_width(width),
            is_tablet: breakpoints.is_tablet_width(width),
        }
    }
}

/// 用户是否偏好减少动态效果
pub fn reduced_motion(env: &dyn Environment) -> bool {
    env.has_browsing_context() && env.prefers_reduced_motion()
}

/// 是否为移动设备（默认断点）
pub fn is_mobile(env: &dyn Environment) -> bool {
    env.has_browsing_context() && Breakpoints::default().is_mobile_width(env.viewport_width())
}

/// 是否为平板（默认断点）
pub fn is_tablet(env: &dyn Environment) -> bool {
    env.has_browsing_context() && Breakpoints::default().is_tablet_width(env.viewport_width())
}
