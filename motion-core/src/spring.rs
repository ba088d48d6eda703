//! # Spring 模块
//!
//! 弹簧插值：数值以阻尼振子的方式追随移动的目标，从不瞬移。
//!
//! ## 设计说明
//!
//! - 参数为物理量：`stiffness`（k）、`damping`（c）、`mass`（m），
//!   默认 350 / 40 / 1，接近临界阻尼
//! - 每帧 `dt` 先截断到 0.1 秒，再按不超过 1/120 秒的子步长做半隐式欧拉积分，
//!   掉帧时依然稳定
//! - 距离与速度都足够小时吸附到目标，避免无限微动

use serde::{Deserialize, Serialize};

/// 单帧最大步长（秒）
const MAX_FRAME_DT: f32 = 0.1;
/// 积分子步长上限（秒）
const MAX_SUBSTEP: f32 = 1.0 / 120.0;
/// 吸附阈值
const REST_DELTA: f32 = 0.01;
const REST_SPEED: f32 = 0.01;

/// 弹簧参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    /// 刚度
    #[serde(default = "default_stiffness")]
    pub stiffness: f32,

    /// 阻尼系数
    #[serde(default = "default_damping")]
    pub damping: f32,

    /// 质量
    #[serde(default = "default_mass")]
    pub mass: f32,
}

fn default_stiffness() -> f32 {
    350.0
}

fn default_damping() -> f32 {
    40.0
}

fn default_mass() -> f32 {
    1.0
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: default_stiffness(),
            damping: default_damping(),
            mass: default_mass(),
        }
    }
}

impl SpringConfig {
    /// 阻尼比（1.0 为临界阻尼）
    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    /// 参数是否可用于积分
    pub fn is_valid(&self) -> bool {
        self.stiffness > 0.0 && self.damping >= 0.0 && self.mass > 0.0
    }
}

/// 单值弹簧
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    current: f32,
    target: f32,
    velocity: f32,
    config: SpringConfig,
}

impl Spring {
    /// 以初始值创建（静止）
    pub fn new(initial: f32, config: SpringConfig) -> Self {
        Self {
            current: initial,
            target: initial,
            velocity: 0.0,
            config,
        }
    }

    /// 设置新的目标值
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// 直接跳到某个值（无动画）
    pub fn jump_to(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.velocity = 0.0;
    }

    /// 推进弹簧
    pub fn tick(&mut self, dt: f32) {
        if !self.config.is_valid() {
            self.jump_to(self.target);
            return;
        }

        let mut remaining = dt.clamp(0.0, MAX_FRAME_DT);
        while remaining > 0.0 {
            let h = remaining.min(MAX_SUBSTEP);
            self.step(h);
            remaining -= h;
        }

        if self.is_at_rest() {
            self.current = self.target;
            self.velocity = 0.0;
        }
    }

    fn step(&mut self, h: f32) {
        let SpringConfig {
            stiffness,
            damping,
            mass,
        } = self.config;
        let displacement = self.current - self.target;
        let acceleration = (-stiffness * displacement - damping * self.velocity) / mass;

        self.velocity += acceleration * h;
        self.current += self.velocity * h;
    }

    fn is_at_rest(&self) -> bool {
        (self.current - self.target).abs() < REST_DELTA && self.velocity.abs() < REST_SPEED
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// 是否已静止在目标上
    pub fn is_settled(&self) -> bool {
        self.current == self.target && self.velocity == 0.0
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }
}
