//! # Intent 模块
//!
//! 动画意图：一组属性过渡的不可变描述。
//!
//! 由组合辅助函数（见 [`crate::presets`]）产生，由调度器消费。
//! `from_props` 描述起始状态；`to_props` 缺省时，终止状态取元素绑定时的当前值。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;

/// 可动画属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Property {
    Opacity,
    X,
    Y,
    Scale,
    Rotation,
}

impl Property {
    /// 属性名称
    pub fn name(&self) -> &'static str {
        match self {
            Property::Opacity => "opacity",
            Property::X => "x",
            Property::Y => "y",
            Property::Scale => "scale",
            Property::Rotation => "rotation",
        }
    }

    /// 静止值（元素未被动画修改时的值）
    pub fn rest_value(&self) -> f32 {
        match self {
            Property::Opacity | Property::Scale => 1.0,
            Property::X | Property::Y | Property::Rotation => 0.0,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 属性 → 值映射（有序，保证序列化结果稳定）
pub type PropertyMap = BTreeMap<Property, f32>;

/// 动画意图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationIntent {
    /// 起始属性
    #[serde(default)]
    pub from_props: PropertyMap,

    /// 目标属性（缺省时使用元素当前值）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_props: Option<PropertyMap>,

    /// 时长（秒）
    pub duration: f32,

    /// 延迟（秒）
    #[serde(default)]
    pub delay: f32,

    /// 缓动曲线
    #[serde(default)]
    pub ease: EasingFunction,
}

impl AnimationIntent {
    /// 创建 "from" 型意图：从 `from_props` 过渡到元素当前值
    pub fn from_props(from_props: PropertyMap, duration: f32) -> Self {
        Self {
            from_props,
            to_props: None,
            duration,
            delay: 0.0,
            ease: EasingFunction::default(),
        }
    }

    /// 创建 "to" 型意图：从元素当前值过渡到 `to_props`
    pub fn to_props(to_props: PropertyMap, duration: f32) -> Self {
        Self {
            from_props: PropertyMap::new(),
            to_props: Some(to_props),
            duration,
            delay: 0.0,
            ease: EasingFunction::default(),
        }
    }

    /// 设置延迟
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    /// 设置缓动
    pub fn with_ease(mut self, ease: EasingFunction) -> Self {
        self.ease = ease;
        self
    }

    /// 设置时长
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    /// 意图涉及的全部属性（去重、有序）
    pub fn properties(&self) -> Vec<Property> {
        let mut props: Vec<Property> = self.from_props.keys().copied().collect();
        if let Some(to) = &self.to_props {
            props.extend(to.keys().copied());
        }
        props.sort();
        props.dedup();
        props
    }
}
