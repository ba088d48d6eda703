//! # Motion Core
//!
//! 落地页动效编排的核心库。
//!
//! ## 架构概述
//!
//! `motion-core` 是纯逻辑核心，不依赖渲染引擎。表现层通过 trait 注入能力
//! （环境、元素、文档节点、滚动宿主、文字测量），核心只修改元素的表现属性：
//!
//! ```text
//! Presentation                        Core
//!   │                                   │
//!   │── bind(element, intent, cond) ──►│ TriggerScheduler
//!   │◄──────── BindingHandle ──────────│
//!   │                                   │
//!   │── tick(dt, viewport) ───────────►│ 检查视口条件 / 推进补间
//!   │◄──────── Vec<BindingEvent> ──────│
//!   │                                   │
//!   │── PointerEvent ─────────────────►│ PointerHub → CursorFollow
//!   │◄──────── CursorFrame ────────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`MotionPolicy`]：减少动态效果偏好与设备断点，每次查询都实时读取环境
//! - [`AnimationIntent`]：不可变的属性过渡描述
//! - [`TriggerScheduler`] / [`BindingHandle`]：绑定生命周期
//! - [`CursorFollow`]：跟随指针的标签指示器
//! - [`SmoothScroller`]：命令式平滑滚动
//!
//! ## 使用示例
//!
//! ```ignore
//! use motion_core::{BindOptions, FadeInUp, TriggerScheduler, ViewportCondition, fade_in_up};
//!
//! let scheduler = TriggerScheduler::new(env.clone());
//! let handle = scheduler.bind(
//!     Some(&element),
//!     fade_in_up(env.as_ref(), &FadeInUp::default()),
//!     ViewportCondition::default(),
//!     BindOptions::default(),
//! );
//!
//! // 每帧
//! for event in scheduler.tick(dt, &viewport) {
//!     tracing::debug!(?event);
//! }
//!
//! // 卸载
//! drop(handle);
//! ```
//!
//! ## 模块结构
//!
//! - [`policy`]：运动策略与环境能力
//! - [`timing`]：时长解析、具名时长与缓动预设
//! - [`easing`]：缓动曲线
//! - [`intent`]：动画意图
//! - [`presets`]：组合辅助（fadeInUp / fadeInScale / stagger / parallax）
//! - [`trigger`]：视口触发条件
//! - [`scheduler`]：触发调度器
//! - [`cursor`] / [`pointer`] / [`spring`]：光标跟随
//! - [`scroll`]：平滑滚动
//! - [`config`]：配置
//! - [`sim`]：无头实现

pub mod config;
pub mod cursor;
pub mod easing;
pub mod element;
pub mod error;
pub mod geometry;
pub mod intent;
pub mod pointer;
pub mod policy;
pub mod presets;
pub mod scheduler;
pub mod scroll;
pub mod sim;
pub mod spring;
pub mod timing;
pub mod trigger;
pub mod tween;

// 重导出核心类型
pub use config::MotionConfig;
pub use cursor::{
    CursorConfig, CursorFollow, CursorFollowState, CursorFrame, CursorPhase, DomNode, LabeledNode,
    MountedCursor, NodeKey, TextMeasurer, closest_labeled,
};
pub use easing::EasingFunction;
pub use element::{Element, ElementRef};
pub use error::{ConfigError, ParseError};
pub use geometry::{ElementPosition, Rect, Vec2, Viewport, element_position, is_in_viewport};
pub use intent::{AnimationIntent, Property, PropertyMap};
pub use pointer::{PointerEvent, PointerHub, PointerListener, Subscription};
pub use policy::{Breakpoints, Environment, Headless, MotionPolicy};
pub use presets::{
    AnimationKind, Axis, FadeInScale, FadeInUp, Parallax, ParallaxBinding, ParallaxDirection,
    ParallaxMapping, ResolvedAnimation, StaggerChildren, StaggerTemplate, fade_in_scale,
    fade_in_up, parallax, stagger_children,
};
pub use scheduler::{
    BindOptions, BindingEvent, BindingHandle, BindingId, BindingState, StaggerGroup,
    TriggerScheduler,
};
pub use scroll::{ScrollConfig, ScrollHost, ScrollOptions, ScrollTarget, SmoothScroller};
pub use spring::{Spring, SpringConfig};
pub use timing::{DurationPreset, DurationTable, EasePreset, resolve_duration};
pub use trigger::{EdgeOffset, TriggerPosition, ViewportCondition};
