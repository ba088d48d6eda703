//! # Presets 模块
//!
//! 组合辅助函数：从声明式选项构造 [`AnimationIntent`]。
//!
//! 所有函数都是纯函数：相同的选项与相同的运动策略产生完全相同的结果。
//! 时长统一经过 [`resolve_duration`]。
//!
//! 动画种类以 [`AnimationKind`] 标签联合表示，一次性解析为规范形式
//! [`ResolvedAnimation`]，之后不再做运行时形状判断。

use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;
use crate::intent::{AnimationIntent, Property, PropertyMap};
use crate::policy::{self, Environment};
use crate::timing::resolve_duration;
use crate::trigger::{EdgeOffset, TriggerPosition};

/// 上移淡入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeInUp {
    pub from_opacity: f32,
    pub from_y: f32,
    pub duration: f32,
    pub delay: f32,
    pub ease: EasingFunction,
}

impl Default for FadeInUp {
    fn default() -> Self {
        Self {
            from_opacity: 0.0,
            from_y: 50.0,
            duration: 0.8,
            delay: 0.0,
            ease: EasingFunction::Power2Out,
        }
    }
}

/// 构造上移淡入意图
pub fn fade_in_up(env: &dyn Environment, options: &FadeInUp) -> AnimationIntent {
    AnimationIntent {
        from_props: PropertyMap::from([
            (Property::Opacity, options.from_opacity),
            (Property::Y, options.from_y),
        ]),
        to_props: None,
        duration: resolve_duration(env, options.duration),
        delay: options.delay,
        ease: options.ease,
    }
}

/// 缩放淡入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeInScale {
    pub from_opacity: f32,
    pub from_scale: f32,
    pub from_y: f32,
    pub from_rotation: f32,
    pub duration: f32,
    pub delay: f32,
    pub ease: EasingFunction,
}

impl Default for FadeInScale {
    fn default() -> Self {
        Self {
            from_opacity: 0.0,
            from_scale: 0.85,
            from_y: 0.0,
            from_rotation: 0.0,
            duration: 1.0,
            delay: 0.0,
            ease: EasingFunction::Power3Out,
        }
    }
}

/// 构造缩放淡入意图
///
/// `y` 与 `rotation` 只在非零时出现在起始属性中。
pub fn fade_in_scale(env: &dyn Environment, options: &FadeInScale) -> AnimationIntent {
    let mut from_props = PropertyMap::from([
        (Property::Opacity, options.from_opacity),
        (Property::Scale, options.from_scale),
    ]);
    if options.from_y != 0.0 {
        from_props.insert(Property::Y, options.from_y);
    }
    if options.from_rotation != 0.0 {
        from_props.insert(Property::Rotation, options.from_rotation);
    }

    AnimationIntent {
        from_props,
        to_props: None,
        duration: resolve_duration(env, options.duration),
        delay: options.delay,
        ease: options.ease,
    }
}

/// 错峰动画模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaggerTemplate {
    /// 从给定属性过渡到元素当前值
    From(PropertyMap),
    /// 从元素当前值过渡到给定属性
    To(PropertyMap),
}

impl Default for StaggerTemplate {
    fn default() -> Self {
        StaggerTemplate::From(PropertyMap::from([
            (Property::Opacity, 0.0),
            (Property::Y, 50.0),
        ]))
    }
}

/// 子元素错峰
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerChildren {
    pub animation: StaggerTemplate,
    /// 相邻元素的延迟增量（秒，负值按 0 处理）
    pub stagger: f32,
    pub duration: f32,
    /// 整组的基础延迟
    pub delay: f32,
    pub ease: EasingFunction,
}

impl Default for StaggerChildren {
    fn default() -> Self {
        Self {
            animation: StaggerTemplate::default(),
            stagger: 0.15,
            duration: 0.7,
            delay: 0.0,
            ease: EasingFunction::Power2Out,
        }
    }
}

impl StaggerChildren {
    /// 第 `index` 个元素的延迟
    pub fn delay_for(&self, index: usize) -> f32 {
        self.delay + index as f32 * self.stagger.max(0.0)
    }
}

/// 为 `count` 个元素展开错峰意图
///
/// 第 `i` 个元素的延迟为 `delay + i * stagger`。
pub fn stagger_children(
    env: &dyn Environment,
    options: &StaggerChildren,
    count: usize,
) -> Vec<AnimationIntent> {
    let duration = resolve_duration(env, options.duration);
    let template = match &options.animation {
        StaggerTemplate::From(props) => AnimationIntent::from_props(props.clone(), duration),
        StaggerTemplate::To(props) => AnimationIntent::to_props(props.clone(), duration),
    }
    .with_ease(options.ease);

    (0..count)
        .map(|index| template.clone().with_delay(options.delay_for(index)))
        .collect()
}

/// 坐标轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn property(&self) -> Property {
        match self {
            Axis::X => Property::X,
            Axis::Y => Property::Y,
        }
    }
}

/// 视差方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParallaxDirection {
    #[default]
    Vertical,
    Horizontal,
}

/// 视差选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parallax {
    /// 速度（0.5 = 半速）
    pub speed: f32,
    /// 显式指定坐标轴；缺省时由 `direction` 决定
    pub axis: Option<Axis>,
    pub direction: ParallaxDirection,
    pub start: TriggerPosition,
    pub end: TriggerPosition,
}

impl Default for Parallax {
    fn default() -> Self {
        Self {
            speed: 0.5,
            axis: None,
            direction: ParallaxDirection::Vertical,
            start: TriggerPosition::new(EdgeOffset::Top, EdgeOffset::Bottom),
            end: TriggerPosition::new(EdgeOffset::Bottom, EdgeOffset::Top),
        }
    }
}

impl Parallax {
    /// 实际使用的坐标轴
    pub fn resolved_axis(&self) -> Axis {
        self.axis.unwrap_or(match self.direction {
            ParallaxDirection::Vertical => Axis::Y,
            ParallaxDirection::Horizontal => Axis::X,
        })
    }
}

/// 视差映射：属性值随滚动进度线性变化
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParallaxMapping {
    pub property: Property,
    /// 整个区间内的总位移（`speed * 100`）
    pub displacement: f32,
    pub start: TriggerPosition,
    pub end: TriggerPosition,
}

impl ParallaxMapping {
    /// 进度 `progress` 处的属性值，位移叠加在静止值 `rest` 上
    pub fn value_at(&self, rest: f32, progress: f32) -> f32 {
        rest + self.displacement * progress.clamp(0.0, 1.0)
    }
}

/// 视差绑定结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParallaxBinding {
    /// 跟随滚动
    Tracking(ParallaxMapping),
    /// 减少动态效果时完全禁用（视差没有"瞬时"版本）
    Disabled,
}

/// 构造视差映射
pub fn parallax(env: &dyn Environment, options: &Parallax) -> ParallaxBinding {
    if policy::reduced_motion(env) {
        return ParallaxBinding::Disabled;
    }

    ParallaxBinding::Tracking(ParallaxMapping {
        property: options.resolved_axis().property(),
        displacement: options.speed * 100.0,
        start: options.start,
        end: options.end,
    })
}

/// 动画种类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationKind {
    FadeUp(FadeInUp),
    FadeScale(FadeInScale),
    Stagger(StaggerChildren),
    Parallax(Parallax),
}

/// 解析后的规范动画
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAnimation {
    /// 单个元素、单次播放
    Single(AnimationIntent),
    /// 一组元素，按顺序对应
    Group(Vec<AnimationIntent>),
    /// 随滚动连续变化
    Continuous(ParallaxBinding),
}

impl AnimationKind {
    /// 覆盖名义时长（视差没有时长，忽略）
    pub fn set_duration(&mut self, duration: f32) {
        match self {
            AnimationKind::FadeUp(options) => options.duration = duration,
            AnimationKind::FadeScale(options) => options.duration = duration,
            AnimationKind::Stagger(options) => options.duration = duration,
            AnimationKind::Parallax(_) => {}
        }
    }

    /// 解析为规范动画
    ///
    /// `target_count` 只对错峰动画有意义。
    pub fn resolve(&self, env: &dyn Environment, target_count: usize) -> ResolvedAnimation {
        match self {
            AnimationKind::FadeUp(options) => ResolvedAnimation::Single(fade_in_up(env, options)),
            AnimationKind::FadeScale(options) => {
                ResolvedAnimation::Single(fade_in_scale(env, options))
            }
            AnimationKind::Stagger(options) => {
                ResolvedAnimation::Group(stagger_children(env, options, target_count))
            }
            AnimationKind::Parallax(options) => {
                ResolvedAnimation::Continuous(parallax(env, options))
            }
        }
    }
}
