//! # Scroll 模块
//!
//! 命令式平滑滚动。
//!
//! ## 设计说明
//!
//! - 目标可以是选择器、元素或绝对偏移；元素优先转换为稳定选择器（`#id`，否则第一个 class），
//!   都没有时直接追踪元素本身
//! - 每帧重新解析目标位置，布局变化后依然落在正确位置；直接追踪的元素若中途卸载，滚动停止
//! - 新请求替换正在进行的滚动
//! - 减少动态效果时立即跳到目的地
//! - 目的地截断到 `[0, max_scroll_y]`

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::easing::EasingFunction;
use crate::element::{Element, ElementRef};
use crate::policy::{self, Environment};
use crate::timing::resolve_duration;

/// 可滚动的宿主（文档 / 窗口）
pub trait ScrollHost {
    /// 当前纵向滚动偏移
    fn scroll_y(&self) -> f32;

    /// 设置纵向滚动偏移
    fn set_scroll_y(&self, y: f32);

    /// 最大滚动偏移
    fn max_scroll_y(&self) -> f32 {
        f32::INFINITY
    }

    /// 按选择器查找第一个匹配元素
    fn query_selector(&self, selector: &str) -> Option<Rc<dyn Element>>;
}

/// 滚动目标
#[derive(Clone)]
pub enum ScrollTarget {
    /// CSS 选择器（`#id` / `.class`）
    Selector(String),
    /// 元素
    Element(Rc<dyn Element>),
    /// 绝对偏移
    Offset(f32),
}

impl fmt::Debug for ScrollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollTarget::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
            ScrollTarget::Element(element) => f.debug_tuple("Element").field(&element.id()).finish(),
            ScrollTarget::Offset(offset) => f.debug_tuple("Offset").field(offset).finish(),
        }
    }
}

impl From<&str> for ScrollTarget {
    fn from(selector: &str) -> Self {
        ScrollTarget::Selector(selector.to_string())
    }
}

impl From<f32> for ScrollTarget {
    fn from(offset: f32) -> Self {
        ScrollTarget::Offset(offset)
    }
}

/// 滚动默认值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// `scroll_to` / `scroll_to_top` 默认时长（秒）
    #[serde(default = "default_duration")]
    pub duration: f32,

    /// `scroll_by` 默认时长（秒）
    #[serde(default = "default_by_duration")]
    pub by_duration: f32,

    #[serde(default = "default_ease")]
    pub ease: EasingFunction,
}

fn default_duration() -> f32 {
    1.0
}

fn default_by_duration() -> f32 {
    0.5
}

fn default_ease() -> EasingFunction {
    EasingFunction::Power2InOut
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            by_duration: default_by_duration(),
            ease: default_ease(),
        }
    }
}

/// 单次滚动选项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollOptions {
    /// 目的地上方保留的距离（例如固定导航栏高度）
    pub offset: f32,
    pub duration: f32,
    pub ease: EasingFunction,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        ScrollConfig::default().options()
    }
}

impl ScrollOptions {
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }
}

impl ScrollConfig {
    /// 默认的单次选项
    pub fn options(&self) -> ScrollOptions {
        ScrollOptions {
            offset: 0.0,
            duration: self.duration,
            ease: self.ease,
        }
    }
}

/// 元素的稳定选择器：`#id`，否则第一个 class
pub fn stable_selector(element: &dyn Element) -> Option<String> {
    if let Some(id) = element.id().filter(|id| !id.is_empty()) {
        return Some(format!("#{id}"));
    }
    element
        .class_list()
        .into_iter()
        .find(|class| !class.is_empty())
        .map(|class| format!(".{class}"))
}

enum Destination {
    Selector(String),
    Direct(ElementRef),
    Absolute(f32),
}

impl Destination {
    fn from_target(target: ScrollTarget) -> Self {
        match target {
            ScrollTarget::Selector(selector) => Destination::Selector(selector),
            ScrollTarget::Element(element) => match stable_selector(element.as_ref()) {
                Some(selector) => Destination::Selector(selector),
                None => Destination::Direct(Rc::downgrade(&element)),
            },
            ScrollTarget::Offset(y) => Destination::Absolute(y),
        }
    }

    /// 未偏移的目标位置（文档坐标）
    fn resolve(&self, host: &dyn ScrollHost) -> Option<f32> {
        match self {
            Destination::Selector(selector) => host
                .query_selector(selector)
                .and_then(|element| element.bounds())
                .map(|rect| rect.top()),
            Destination::Direct(element) => element
                .upgrade()
                .and_then(|element| element.bounds())
                .map(|rect| rect.top()),
            Destination::Absolute(y) => Some(*y),
        }
    }
}

struct ScrollTween {
    destination: Destination,
    offset: f32,
    from: f32,
    duration: f32,
    ease: EasingFunction,
    elapsed: f32,
}

fn clamp_scroll(host: &dyn ScrollHost, y: f32) -> f32 {
    y.min(host.max_scroll_y()).max(0.0)
}

/// 平滑滚动器
pub struct SmoothScroller {
    env: Rc<dyn Environment>,
    config: ScrollConfig,
    active: Option<ScrollTween>,
}

impl fmt::Debug for SmoothScroller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmoothScroller")
            .field("config", &self.config)
            .field("scrolling", &self.is_scrolling())
            .finish()
    }
}

impl SmoothScroller {
    pub fn new(env: Rc<dyn Environment>, config: ScrollConfig) -> Self {
        Self {
            env,
            config,
            active: None,
        }
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// 滚动到目标
    ///
    /// # 返回
    /// 目标能否解析（不能解析时不做任何事）
    pub fn scroll_to(
        &mut self,
        host: &dyn ScrollHost,
        target: ScrollTarget,
        options: ScrollOptions,
    ) -> bool {
        let destination = Destination::from_target(target);
        let Some(position) = destination.resolve(host) else {
            debug!("滚动目标无法解析，忽略");
            return false;
        };

        let duration = resolve_duration(self.env.as_ref(), options.duration);
        if policy::reduced_motion(self.env.as_ref()) || duration <= 0.0 {
            self.active = None;
            host.set_scroll_y(clamp_scroll(host, position - options.offset));
            return true;
        }

        if self.active.is_some() {
            debug!("新的滚动请求替换进行中的滚动");
        }
        self.active = Some(ScrollTween {
            destination,
            offset: options.offset,
            from: host.scroll_y(),
            duration,
            ease: options.ease,
            elapsed: 0.0,
        });
        true
    }

    /// 滚动到顶部
    pub fn scroll_to_top(&mut self, host: &dyn ScrollHost, duration: Option<f32>) {
        let options = ScrollOptions {
            duration: duration.unwrap_or(self.config.duration),
            ..self.config.options()
        };
        self.scroll_to(host, ScrollTarget::Offset(0.0), options);
    }

    /// 相对当前位置滚动
    pub fn scroll_by(&mut self, host: &dyn ScrollHost, amount: f32, duration: Option<f32>) {
        let options = ScrollOptions {
            duration: duration.unwrap_or(self.config.by_duration),
            ..self.config.options()
        };
        self.scroll_to(host, ScrollTarget::Offset(host.scroll_y() + amount), options);
    }

    /// 推进一帧
    ///
    /// # 返回
    /// 是否仍在滚动
    pub fn tick(&mut self, host: &dyn ScrollHost, dt: f32) -> bool {
        let Some(tween) = self.active.as_mut() else {
            return false;
        };

        let Some(position) = tween.destination.resolve(host) else {
            debug!("滚动目标已卸载，停止滚动");
            self.active = None;
            return false;
        };

        tween.elapsed += dt;
        let progress = (tween.elapsed / tween.duration).min(1.0);
        let to = clamp_scroll(host, position - tween.offset);
        host.set_scroll_y(tween.from + (to - tween.from) * tween.ease.apply(progress));

        if progress >= 1.0 {
            self.active = None;
            false
        } else {
            true
        }
    }

    pub fn is_scrolling(&self) -> bool {
        self.active.is_some()
    }

    /// 停止滚动，停留在当前位置
    pub fn cancel(&mut self) {
        self.active = None;
    }
}
