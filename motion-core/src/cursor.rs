//! # Cursor 模块
//!
//! 跟随指针的指示器：空闲时是小圆点，悬停在带标签的元素上时变成文字胶囊。
//!
//! ## 状态机
//!
//! ```text
//!          pointer_over(标签)            measure()
//! Idle ─────────────────────► Pending ───────────► Shown
//!  ▲                                                 │
//!  └───────────── pointer_out(未进入其他标签) ───────┘
//! ```
//!
//! ## 设计说明
//!
//! - 两阶段提交：新标签先作为 `pending_label` 不可见地测量宽度，测量完成后才提升为
//!   `hover_label` 并显示，胶囊不会先以错误宽度闪现
//! - 可见文字只来自 `hover_label`；在相邻标签之间移动时，旧标签保持显示直到新标签
//!   测量完成，中间不会出现空闲帧
//! - 目标尺寸是状态的纯函数；位置与尺寸都通过弹簧逼近目标，从不瞬移
//! - 空字符串标签被忽略，测量失败按零宽处理（胶囊收缩到最小宽度）

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::geometry::Vec2;
use crate::pointer::{PointerEvent, PointerHub, PointerListener, Subscription};
use crate::spring::{Spring, SpringConfig};

/// 文档节点标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// 指针事件的目标节点
pub trait DomNode {
    /// 节点标识（用于比较）
    fn key(&self) -> NodeKey;

    /// 读取属性
    fn attribute(&self, name: &str) -> Option<String>;

    /// 父节点
    fn parent(&self) -> Option<Rc<dyn DomNode>>;
}

/// 带标签属性的祖先节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledNode {
    pub key: NodeKey,
    pub label: String,
}

/// 从 `node` 自身开始向上查找第一个带 `attribute` 的节点
pub fn closest_labeled(node: &Rc<dyn DomNode>, attribute: &str) -> Option<LabeledNode> {
    let mut current = Some(node.clone());
    while let Some(node) = current {
        if let Some(label) = node.attribute(attribute) {
            return Some(LabeledNode {
                key: node.key(),
                label,
            });
        }
        current = node.parent();
    }
    None
}

/// 文字宽度测量
pub trait TextMeasurer {
    /// 渲染后的文字宽度；无法测量时返回 `None`
    fn measure(&self, text: &str) -> Option<f32>;
}

/// 指示器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorConfig {
    /// 空闲圆点直径
    #[serde(default = "default_circle_size")]
    pub circle_size: f32,

    /// 胶囊高度
    #[serde(default = "default_pill_height")]
    pub pill_height: f32,

    /// 胶囊水平内边距（单侧）
    #[serde(default = "default_padding_x")]
    pub padding_x: f32,

    /// 胶囊最小宽度
    #[serde(default = "default_min_pill_width")]
    pub min_pill_width: f32,

    /// 标签属性名
    #[serde(default = "default_label_attribute")]
    pub label_attribute: String,

    /// 位置与尺寸的弹簧参数
    #[serde(default)]
    pub spring: SpringConfig,
}

fn default_circle_size() -> f32 {
    16.0
}

fn default_pill_height() -> f32 {
    40.0
}

fn default_padding_x() -> f32 {
    16.0
}

fn default_min_pill_width() -> f32 {
    40.0
}

fn default_label_attribute() -> String {
    "data-cursor-text".to_string()
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            circle_size: default_circle_size(),
            pill_height: default_pill_height(),
            padding_x: default_padding_x(),
            min_pill_width: default_min_pill_width(),
            label_attribute: default_label_attribute(),
            spring: SpringConfig::default(),
        }
    }
}

/// 指示器状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorFollowState {
    /// 指针位置（视口坐标）；指针不在页面内时为 `None`
    pub pointer: Option<Vec2>,
    /// 当前显示的标签
    pub hover_label: Option<String>,
    /// 已收到、尚未测量的标签
    pub pending_label: Option<String>,
    /// 已提交标签的文字宽度
    pub measured_width: f32,
}

/// 可观察的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorPhase {
    /// 指针不在页面内
    Hidden,
    /// 圆点
    Idle,
    /// 正在测量新标签（仍显示圆点）
    Pending,
    /// 显示标签胶囊
    Shown,
}

/// 一帧的渲染结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorFrame {
    pub phase: CursorPhase,
    /// 左上角位置
    pub position: Vec2,
    /// 宽高
    pub size: Vec2,
    /// 可见文字
    pub label: Option<String>,
    /// 不可见地渲染、用于测量的文字
    pub measuring: Option<String>,
}

/// 跟随指针的指示器
pub struct CursorFollow {
    config: CursorConfig,
    state: CursorFollowState,
    x: Spring,
    y: Spring,
    width: Spring,
    height: Spring,
}

impl fmt::Debug for CursorFollow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorFollow")
            .field("state", &self.state)
            .field("phase", &self.phase())
            .finish()
    }
}

impl CursorFollow {
    pub fn new(config: CursorConfig) -> Self {
        let spring = config.spring;
        let circle = config.circle_size;
        Self {
            config,
            state: CursorFollowState::default(),
            x: Spring::new(0.0, spring),
            y: Spring::new(0.0, spring),
            width: Spring::new(circle, spring),
            height: Spring::new(circle, spring),
        }
    }

    /// 挂载到指针事件中心；返回值被 drop 时注销监听
    pub fn mount(hub: &PointerHub, config: CursorConfig) -> MountedCursor {
        let cursor = Rc::new(RefCell::new(Self::new(config)));
        let subscription = hub.subscribe(&cursor);
        MountedCursor {
            cursor,
            _subscription: subscription,
        }
    }

    // ========== 事件 ==========

    /// 指针移动（任何阶段都会更新位置）
    pub fn pointer_move(&mut self, position: Vec2) {
        let first = self.state.pointer.is_none();
        self.state.pointer = Some(position);

        // 首次进入：直接出现在指针处，而不是从原点飞过来
        if first {
            let (width, height) = self.target_box();
            self.x.jump_to(position.x - width / 2.0);
            self.y.jump_to(position.y - height / 2.0);
        }
    }

    /// 指针进入某个节点（冒泡）
    pub fn pointer_over(&mut self, target: &Rc<dyn DomNode>) {
        let Some(labeled) = closest_labeled(target, &self.config.label_attribute) else {
            return;
        };
        if labeled.label.is_empty() {
            return;
        }
        if self.state.pending_label.is_none()
            && self.state.hover_label.as_deref() == Some(labeled.label.as_str())
        {
            return;
        }

        trace!(label = %labeled.label, "等待测量标签");
        self.state.pending_label = Some(labeled.label);
    }

    /// 指针离开某个节点（冒泡），`related` 为即将进入的节点
    pub fn pointer_out(&mut self, target: &Rc<dyn DomNode>, related: Option<&Rc<dyn DomNode>>) {
        let attribute = &self.config.label_attribute;
        let Some(current) = closest_labeled(target, attribute) else {
            return;
        };

        // 进入同一标签元素的子节点，或直接进入另一个标签元素
        let next = related.and_then(|node| closest_labeled(node, attribute));
        let entering_label = next
            .as_ref()
            .is_some_and(|next| next.key == current.key || !next.label.is_empty());
        if entering_label {
            return;
        }

        self.clear_label();
    }

    /// 指针离开页面
    pub fn pointer_left(&mut self) {
        self.state.pointer = None;
        self.clear_label();
    }

    fn clear_label(&mut self) {
        if self.state.hover_label.is_some() || self.state.pending_label.is_some() {
            trace!("清除标签");
        }
        self.state.hover_label = None;
        self.state.pending_label = None;
        self.state.measured_width = 0.0;
    }

    // ========== 帧 ==========

    /// 测量阶段：把待测标签提升为显示标签
    ///
    /// # 返回
    /// 是否提交了新标签
    pub fn measure(&mut self, measurer: &dyn TextMeasurer) -> bool {
        let Some(label) = self.state.pending_label.take() else {
            return false;
        };

        let width = measurer
            .measure(&label)
            .filter(|w| w.is_finite())
            .unwrap_or(0.0)
            .max(0.0);
        self.state.measured_width = width;
        self.state.hover_label = Some(label);
        true
    }

    /// 推进弹簧
    pub fn tick(&mut self, dt: f32) {
        let (width, height) = self.target_box();
        if let Some(pointer) = self.state.pointer {
            self.x.set_target(pointer.x - width / 2.0);
            self.y.set_target(pointer.y - height / 2.0);
        }
        self.width.set_target(width);
        self.height.set_target(height);

        self.x.tick(dt);
        self.y.tick(dt);
        self.width.tick(dt);
        self.height.tick(dt);
    }

    /// 完整的一帧：测量、推进、渲染
    pub fn frame(&mut self, dt: f32, measurer: &dyn TextMeasurer) -> CursorFrame {
        self.measure(measurer);
        self.tick(dt);
        self.render()
    }

    // ========== 查询 ==========

    /// 目标宽高（状态的纯函数）
    pub fn target_box(&self) -> (f32, f32) {
        let config = &self.config;
        if self.state.hover_label.is_some() {
            let width = (self.state.measured_width + config.padding_x * 2.0)
                .max(config.min_pill_width);
            (width, config.pill_height)
        } else {
            (config.circle_size, config.circle_size)
        }
    }

    pub fn phase(&self) -> CursorPhase {
        if self.state.pointer.is_none() {
            CursorPhase::Hidden
        } else if self.state.hover_label.is_some() {
            CursorPhase::Shown
        } else if self.state.pending_label.is_some() {
            CursorPhase::Pending
        } else {
            CursorPhase::Idle
        }
    }

    pub fn render(&self) -> CursorFrame {
        CursorFrame {
            phase: self.phase(),
            position: Vec2::new(self.x.value(), self.y.value()),
            size: Vec2::new(self.width.value(), self.height.value()),
            label: self.state.hover_label.clone(),
            measuring: self.state.pending_label.clone(),
        }
    }

    pub fn state(&self) -> &CursorFollowState {
        &self.state
    }

    pub fn config(&self) -> &CursorConfig {
        &self.config
    }

    /// 位置与尺寸是否都已静止
    pub fn is_settled(&self) -> bool {
        self.x.is_settled()
            && self.y.is_settled()
            && self.width.is_settled()
            && self.height.is_settled()
    }
}

impl PointerListener for CursorFollow {
    fn on_pointer_event(&mut self, event: &PointerEvent) {
        match event {
            PointerEvent::Move(position) => self.pointer_move(*position),
            PointerEvent::Over { target } => self.pointer_over(target),
            PointerEvent::Out { target, related } => self.pointer_out(target, related.as_ref()),
            PointerEvent::Leave => self.pointer_left(),
        }
    }
}

/// 已挂载的指示器
///
/// drop 时注销指针监听。
pub struct MountedCursor {
    cursor: Rc<RefCell<CursorFollow>>,
    _subscription: Subscription,
}

impl MountedCursor {
    pub fn cursor(&self) -> &Rc<RefCell<CursorFollow>> {
        &self.cursor
    }

    /// 推进一帧
    pub fn frame(&self, dt: f32, measurer: &dyn TextMeasurer) -> CursorFrame {
        self.cursor.borrow_mut().frame(dt, measurer)
    }

    /// 卸载
    pub fn unmount(self) {}
}
