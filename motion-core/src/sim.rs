//! # Sim 模块
//!
//! 无头实现：内存中的元素、环境、文档与文字测量。
//!
//! 用于测试与命令行宿主，行为尽量贴近浏览器：
//! 元素属性未设置时读取为 `None`，滚动偏移截断到文档范围内。

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::cursor::{DomNode, NodeKey, TextMeasurer};
use crate::element::Element;
use crate::geometry::{Rect, Viewport};
use crate::intent::{Property, PropertyMap};
use crate::policy::Environment;
use crate::scroll::ScrollHost;

/// 内存中的元素
#[derive(Debug, Default)]
pub struct SimElement {
    id: Option<String>,
    classes: Vec<String>,
    bounds: Cell<Option<Rect>>,
    props: RefCell<PropertyMap>,
    will_change: Cell<bool>,
}

impl SimElement {
    /// 创建已挂载的元素
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds: Cell::new(Some(bounds)),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        self.classes = classes.iter().map(|c| c.to_string()).collect();
        self
    }

    /// 属性值（未设置时为静止值）
    pub fn value(&self, property: Property) -> f32 {
        self.props
            .borrow()
            .get(&property)
            .copied()
            .unwrap_or_else(|| property.rest_value())
    }

    /// 已写入的全部属性
    pub fn properties(&self) -> PropertyMap {
        self.props.borrow().clone()
    }

    /// 从文档中移除
    pub fn detach(&self) {
        self.bounds.set(None);
    }

    /// 挂载（或移动）到新位置
    pub fn set_bounds(&self, bounds: Rect) {
        self.bounds.set(Some(bounds));
    }

    /// 是否带有合成层提示
    pub fn will_change(&self) -> bool {
        self.will_change.get()
    }
}

impl Element for SimElement {
    fn get_property(&self, property: Property) -> Option<f32> {
        self.props.borrow().get(&property).copied()
    }

    fn set_property(&self, property: Property, value: f32) -> bool {
        self.props.borrow_mut().insert(property, value);
        true
    }

    fn bounds(&self) -> Option<Rect> {
        self.bounds.get()
    }

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn class_list(&self) -> Vec<String> {
        self.classes.clone()
    }

    fn set_will_change(&self, active: bool) {
        self.will_change.set(active);
    }
}

/// 可在运行中修改的环境
#[derive(Debug)]
pub struct SimEnvironment {
    browsing_context: Cell<bool>,
    reduced_motion: Cell<bool>,
    viewport_width: Cell<f32>,
}

impl SimEnvironment {
    /// 浏览器环境
    pub fn browser(viewport_width: f32) -> Self {
        Self {
            browsing_context: Cell::new(true),
            reduced_motion: Cell::new(false),
            viewport_width: Cell::new(viewport_width),
        }
    }

    /// 无浏览上下文（预渲染）
    pub fn headless() -> Self {
        Self {
            browsing_context: Cell::new(false),
            reduced_motion: Cell::new(false),
            viewport_width: Cell::new(0.0),
        }
    }

    /// 切换系统"减少动态效果"设置
    pub fn set_reduced_motion(&self, reduced: bool) {
        self.reduced_motion.set(reduced);
    }

    pub fn set_viewport_width(&self, width: f32) {
        self.viewport_width.set(width);
    }
}

impl Environment for SimEnvironment {
    fn has_browsing_context(&self) -> bool {
        self.browsing_context.get()
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion.get()
    }

    fn viewport_width(&self) -> f32 {
        self.viewport_width.get()
    }
}

/// 内存中的文档：元素集合 + 滚动状态
#[derive(Debug)]
pub struct SimDocument {
    viewport: Cell<Viewport>,
    content_height: f32,
    elements: RefCell<Vec<Rc<SimElement>>>,
}

impl SimDocument {
    pub fn new(viewport: Viewport, content_height: f32) -> Self {
        Self {
            viewport: Cell::new(viewport),
            content_height,
            elements: RefCell::new(Vec::new()),
        }
    }

    /// 添加元素
    pub fn add(&self, element: Rc<SimElement>) {
        self.elements.borrow_mut().push(element);
    }

    /// 当前视口（含滚动偏移）
    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    /// 按 id 查找
    pub fn element_by_id(&self, id: &str) -> Option<Rc<SimElement>> {
        self.elements
            .borrow()
            .iter()
            .find(|e| e.id.as_deref() == Some(id))
            .cloned()
    }

    fn matches(element: &SimElement, selector: &str) -> bool {
        if let Some(id) = selector.strip_prefix('#') {
            element.id.as_deref() == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            element.classes.iter().any(|c| c == class)
        } else {
            false
        }
    }
}

impl ScrollHost for SimDocument {
    fn scroll_y(&self) -> f32 {
        self.viewport.get().scroll_y
    }

    fn set_scroll_y(&self, y: f32) {
        let y = y.min(self.max_scroll_y()).max(0.0);
        self.viewport.set(self.viewport.get().with_scroll_y(y));
    }

    fn max_scroll_y(&self) -> f32 {
        (self.content_height - self.viewport.get().height).max(0.0)
    }

    fn query_selector(&self, selector: &str) -> Option<Rc<dyn Element>> {
        self.elements
            .borrow()
            .iter()
            .find(|e| e.is_attached() && Self::matches(e, selector))
            .map(|e| e.clone() as Rc<dyn Element>)
    }
}

/// 内存中的文档节点
#[derive(Debug)]
pub struct SimNode {
    key: NodeKey,
    attributes: RefCell<BTreeMap<String, String>>,
    parent: Option<Rc<SimNode>>,
}

impl SimNode {
    pub fn root(key: u64) -> Rc<Self> {
        Rc::new(Self {
            key: NodeKey(key),
            attributes: RefCell::new(BTreeMap::new()),
            parent: None,
        })
    }

    pub fn child(key: u64, parent: &Rc<SimNode>) -> Rc<Self> {
        Rc::new(Self {
            key: NodeKey(key),
            attributes: RefCell::new(BTreeMap::new()),
            parent: Some(parent.clone()),
        })
    }

    pub fn with_attribute(self: Rc<Self>, name: &str, value: &str) -> Rc<Self> {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn into_node(self: Rc<Self>) -> Rc<dyn DomNode> {
        self
    }
}

impl DomNode for SimNode {
    fn key(&self) -> NodeKey {
        self.key
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn parent(&self) -> Option<Rc<dyn DomNode>> {
        self.parent.clone().map(|p| p as Rc<dyn DomNode>)
    }
}

/// 等宽文字测量
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthMeasurer {
    pub char_width: f32,
}

impl FixedWidthMeasurer {
    pub fn new(char_width: f32) -> Self {
        Self { char_width }
    }
}

impl TextMeasurer for FixedWidthMeasurer {
    fn measure(&self, text: &str) -> Option<f32> {
        Some(text.chars().count() as f32 * self.char_width)
    }
}
