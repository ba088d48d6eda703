//! # Pointer 模块
//!
//! 指针事件中心：把全局指针事件分发给订阅者。
//!
//! 订阅返回 [`Subscription`]，被 drop 时自动注销，组件卸载后不会残留监听。
//! 中心只持有监听者的 `Weak` 引用。

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::cursor::DomNode;
use crate::geometry::Vec2;

/// 指针事件
#[derive(Clone)]
pub enum PointerEvent {
    /// 指针移动（视口坐标）
    Move(Vec2),
    /// 指针进入节点（冒泡）
    Over { target: Rc<dyn DomNode> },
    /// 指针离开节点（冒泡），`related` 为即将进入的节点
    Out {
        target: Rc<dyn DomNode>,
        related: Option<Rc<dyn DomNode>>,
    },
    /// 指针离开页面
    Leave,
}

impl fmt::Debug for PointerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerEvent::Move(position) => f.debug_tuple("Move").field(position).finish(),
            PointerEvent::Over { target } => {
                f.debug_struct("Over").field("target", &target.key()).finish()
            }
            PointerEvent::Out { target, related } => f
                .debug_struct("Out")
                .field("target", &target.key())
                .field("related", &related.as_ref().map(|n| n.key()))
                .finish(),
            PointerEvent::Leave => f.write_str("Leave"),
        }
    }
}

/// 指针事件监听者
pub trait PointerListener {
    fn on_pointer_event(&mut self, event: &PointerEvent);
}

struct HubState {
    next_id: u64,
    listeners: Vec<(u64, Weak<RefCell<dyn PointerListener>>)>,
}

/// 指针事件中心
#[derive(Clone)]
pub struct PointerHub {
    inner: Rc<RefCell<HubState>>,
}

impl Default for PointerHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PointerHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl PointerHub {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(HubState {
                next_id: 1,
                listeners: Vec::new(),
            })),
        }
    }

    /// 订阅事件
    pub fn subscribe<L: PointerListener + 'static>(&self, listener: &Rc<RefCell<L>>) -> Subscription {
        let weak = Rc::downgrade(listener);
        let weak: Weak<RefCell<dyn PointerListener>> = weak;
        let mut state = self.inner.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push((id, weak));
        debug!(subscription = id, "指针监听已注册");

        Subscription {
            id,
            hub: Rc::downgrade(&self.inner),
        }
    }

    /// 分发事件
    ///
    /// 分发前先复制监听者列表，监听者可以在回调中注销自身或其他监听者。
    pub fn dispatch(&self, event: &PointerEvent) {
        let listeners: Vec<Rc<RefCell<dyn PointerListener>>> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect();

        for listener in listeners {
            // 正在处理事件的监听者不会重入
            if let Ok(mut listener) = listener.try_borrow_mut() {
                listener.on_pointer_event(event);
            }
        }
    }

    /// 存活的监听者数量
    pub fn listener_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }
}

/// 订阅凭证，drop 时注销
pub struct Subscription {
    id: u64,
    hub: Weak<RefCell<HubState>>,
}

impl Subscription {
    /// 显式注销
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(hub) = self.hub.upgrade() else {
            return;
        };
        if let Ok(mut state) = hub.try_borrow_mut() {
            state.listeners.retain(|(id, _)| *id != self.id);
            debug!(subscription = self.id, "指针监听已注销");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
