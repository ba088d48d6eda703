//! # Element 模块
//!
//! 可动画元素接口。
//!
//! ## 核心概念
//!
//! - 元素由表现层拥有，核心只持有 `Weak` 引用，**从不**取得所有权
//! - 核心只修改元素的表现属性（透明度、位移、缩放、旋转）
//! - `bounds()` 返回 `None` 表示元素尚未挂载到文档

use std::rc::{Rc, Weak};

use crate::geometry::Rect;
use crate::intent::{Property, PropertyMap};

/// 可动画元素接口
///
/// ## 实现示例
///
/// ```rust,ignore
/// struct Card {
///     style: RefCell<CardStyle>,
///     rect: Cell<Option<Rect>>,
/// }
///
/// impl Element for Card {
///     fn get_property(&self, property: Property) -> Option<f32> {
///         let style = self.style.borrow();
///         match property {
///             Property::Opacity => Some(style.opacity),
///             Property::Y => Some(style.translate_y),
///             _ => None,
///         }
///     }
///
///     fn set_property(&self, property: Property, value: f32) -> bool {
///         let mut style = self.style.borrow_mut();
///         match property {
///             Property::Opacity => { style.opacity = value; true }
///             Property::Y => { style.translate_y = value; true }
///             _ => false,
///         }
///     }
///
///     fn bounds(&self) -> Option<Rect> {
///         self.rect.get()
///     }
/// }
/// ```
pub trait Element: 'static {
    /// 获取属性的当前值
    ///
    /// # 返回
    /// - `Some(value)`: 属性存在
    /// - `None`: 元素不支持该属性
    fn get_property(&self, property: Property) -> Option<f32>;

    /// 设置属性的新值
    ///
    /// # 返回
    /// - `true`: 设置成功
    /// - `false`: 元素不支持该属性
    fn set_property(&self, property: Property, value: f32) -> bool;

    /// 元素在文档坐标中的包围盒（未挂载时为 `None`）
    fn bounds(&self) -> Option<Rect>;

    /// 元素是否已挂载
    fn is_attached(&self) -> bool {
        self.bounds().is_some()
    }

    /// 元素 id 属性
    fn id(&self) -> Option<String> {
        None
    }

    /// 元素 class 列表
    fn class_list(&self) -> Vec<String> {
        Vec::new()
    }

    /// 设置 / 清除合成层提示（will-change）
    fn set_will_change(&self, _active: bool) {}
}

/// 元素的非拥有引用
pub type ElementRef = Weak<dyn Element>;

/// 两个引用是否指向同一元素
pub(crate) fn same_element(weak: &ElementRef, element: &Rc<dyn Element>) -> bool {
    std::ptr::addr_eq(weak.as_ptr(), Rc::as_ptr(element))
}

/// 读取元素的属性值，缺失时使用属性静止值
pub fn read_property(element: &dyn Element, property: Property) -> f32 {
    element
        .get_property(property)
        .unwrap_or_else(|| property.rest_value())
}

/// 批量写入属性
pub fn apply_props(element: &dyn Element, props: &PropertyMap) {
    for (property, value) in props {
        element.set_property(*property, *value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimElement;

    #[test]
    fn test_read_property_falls_back_to_rest_value() {
        let element = SimElement::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(read_property(&element, Property::Opacity), 1.0);
        assert_eq!(read_property(&element, Property::Y), 0.0);

        element.set_property(Property::Y, 12.0);
        assert_eq!(read_property(&element, Property::Y), 12.0);
    }

    #[test]
    fn test_apply_props() {
        let element = SimElement::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        apply_props(
            &element,
            &PropertyMap::from([(Property::Opacity, 0.0), (Property::Scale, 0.85)]),
        );

        assert_eq!(element.value(Property::Opacity), 0.0);
        assert_eq!(element.value(Property::Scale), 0.85);
    }

    #[test]
    fn test_same_element() {
        let a: Rc<dyn Element> = Rc::new(SimElement::new(Rect::default()));
        let b: Rc<dyn Element> = Rc::new(SimElement::new(Rect::default()));
        let weak_a = Rc::downgrade(&a);

        assert!(same_element(&weak_a, &a));
        assert!(!same_element(&weak_a, &b));
    }

    #[test]
    fn test_detached_element() {
        let element = SimElement::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(element.is_attached());

        element.detach();
        assert!(!element.is_attached());
    }
}
