//! # Geometry 模块
//!
//! 位置、矩形与视口。
//!
//! 元素的 `Rect` 使用**文档坐标**（不随滚动变化），
//! 视口相关的判断通过 `Viewport` 的滚动偏移换算。

use serde::{Deserialize, Serialize};

/// 二维向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// 创建新的向量
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 线性插值
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// 轴对齐矩形
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// 矩形中心
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// 平移
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// 视口
///
/// `scroll_x` / `scroll_y` 为文档滚动偏移。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub scroll_x: f32,
    #[serde(default)]
    pub scroll_y: f32,
}

impl Viewport {
    /// 创建未滚动的视口
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// 设置纵向滚动偏移
    pub fn with_scroll_y(mut self, scroll_y: f32) -> Self {
        self.scroll_y = scroll_y;
        self
    }

    /// 将文档坐标矩形换算为视口坐标
    pub fn to_viewport(&self, rect: &Rect) -> Rect {
        rect.translated(-self.scroll_x, -self.scroll_y)
    }
}

/// 元素相对视口的位置信息
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementPosition {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub width: f32,
    pub height: f32,
    pub center_x: f32,
    pub center_y: f32,
}

/// 计算元素相对视口的位置
pub fn element_position(rect: &Rect, viewport: &Viewport) -> ElementPosition {
    let r = viewport.to_viewport(rect);
    ElementPosition {
        top: r.top(),
        left: r.left(),
        bottom: r.bottom(),
        right: r.right(),
        width: r.width,
        height: r.height,
        center_x: r.left() + r.width / 2.0,
        center_y: r.top() + r.height / 2.0,
    }
}

/// 元素是否在视口内
///
/// `threshold` 为允许超出视口的比例（相对元素自身尺寸），默认使用 0.1。
pub fn is_in_viewport(rect: &Rect, viewport: &Viewport, threshold: f32) -> bool {
    let r = viewport.to_viewport(rect);
    r.top() >= -r.height * threshold
        && r.left() >= -r.width * threshold
        && r.bottom() <= viewport.height + r.height * threshold
        && r.right() <= viewport.width + r.width * threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_lerp() {
        let a = Vec2::new(0.0, 10.0);
        let b = Vec2::new(10.0, 20.0);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(5.0, 15.0));
    }

    #[test]
    fn test_element_position_follows_scroll() {
        let rect = Rect::new(10.0, 500.0, 100.0, 50.0);
        let viewport = Viewport::new(800.0, 600.0).with_scroll_y(200.0);

        let pos = element_position(&rect, &viewport);
        assert_eq!(pos.top, 300.0);
        assert_eq!(pos.bottom, 350.0);
        assert_eq!(pos.center_x, 60.0);
        assert_eq!(pos.center_y, 325.0);
    }

    #[test]
    fn test_is_in_viewport() {
        let viewport = Viewport::new(800.0, 600.0);

        assert!(is_in_viewport(&Rect::new(0.0, 100.0, 100.0, 100.0), &viewport, 0.1));
        // 下方超出太多
        assert!(!is_in_viewport(&Rect::new(0.0, 580.0, 100.0, 100.0), &viewport, 0.1));
        // 在阈值范围内
        assert!(is_in_viewport(&Rect::new(0.0, 505.0, 100.0, 100.0), &viewport, 0.1));
    }
}
