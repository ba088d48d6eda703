//! # Trigger 模块
//!
//! 视口触发条件。
//!
//! 触发位置写作 `"<元素边> <视口边>"`，例如 `"top 80%"` 表示
//! "元素顶边到达视口顶部往下 80% 处"。每个边可以是 `top` / `center` / `bottom`、
//! 百分比（`80%`）或像素（`120px`）。
//!
//! 所有判断都换算成"滚动偏移"：位置被越过当且仅当 `scroll_y >= scroll_offset`。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::geometry::{Rect, Viewport};

/// 边上的偏移点
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeOffset {
    Top,
    Center,
    Bottom,
    /// 百分比（0 - 100）
    Percent(f32),
    /// 像素
    Pixels(f32),
}

impl EdgeOffset {
    /// 在长度为 `length` 的区间内的偏移
    pub fn resolve(&self, length: f32) -> f32 {
        match self {
            EdgeOffset::Top => 0.0,
            EdgeOffset::Center => length / 2.0,
            EdgeOffset::Bottom => length,
            EdgeOffset::Percent(p) => length * p / 100.0,
            EdgeOffset::Pixels(px) => *px,
        }
    }

    fn parse_token(token: &str, input: &str) -> Result<Self, ParseError> {
        let invalid = |message: String| ParseError::InvalidTriggerPosition {
            input: input.to_string(),
            message,
        };

        match token {
            "top" => Ok(EdgeOffset::Top),
            "center" => Ok(EdgeOffset::Center),
            "bottom" => Ok(EdgeOffset::Bottom),
            _ => {
                if let Some(number) = token.strip_suffix('%') {
                    number
                        .parse::<f32>()
                        .map(EdgeOffset::Percent)
                        .map_err(|_| invalid(format!("无效的百分比 '{token}'")))
                } else if let Some(number) = token.strip_suffix("px") {
                    number
                        .parse::<f32>()
                        .map(EdgeOffset::Pixels)
                        .map_err(|_| invalid(format!("无效的像素值 '{token}'")))
                } else {
                    Err(invalid(format!("未知的位置关键字 '{token}'")))
                }
            }
        }
    }
}

impl fmt::Display for EdgeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeOffset::Top => f.write_str("top"),
            EdgeOffset::Center => f.write_str("center"),
            EdgeOffset::Bottom => f.write_str("bottom"),
            EdgeOffset::Percent(p) => write!(f, "{p}%"),
            EdgeOffset::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

/// 触发位置：元素上的点与视口上的点重合的时刻
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerPosition {
    pub element: EdgeOffset,
    pub viewport: EdgeOffset,
}

impl TriggerPosition {
    pub const fn new(element: EdgeOffset, viewport: EdgeOffset) -> Self {
        Self { element, viewport }
    }

    /// 到达该位置时的纵向滚动偏移
    pub fn scroll_offset(&self, rect: &Rect, viewport_height: f32) -> f32 {
        rect.top() + self.element.resolve(rect.height) - self.viewport.resolve(viewport_height)
    }

    /// 当前滚动是否已越过该位置
    pub fn is_passed(&self, rect: &Rect, viewport: &Viewport) -> bool {
        viewport.scroll_y >= self.scroll_offset(rect, viewport.height)
    }
}

impl FromStr for TriggerPosition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        match tokens.as_slice() {
            [element, viewport] => Ok(Self {
                element: EdgeOffset::parse_token(element, s)?,
                viewport: EdgeOffset::parse_token(viewport, s)?,
            }),
            _ => Err(ParseError::InvalidTriggerPosition {
                input: s.to_string(),
                message: "需要两个部分：<元素边> <视口边>".to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TriggerPosition {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TriggerPosition> for String {
    fn from(position: TriggerPosition) -> Self {
        position.to_string()
    }
}

impl fmt::Display for TriggerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

/// 视口触发条件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportCondition {
    /// 开始位置
    #[serde(default = "default_start")]
    pub start: TriggerPosition,

    /// 结束位置
    #[serde(default = "default_end")]
    pub end: TriggerPosition,

    /// 只触发一次
    #[serde(default = "default_once")]
    pub once: bool,
}

fn default_start() -> TriggerPosition {
    TriggerPosition::new(EdgeOffset::Top, EdgeOffset::Percent(80.0))
}

fn default_end() -> TriggerPosition {
    TriggerPosition::new(EdgeOffset::Bottom, EdgeOffset::Percent(20.0))
}

fn default_once() -> bool {
    true
}

impl Default for ViewportCondition {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            once: default_once(),
        }
    }
}

impl ViewportCondition {
    /// 允许离开后重新触发
    pub fn repeating(mut self) -> Self {
        self.once = false;
        self
    }

    /// 条件是否满足（开始位置已越过）
    pub fn is_met(&self, rect: &Rect, viewport: &Viewport) -> bool {
        self.start.is_passed(rect, viewport)
    }

    /// 区间 `[start, end]` 内的滚动进度（0.0 - 1.0）
    pub fn progress(&self, rect: &Rect, viewport: &Viewport) -> f32 {
        scroll_progress(&self.start, &self.end, rect, viewport)
    }
}

/// 两个触发位置之间的滚动进度
pub fn scroll_progress(
    start: &TriggerPosition,
    end: &TriggerPosition,
    rect: &Rect,
    viewport: &Viewport,
) -> f32 {
    let from = start.scroll_offset(rect, viewport.height);
    let to = end.scroll_offset(rect, viewport.height);
    let span = to - from;
    if span <= 0.0 {
        return if viewport.scroll_y >= from { 1.0 } else { 0.0 };
    }
    ((viewport.scroll_y - from) / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positions() {
        let pos: TriggerPosition = "top 80%".parse().unwrap();
        assert_eq!(pos.element, EdgeOffset::Top);
        assert_eq!(pos.viewport, EdgeOffset::Percent(80.0));

        let pos: TriggerPosition = "center 120px".parse().unwrap();
        assert_eq!(pos.element, EdgeOffset::Center);
        assert_eq!(pos.viewport, EdgeOffset::Pixels(120.0));

        assert_eq!("bottom top".parse::<TriggerPosition>().unwrap().to_string(), "bottom top");
    }

    #[test]
    fn test_parse_errors() {
        assert!("top".parse::<TriggerPosition>().is_err());
        assert!("top middle".parse::<TriggerPosition>().is_err());
        assert!("top abc%".parse::<TriggerPosition>().is_err());
        assert!("top 80% extra".parse::<TriggerPosition>().is_err());
    }

    #[test]
    fn test_default_condition_fires_at_80_percent() {
        let condition = ViewportCondition::default();
        let rect = Rect::new(0.0, 1000.0, 400.0, 200.0);
        let viewport = Viewport::new(1280.0, 800.0);

        // 元素顶边在视口 1000px 处，尚未到达 640px
        assert!(!condition.is_met(&rect, &viewport));
        // 滚动 359px：顶边在 641px
        assert!(!condition.is_met(&rect, &viewport.with_scroll_y(359.0)));
        // 滚动 360px：顶边正好在 640px
        assert!(condition.is_met(&rect, &viewport.with_scroll_y(360.0)));
    }

    #[test]
    fn test_scroll_progress() {
        // 视差常用区间：元素顶边到达视口底部 → 元素底边到达视口顶部
        let start: TriggerPosition = "top bottom".parse().unwrap();
        let end: TriggerPosition = "bottom top".parse().unwrap();
        let rect = Rect::new(0.0, 1000.0, 400.0, 200.0);
        let viewport = Viewport::new(1280.0, 800.0);

        // start = 1000 - 800 = 200, end = 1200
        assert_eq!(scroll_progress(&start, &end, &rect, &viewport.with_scroll_y(0.0)), 0.0);
        assert_eq!(scroll_progress(&start, &end, &rect, &viewport.with_scroll_y(700.0)), 0.5);
        assert_eq!(scroll_progress(&start, &end, &rect, &viewport.with_scroll_y(5000.0)), 1.0);
    }

    #[test]
    fn test_condition_serde() {
        let condition: ViewportCondition =
            serde_json::from_str(r#"{"start": "top bottom", "once": false}"#).unwrap();
        assert_eq!(condition.start.to_string(), "top bottom");
        assert_eq!(condition.end, default_end());
        assert!(!condition.once);

        let bad = serde_json::from_str::<ViewportCondition>(r#"{"start": "nowhere"}"#);
        assert!(bad.is_err());
    }
}
