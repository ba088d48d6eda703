//! # Scenario 模块
//!
//! 场景文件：描述一个页面（元素、动画绑定）以及按时间顺序执行的操作步骤。
//!
//! ## 格式
//!
//! ```json
//! {
//!   "name": "landing",
//!   "viewport": { "width": 1440, "height": 900 },
//!   "elements": [
//!     { "id": "hero", "rect": { "x": 0, "y": 120, "width": 1440, "height": 600 } }
//!   ],
//!   "animations": [
//!     { "targets": ["hero"], "kind": { "type": "fade_up" } }
//!   ],
//!   "steps": [
//!     { "action": "wait", "seconds": 1.0 },
//!     { "action": "scroll", "to": 800 }
//!   ]
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use motion_core::{AnimationKind, DurationPreset, Rect, ViewportCondition};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 场景错误
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("无法读取场景文件: {0}")]
    Io(#[from] std::io::Error),

    #[error("场景文件格式错误: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("元素 id 重复: '{0}'")]
    DuplicateElement(String),

    #[error("{context} 引用了未知元素 '{id}'")]
    UnknownElement { context: String, id: String },

    #[error("步骤 {step} 引用了不存在的动画 #{index}")]
    UnknownAnimation { step: usize, index: usize },

    #[error("场景无效: {0}")]
    Invalid(String),
}

/// 场景描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,

    pub viewport: ViewportSpec,

    /// 文档总高度
    #[serde(default = "default_content_height")]
    pub content_height: f32,

    /// 初始的"减少动态效果"设置
    #[serde(default)]
    pub reduced_motion: bool,

    /// 模拟帧率
    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default)]
    pub elements: Vec<ElementSpec>,

    #[serde(default)]
    pub animations: Vec<AnimationSpec>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_content_height() -> f32 {
    4000.0
}

fn default_fps() -> u32 {
    60
}

/// 视口尺寸
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViewportSpec {
    pub width: f32,
    pub height: f32,
}

/// 页面元素
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSpec {
    pub id: String,

    #[serde(default)]
    pub classes: Vec<String>,

    /// 文档坐标中的包围盒
    pub rect: Rect,

    /// 光标标签（写入标签属性）
    #[serde(default)]
    pub cursor_label: Option<String>,

    /// 父元素 id（必须先声明）
    #[serde(default)]
    pub parent: Option<String>,
}

/// 动画绑定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationSpec {
    /// 目标元素 id（按顺序）
    pub targets: Vec<String>,

    pub kind: AnimationKind,

    /// 触发条件；缺省时使用配置中的默认值
    #[serde(default)]
    pub trigger: Option<ViewportCondition>,

    /// 以具名时长覆盖动画时长
    #[serde(default)]
    pub duration: Option<DurationPreset>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// 操作步骤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// 推进时间
    Wait { seconds: f32 },
    /// 用户直接滚动到某处
    Scroll { to: f32 },
    /// 平滑滚动到选择器
    ScrollTo {
        target: String,
        #[serde(default)]
        offset: f32,
    },
    /// 平滑滚动一段距离
    ScrollBy { amount: f32 },
    /// 平滑滚动到顶部
    ScrollToTop,
    /// 指针移动
    PointerMove { x: f32, y: f32 },
    /// 指针移入元素；`None` 表示移到页面空白处
    Hover { element: Option<String> },
    /// 指针离开页面
    PointerLeave,
    /// 切换系统设置
    SetReducedMotion { enabled: bool },
    /// 以新的动画种类重新绑定
    Rebind { animation: usize, kind: AnimationKind },
    /// 卸载绑定；`None` 表示卸载整个页面
    Unmount { animation: Option<usize> },
}

impl Scenario {
    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// 从 JSON 文本解析并验证
    pub fn from_json(content: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_json::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// 帧间隔（秒）
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.fps as f32
    }

    /// 验证引用完整性
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.fps == 0 || self.fps > 1000 {
            return Err(ScenarioError::Invalid(format!(
                "fps 必须在 1 - 1000 之间: {}",
                self.fps
            )));
        }
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(ScenarioError::Invalid("视口尺寸必须大于 0".to_string()));
        }

        let mut declared = BTreeSet::new();
        for element in &self.elements {
            if let Some(parent) = &element.parent
                && !declared.contains(parent.as_str())
            {
                return Err(ScenarioError::UnknownElement {
                    context: format!("元素 '{}' 的 parent", element.id),
                    id: parent.clone(),
                });
            }
            if !declared.insert(element.id.as_str()) {
                return Err(ScenarioError::DuplicateElement(element.id.clone()));
            }
        }

        for (index, animation) in self.animations.iter().enumerate() {
            for target in &animation.targets {
                if !declared.contains(target.as_str()) {
                    return Err(ScenarioError::UnknownElement {
                        context: format!("动画 #{index}"),
                        id: target.clone(),
                    });
                }
            }
        }

        for (step_index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Wait { seconds } if seconds.is_nan() || *seconds < 0.0 => {
                    return Err(ScenarioError::Invalid(format!(
                        "步骤 {step_index} 的等待时间无效: {seconds}"
                    )));
                }
                Step::Hover {
                    element: Some(id),
                } if !declared.contains(id.as_str()) => {
                    return Err(ScenarioError::UnknownElement {
                        context: format!("步骤 {step_index}"),
                        id: id.clone(),
                    });
                }
                Step::Rebind { animation, .. }
                | Step::Unmount {
                    animation: Some(animation),
                } if *animation >= self.animations.len() => {
                    return Err(ScenarioError::UnknownAnimation {
                        step: step_index,
                        index: *animation,
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }
}
