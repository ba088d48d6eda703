//! # Motion CLI
//!
//! 无头场景运行器：在内存文档上执行场景文件，输出绑定事件、元素终态与光标状态。
//!
//! ## 模块结构
//!
//! - [`scenario`]：场景文件格式与验证
//! - [`runner`]：逐帧执行与报告

pub mod runner;
pub mod scenario;

pub use runner::{ElementReport, EventRecord, Report, run};
pub use scenario::{AnimationSpec, ElementSpec, Scenario, ScenarioError, Step, ViewportSpec};
