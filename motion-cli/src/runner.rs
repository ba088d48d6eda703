//! # Runner 模块
//!
//! 在无头文档上逐帧执行场景，产出报告。
//!
//! 每一帧的顺序与浏览器一致：平滑滚动 → 触发调度 → 光标（测量、弹簧、渲染）。
//! 指针类步骤按浏览器的事件顺序派发：先 `out`，再 `over`，最后 `move`。

use std::collections::BTreeMap;
use std::rc::Rc;

use motion_core::sim::{FixedWidthMeasurer, SimDocument, SimElement, SimEnvironment, SimNode};
use motion_core::{
    AnimationKind, BindOptions, BindingEvent, BindingHandle, CursorFollow, CursorFrame, DomNode,
    Element, Environment, MotionConfig, MotionPolicy, MountedCursor, PointerEvent, PointerHub,
    PropertyMap, ResolvedAnimation, ScrollHost, ScrollTarget, SmoothScroller, TriggerScheduler,
    Vec2, Viewport, ViewportCondition,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::scenario::{AnimationSpec, Scenario, ScenarioError, Step};

/// 等宽测量时每个字符的宽度
const CHAR_WIDTH: f32 = 7.0;

/// 页面根节点的 key（元素节点从 1 开始编号）
const PAGE_NODE: u64 = 0;

/// 运行报告
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub name: String,
    /// 执行的帧数
    pub frames: u64,
    /// 模拟经过的时间（秒）
    pub elapsed: f32,
    /// 结束时的运动策略
    pub policy: MotionPolicy,
    pub events: Vec<EventRecord>,
    pub elements: BTreeMap<String, ElementReport>,
    /// 最后一帧的光标；卸载后为 `None`
    pub cursor: Option<CursorFrame>,
    pub scroll_y: f32,
    pub live_bindings: usize,
}

/// 一条绑定事件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub time: f32,
    /// 场景中的动画序号
    pub animation: Option<usize>,
    pub binding: u64,
    pub event: &'static str,
}

/// 元素的最终状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementReport {
    pub properties: PropertyMap,
    pub will_change: bool,
}

/// 一个已绑定的动画
struct Animation {
    targets: Vec<Rc<dyn Element>>,
    kind: AnimationKind,
    condition: ViewportCondition,
    handle: BindingHandle,
}

/// 运行时：场景中的全部活动对象
struct Runtime<'a> {
    scenario: &'a Scenario,
    config: &'a MotionConfig,
    env: Rc<SimEnvironment>,
    document: SimDocument,
    elements: BTreeMap<String, Rc<SimElement>>,
    nodes: BTreeMap<String, Rc<SimNode>>,
    page: Rc<SimNode>,
    hovered: Rc<dyn DomNode>,
    scheduler: TriggerScheduler,
    scroller: SmoothScroller,
    hub: PointerHub,
    cursor: Option<MountedCursor>,
    measurer: FixedWidthMeasurer,
    animations: Vec<Animation>,
    /// 绑定 ID → 动画序号（含已销毁的绑定）
    owners: BTreeMap<u64, usize>,
    events: Vec<EventRecord>,
    frames: u64,
    elapsed: f32,
    last_cursor: Option<CursorFrame>,
}

/// 执行场景
pub fn run(scenario: &Scenario, config: &MotionConfig) -> Result<Report, ScenarioError> {
    scenario.validate()?;
    info!(name = %scenario.name, steps = scenario.steps.len(), "开始执行场景");

    let mut runtime = Runtime::new(scenario, config)?;
    for (index, step) in scenario.steps.iter().enumerate() {
        debug!(index, ?step, "执行步骤");
        runtime.step(step)?;
    }
    runtime.flush();

    let report = runtime.report();
    info!(
        frames = report.frames,
        events = report.events.len(),
        "场景执行完成"
    );
    Ok(report)
}

impl<'a> Runtime<'a> {
    fn new(scenario: &'a Scenario, config: &'a MotionConfig) -> Result<Self, ScenarioError> {
        let env = Rc::new(SimEnvironment::browser(scenario.viewport.width));
        env.set_reduced_motion(scenario.reduced_motion);

        let viewport = Viewport::new(scenario.viewport.width, scenario.viewport.height);
        let document = SimDocument::new(viewport, scenario.content_height);
        let page = SimNode::root(PAGE_NODE);
        let label_attribute = config.cursor.label_attribute.as_str();

        let mut elements = BTreeMap::new();
        let mut nodes: BTreeMap<String, Rc<SimNode>> = BTreeMap::new();
        for (index, spec) in scenario.elements.iter().enumerate() {
            let classes: Vec<&str> = spec.classes.iter().map(String::as_str).collect();
            let element = Rc::new(
                SimElement::new(spec.rect)
                    .with_id(&spec.id)
                    .with_classes(&classes),
            );
            document.add(element.clone());
            elements.insert(spec.id.clone(), element);

            let parent = match &spec.parent {
                Some(parent) => nodes.get(parent).cloned().ok_or_else(|| {
                    ScenarioError::UnknownElement {
                        context: format!("元素 '{}' 的 parent", spec.id),
                        id: parent.clone(),
                    }
                })?,
                None => page.clone(),
            };
            let mut node = SimNode::child(index as u64 + 1, &parent);
            if let Some(label) = &spec.cursor_label {
                node = node.with_attribute(label_attribute, label);
            }
            nodes.insert(spec.id.clone(), node);
        }

        let env_dyn: Rc<dyn Environment> = env.clone();
        let hub = PointerHub::new();
        let cursor = CursorFollow::mount(&hub, config.cursor.clone());

        let mut runtime = Self {
            scenario,
            config,
            scheduler: TriggerScheduler::new(env_dyn.clone()),
            scroller: SmoothScroller::new(env_dyn, config.scroll),
            env,
            document,
            elements,
            nodes,
            hovered: page.clone().into_node(),
            page,
            hub,
            cursor: Some(cursor),
            measurer: FixedWidthMeasurer::new(CHAR_WIDTH),
            animations: Vec::new(),
            owners: BTreeMap::new(),
            events: Vec::new(),
            frames: 0,
            elapsed: 0.0,
            last_cursor: None,
        };

        for (index, spec) in scenario.animations.iter().enumerate() {
            runtime.bind(index, spec);
        }
        Ok(runtime)
    }

    /// 目标元素（引用已在 `validate` 中检查）
    fn targets(&self, spec: &AnimationSpec) -> Vec<Rc<dyn Element>> {
        spec.targets
            .iter()
            .filter_map(|id| self.elements.get(id))
            .map(|e| e.clone() as Rc<dyn Element>)
            .collect()
    }

    fn kind_for(&self, spec: &AnimationSpec, kind: &AnimationKind) -> AnimationKind {
        let mut kind = kind.clone();
        if let Some(preset) = spec.duration {
            kind.set_duration(self.config.durations.nominal(preset));
        }
        kind
    }

    fn bind(&mut self, index: usize, spec: &AnimationSpec) {
        let targets = self.targets(spec);
        let kind = self.kind_for(spec, &spec.kind);
        let condition = spec.trigger.unwrap_or(self.config.trigger);
        let options = BindOptions {
            enabled: spec.enabled,
            ..BindOptions::default()
        };

        let handle = self.scheduler.bind_kind(&targets, &kind, condition, options);
        match handle.id() {
            Some(id) => {
                self.owners.insert(id.value(), index);
            }
            None => debug!(index, "动画未绑定（惰性句柄）"),
        }

        self.animations.push(Animation {
            targets,
            kind,
            condition,
            handle,
        });
    }

    fn rebind(&mut self, index: usize, kind: &AnimationKind) {
        let Some(spec) = self.scenario.animations.get(index) else {
            return;
        };
        let kind = self.kind_for(spec, kind);
        let env = self.scheduler.environment().clone();
        let Some(animation) = self.animations.get_mut(index) else {
            return;
        };
        if animation.handle.is_inert() {
            debug!(index, "惰性绑定保持惰性");
            animation.kind = kind;
            return;
        }

        let continuous = |kind: &AnimationKind| matches!(kind, AnimationKind::Parallax(_));
        if continuous(&animation.kind) || continuous(&kind) {
            // 连续绑定与触发绑定之间无法原地替换
            animation.handle.destroy();
            animation.handle = self.scheduler.bind_kind(
                &animation.targets,
                &kind,
                animation.condition,
                BindOptions::default(),
            );
        } else {
            match kind.resolve(env.as_ref(), animation.targets.len()) {
                ResolvedAnimation::Single(intent) if animation.targets.len() <= 1 => {
                    self.scheduler.rebind(&mut animation.handle, intent)
                }
                ResolvedAnimation::Single(intent) => {
                    let intents = vec![intent; animation.targets.len()];
                    self.scheduler.rebind_group(&mut animation.handle, intents)
                }
                ResolvedAnimation::Group(intents) => {
                    self.scheduler.rebind_group(&mut animation.handle, intents)
                }
                ResolvedAnimation::Continuous(_) => {}
            }
        }

        animation.kind = kind;
        if let Some(id) = animation.handle.id() {
            self.owners.insert(id.value(), index);
        }
    }

    fn step(&mut self, step: &Step) -> Result<(), ScenarioError> {
        match step {
            Step::Wait { seconds } => {
                let frames = (seconds * self.scenario.fps as f32).round() as u64;
                for _ in 0..frames {
                    self.frame();
                }
            }
            Step::Scroll { to } => {
                // 用户滚动会打断平滑滚动
                self.scroller.cancel();
                self.document.set_scroll_y(*to);
            }
            Step::ScrollTo { target, offset } => {
                let options = self.config.scroll.options().with_offset(*offset);
                let target = ScrollTarget::Selector(target.clone());
                if !self.scroller.scroll_to(&self.document, target, options) {
                    warn!(?step, "滚动目标不存在");
                }
            }
            Step::ScrollBy { amount } => {
                self.scroller.scroll_by(&self.document, *amount, None);
            }
            Step::ScrollToTop => {
                self.scroller.scroll_to_top(&self.document, None);
            }
            Step::PointerMove { x, y } => {
                self.hub.dispatch(&PointerEvent::Move(Vec2::new(*x, *y)));
            }
            Step::Hover { element } => self.hover(element.as_deref())?,
            Step::PointerLeave => {
                self.hovered = self.page.clone().into_node();
                self.hub.dispatch(&PointerEvent::Leave);
            }
            Step::SetReducedMotion { enabled } => {
                info!(enabled, "切换减少动态效果");
                self.env.set_reduced_motion(*enabled);
            }
            Step::Rebind { animation, kind } => self.rebind(*animation, kind),
            Step::Unmount { animation: Some(index) } => {
                if let Some(animation) = self.animations.get_mut(*index) {
                    animation.handle = BindingHandle::inert();
                }
            }
            Step::Unmount { animation: None } => {
                info!("卸载页面");
                self.scheduler.destroy_all();
                if let Some(cursor) = self.cursor.take() {
                    cursor.unmount();
                }
                self.scroller.cancel();
            }
        }
        Ok(())
    }

    /// 移动指针到元素中心（`None` 表示页面空白处）
    fn hover(&mut self, id: Option<&str>) -> Result<(), ScenarioError> {
        let (next, center) = match id {
            Some(id) => {
                let node = self.nodes.get(id).cloned();
                let element = self.elements.get(id).cloned();
                let (Some(node), Some(element)) = (node, element) else {
                    return Err(ScenarioError::UnknownElement {
                        context: "hover".to_string(),
                        id: id.to_string(),
                    });
                };
                let center = element
                    .bounds()
                    .map(|rect| self.document.viewport().to_viewport(&rect).center());
                (node.into_node(), center)
            }
            None => (self.page.clone().into_node(), None),
        };

        let previous = std::mem::replace(&mut self.hovered, next.clone());
        if previous.key() != next.key() {
            self.hub.dispatch(&PointerEvent::Out {
                target: previous,
                related: Some(next.clone()),
            });
            self.hub.dispatch(&PointerEvent::Over { target: next });
        }
        if let Some(center) = center {
            self.hub.dispatch(&PointerEvent::Move(center));
        }
        Ok(())
    }

    fn frame(&mut self) {
        let dt = self.scenario.frame_dt();
        self.scroller.tick(&self.document, dt);
        let events = self.scheduler.tick(dt, &self.document.viewport());
        self.record(events);
        if let Some(cursor) = &self.cursor {
            self.last_cursor = Some(cursor.frame(dt, &self.measurer));
        }
        self.frames += 1;
        self.elapsed += dt;
    }

    /// 收集最后一个步骤之后尚未报告的事件
    fn flush(&mut self) {
        let events = self.scheduler.tick(0.0, &self.document.viewport());
        self.record(events);
    }

    fn record(&mut self, events: Vec<BindingEvent>) {
        for event in events {
            let binding = event.binding().value();
            self.events.push(EventRecord {
                time: self.elapsed,
                animation: self.owners.get(&binding).copied(),
                binding,
                event: event.name(),
            });
        }
    }

    fn report(&self) -> Report {
        let elements = self
            .elements
            .iter()
            .map(|(id, element)| {
                (
                    id.clone(),
                    ElementReport {
                        properties: element.properties(),
                        will_change: element.will_change(),
                    },
                )
            })
            .collect();

        Report {
            name: self.scenario.name.clone(),
            frames: self.frames,
            elapsed: self.elapsed,
            policy: MotionPolicy::query(self.env.as_ref(), &self.config.breakpoints),
            events: self.events.clone(),
            elements,
            cursor: self.cursor.as_ref().and(self.last_cursor.clone()),
            scroll_y: self.document.scroll_y(),
            live_bindings: self.scheduler.live_count(),
        }
    }
}
