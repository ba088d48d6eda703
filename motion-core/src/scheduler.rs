//! # Scheduler 模块
//!
//! 触发调度器：把动画意图绑定到元素与视口条件上，并管理其完整生命周期。
//!
//! ## 状态机
//!
//! ```text
//! Unarmed ──► Armed ──► Fired ──► Destroyed
//!               │  ◄──────┘ (once = false，滚回开始位置之上)
//!               └────────────────► Destroyed
//! ```
//!
//! - `Destroyed` 是终态，重复销毁是空操作
//! - 销毁会冻结正在播放的补间（不回弹），并释放所有元素引用
//! - 重新绑定时，旧绑定在新绑定就绪之前**同步**拆除，同一时刻不存在两个活跃绑定
//! - 元素回调中释放的绑定在调度器调用下一个元素之前销毁
//! - 元素缺失或未挂载时返回惰性句柄，不记录日志
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let scheduler = TriggerScheduler::new(env);
//! let handle = scheduler.bind(
//!     Some(&hero),
//!     fade_in_up(env.as_ref(), &FadeInUp::default()),
//!     ViewportCondition::default(),
//!     BindOptions::default(),
//! );
//!
//! // 每帧
//! let events = scheduler.tick(dt, &viewport);
//!
//! // 卸载（或直接 drop 句柄）
//! scheduler.destroy(&handle);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::element::{self, Element, ElementRef};
use crate::geometry::Viewport;
use crate::intent::{AnimationIntent, PropertyMap};
use crate::policy::{self, Environment};
use crate::presets::{
    self, AnimationKind, Parallax, ParallaxBinding, ParallaxMapping, ResolvedAnimation,
    StaggerChildren,
};
use crate::timing::resolve_duration;
use crate::trigger::{ViewportCondition, scroll_progress};
use crate::tween::{Track, Tween};

/// 绑定 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(u64);

impl BindingId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binding({})", self.0)
    }
}

/// 绑定状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// 已创建，尚未注册视口条件
    Unarmed,
    /// 等待视口条件
    Armed,
    /// 已触发
    Fired,
    /// 已销毁
    Destroyed,
}

/// 绑定事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingEvent {
    Armed(BindingId),
    Fired(BindingId),
    /// 本次触发的全部补间播放完毕
    Completed(BindingId),
    /// 离开后重新就绪（`once = false`）
    Rearmed(BindingId),
    Destroyed(BindingId),
}

impl BindingEvent {
    /// 事件所属的绑定
    pub fn binding(&self) -> BindingId {
        match self {
            BindingEvent::Armed(id)
            | BindingEvent::Fired(id)
            | BindingEvent::Completed(id)
            | BindingEvent::Rearmed(id)
            | BindingEvent::Destroyed(id) => *id,
        }
    }

    /// 事件名称
    pub fn name(&self) -> &'static str {
        match self {
            BindingEvent::Armed(_) => "armed",
            BindingEvent::Fired(_) => "fired",
            BindingEvent::Completed(_) => "completed",
            BindingEvent::Rearmed(_) => "rearmed",
            BindingEvent::Destroyed(_) => "destroyed",
        }
    }
}

/// 绑定选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOptions {
    /// 为 `false` 时不创建绑定
    pub enabled: bool,
    /// 绑定时立即应用起始属性，避免触发前以静止状态闪现
    pub immediate_render: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            immediate_render: true,
        }
    }
}

/// 错峰组：有序的目标列表，整组由一个视口条件触发
///
/// 触发元素为 `container`，缺省时为第一个目标。
#[derive(Clone, Default)]
pub struct StaggerGroup {
    pub targets: Vec<Rc<dyn Element>>,
    pub container: Option<Rc<dyn Element>>,
}

impl StaggerGroup {
    pub fn new(targets: Vec<Rc<dyn Element>>) -> Self {
        Self {
            targets,
            container: None,
        }
    }

    pub fn with_container(mut self, container: Rc<dyn Element>) -> Self {
        self.container = Some(container);
        self
    }

    /// 触发元素
    pub fn trigger_element(&self) -> Option<&Rc<dyn Element>> {
        self.container.as_ref().or_else(|| self.targets.first())
    }
}

/// 单个动画目标
struct Target {
    element: ElementRef,
    /// 首次绑定时记录的静止值，重新绑定时沿用
    rest: PropertyMap,
    start: PropertyMap,
    end: PropertyMap,
    intent: AnimationIntent,
    tween: Option<Tween>,
}

/// 待绑定的目标
struct TargetSpec {
    element: Rc<dyn Element>,
    intent: AnimationIntent,
    baseline: PropertyMap,
}

impl Target {
    fn new(spec: &TargetSpec) -> Self {
        let element = spec.element.as_ref();
        let mut rest = spec.baseline.clone();
        let mut start = PropertyMap::new();
        let mut end = PropertyMap::new();

        for property in spec.intent.properties() {
            let rest_value = *rest
                .entry(property)
                .or_insert_with(|| element::read_property(element, property));
            let from = spec.intent.from_props.get(&property).copied();
            let to = spec
                .intent
                .to_props
                .as_ref()
                .and_then(|to| to.get(&property).copied());
            start.insert(property, from.unwrap_or(rest_value));
            end.insert(property, to.unwrap_or(rest_value));
        }

        Self {
            element: Rc::downgrade(&spec.element),
            rest,
            start,
            end,
            intent: spec.intent.clone(),
            tween: None,
        }
    }

    /// 从起始状态开始播放
    fn play(&mut self) {
        let Some(element) = self.element.upgrade() else {
            return;
        };

        let tracks = self
            .start
            .iter()
            .map(|(property, from)| {
                let to = self.end.get(property).copied().unwrap_or(*from);
                Track::new(*property, *from, to)
            })
            .collect();

        element::apply_props(element.as_ref(), &self.start);
        element.set_will_change(true);
        self.tween = Some(
            Tween::new(tracks, self.intent.duration)
                .with_delay(self.intent.delay)
                .with_easing(self.intent.ease),
        );
    }

    /// 直接应用终态（减少动态效果）
    fn jump_to_end(&mut self) {
        self.tween = None;
        if let Some(element) = self.element.upgrade() {
            element::apply_props(element.as_ref(), &self.end);
        }
    }

    /// 推进补间
    ///
    /// # 返回
    /// 补间是否仍在进行
    fn advance(&mut self, dt: f32) -> bool {
        let Some(tween) = self.tween.as_mut() else {
            return false;
        };
        if !tween.is_active() {
            return false;
        }
        let Some(element) = self.element.upgrade() else {
            tween.kill();
            return false;
        };

        let running = tween.update(dt);
        for (property, value) in tween.values() {
            element.set_property(property, value);
        }
        if !running {
            element.set_will_change(false);
        }
        running
    }

    /// 取消补间，元素停留在当前值
    fn kill(&mut self) {
        if let Some(tween) = self.tween.as_mut() {
            tween.kill();
        }
        if let Some(element) = self.element.upgrade() {
            element.set_will_change(false);
        }
    }

    /// 恢复静止值
    fn restore_rest(&self) {
        if let Some(element) = self.element.upgrade() {
            element::apply_props(element.as_ref(), &self.rest);
        }
    }

    fn spec(&self, intent: AnimationIntent) -> Option<TargetSpec> {
        let element = self.element.upgrade().filter(|e| e.is_attached())?;
        Some(TargetSpec {
            element,
            intent,
            baseline: self.rest.clone(),
        })
    }
}

fn start_targets(targets: &mut [Target], reduced: bool) -> bool {
    if reduced {
        targets.iter_mut().for_each(Target::jump_to_end);
        false
    } else {
        targets.iter_mut().for_each(Target::play);
        true
    }
}

enum BindingKind {
    /// 视口触发的一次性（或可重复）动画
    Triggered {
        targets: Vec<Target>,
        condition: ViewportCondition,
        playing: bool,
    },
    /// 随滚动连续变化的视差
    Parallax {
        element: ElementRef,
        mapping: ParallaxMapping,
        /// 绑定时记录的静止值，位移叠加在其上
        rest: f32,
    },
}

struct Binding {
    trigger: ElementRef,
    kind: BindingKind,
    state: BindingState,
    options: BindOptions,
}

impl Binding {
    fn update(
        &mut self,
        id: BindingId,
        dt: f32,
        viewport: &Viewport,
        reduced: bool,
        events: &mut Vec<BindingEvent>,
        released: &RefCell<Vec<BindingId>>,
    ) {
        match &mut self.kind {
            BindingKind::Triggered {
                targets,
                condition,
                playing,
            } => {
                if let Some(rect) = self.trigger.upgrade().and_then(|el| el.bounds()) {
                    let met = condition.is_met(&rect, viewport);
                    if self.state == BindingState::Armed && met {
                        self.state = BindingState::Fired;
                        events.push(BindingEvent::Fired(id));
                        debug!(binding = %id, reduced = reduced, "视口条件满足，开始播放");

                        *playing = start_targets(targets, reduced);
                        if !*playing {
                            events.push(BindingEvent::Completed(id));
                        }
                    } else if self.state == BindingState::Fired && !condition.once && !met {
                        self.state = BindingState::Armed;
                        events.push(BindingEvent::Rearmed(id));
                        debug!(binding = %id, "离开触发区域，重新就绪");
                    }
                }

                // 触发回调中释放了自身：不再推进
                if *playing && !released.borrow().contains(&id) {
                    let mut running = false;
                    for target in targets.iter_mut() {
                        running |= target.advance(dt);
                    }
                    if !running {
                        *playing = false;
                        events.push(BindingEvent::Completed(id));
                    }
                }
            }
            BindingKind::Parallax {
                element,
                mapping,
                rest,
            } => {
                // 运行中切换到减少动态效果：停在当前位置
                if reduced {
                    return;
                }
                let Some(element) = element.upgrade() else {
                    return;
                };
                let Some(rect) = element.bounds() else {
                    return;
                };
                let progress = scroll_progress(&mapping.start, &mapping.end, &rect, viewport);
                element.set_property(mapping.property, mapping.value_at(*rest, progress));
            }
        }
    }

    fn teardown(&mut self) {
        if let BindingKind::Triggered { targets, .. } = &mut self.kind {
            targets.iter_mut().for_each(Target::kill);
        }
        self.state = BindingState::Destroyed;
    }

    fn targets_element(&self, element: &Rc<dyn Element>) -> bool {
        match &self.kind {
            BindingKind::Triggered { targets, .. } => targets
                .iter()
                .any(|t| element::same_element(&t.element, element)),
            BindingKind::Parallax { element: el, .. } => element::same_element(el, element),
        }
    }
}

struct SchedulerState {
    bindings: BTreeMap<BindingId, Binding>,
    next_id: u64,
    events: Vec<BindingEvent>,
}

impl SchedulerState {
    fn next_binding_id(&mut self) -> BindingId {
        let id = BindingId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert_armed(&mut self, mut binding: Binding) -> BindingId {
        let id = self.next_binding_id();
        binding.state = BindingState::Armed;
        self.events.push(BindingEvent::Armed(id));
        self.bindings.insert(id, binding);
        id
    }

    /// 销毁绑定（幂等）
    fn destroy(&mut self, id: BindingId) -> Option<Binding> {
        let mut binding = self.bindings.remove(&id)?;
        binding.teardown();
        self.events.push(BindingEvent::Destroyed(id));
        debug!(binding = %id, "绑定已销毁");
        Some(binding)
    }
}

/// 释放绑定
///
/// 先登记到释放队列；调度器空闲时立即销毁，否则由持有借用的一方
/// 在下一次调用元素之前销毁。
fn release(
    inner: &Weak<RefCell<SchedulerState>>,
    released: &Weak<RefCell<Vec<BindingId>>>,
    id: BindingId,
) {
    let (Some(inner), Some(released)) = (inner.upgrade(), released.upgrade()) else {
        return;
    };
    released.borrow_mut().push(id);
    if let Ok(mut state) = inner.try_borrow_mut() {
        drain_released(&mut state, &released);
    }
}

/// 销毁队列中的全部绑定，直到队列为空（拆除回调可能继续释放）
fn drain_released(state: &mut SchedulerState, released: &RefCell<Vec<BindingId>>) {
    loop {
        let ids = std::mem::take(&mut *released.borrow_mut());
        if ids.is_empty() {
            return;
        }
        for id in ids {
            state.destroy(id);
        }
    }
}

/// 绑定句柄
///
/// 唯一的约定是"在清理时销毁"。句柄被 drop 时同样会销毁绑定，
/// 保证每条退出路径都释放资源。
pub struct BindingHandle {
    id: Option<BindingId>,
    inner: Weak<RefCell<SchedulerState>>,
    released: Weak<RefCell<Vec<BindingId>>>,
}

impl BindingHandle {
    /// 惰性句柄（动画被跳过）
    pub fn inert() -> Self {
        Self {
            id: None,
            inner: Weak::new(),
            released: Weak::new(),
        }
    }

    pub fn id(&self) -> Option<BindingId> {
        self.id
    }

    /// 是否为惰性句柄
    pub fn is_inert(&self) -> bool {
        self.id.is_none()
    }

    /// 销毁绑定（幂等）
    pub fn destroy(&self) {
        if let Some(id) = self.id {
            release(&self.inner, &self.released, id);
        }
    }
}

impl Drop for BindingHandle {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for BindingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingHandle").field("id", &self.id).finish()
    }
}

/// 触发调度器
///
/// 单线程共享（内部 `Rc<RefCell<_>>`），克隆得到同一个调度器。
#[derive(Clone)]
pub struct TriggerScheduler {
    inner: Rc<RefCell<SchedulerState>>,
    released: Rc<RefCell<Vec<BindingId>>>,
    env: Rc<dyn Environment>,
}

impl fmt::Debug for TriggerScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerScheduler")
            .field("bindings", &self.inner.borrow().bindings.len())
            .finish()
    }
}

impl TriggerScheduler {
    /// 创建调度器，注入环境能力
    pub fn new(env: Rc<dyn Environment>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerState {
                bindings: BTreeMap::new(),
                next_id: 1,
                events: Vec::new(),
            })),
            released: Rc::new(RefCell::new(Vec::new())),
            env,
        }
    }

    /// 注入的环境
    pub fn environment(&self) -> &Rc<dyn Environment> {
        &self.env
    }

    fn handle(&self, id: BindingId) -> BindingHandle {
        BindingHandle {
            id: Some(id),
            inner: Rc::downgrade(&self.inner),
            released: Rc::downgrade(&self.released),
        }
    }

    // ========== 绑定 ==========

    /// 绑定单个元素
    ///
    /// 元素为 `None` 或未挂载时返回惰性句柄。
    pub fn bind(
        &self,
        element: Option<&Rc<dyn Element>>,
        intent: AnimationIntent,
        condition: ViewportCondition,
        options: BindOptions,
    ) -> BindingHandle {
        if !options.enabled {
            return BindingHandle::inert();
        }
        let Some(element) = element.filter(|e| e.is_attached()) else {
            return BindingHandle::inert();
        };

        let spec = TargetSpec {
            element: element.clone(),
            intent,
            baseline: PropertyMap::new(),
        };
        let id = self.arm(element, vec![spec], condition, options);
        self.handle(id)
    }

    /// 绑定一组元素，`intents` 与目标按顺序对应
    ///
    /// 未挂载的目标被跳过；触发元素缺失时返回惰性句柄。
    pub fn bind_group(
        &self,
        group: &StaggerGroup,
        intents: Vec<AnimationIntent>,
        condition: ViewportCondition,
        options: BindOptions,
    ) -> BindingHandle {
        if !options.enabled {
            return BindingHandle::inert();
        }
        let Some(trigger) = group.trigger_element().filter(|e| e.is_attached()) else {
            return BindingHandle::inert();
        };

        let specs: Vec<TargetSpec> = group
            .targets
            .iter()
            .zip(intents)
            .filter(|(element, _)| element.is_attached())
            .map(|(element, intent)| TargetSpec {
                element: element.clone(),
                intent,
                baseline: PropertyMap::new(),
            })
            .collect();
        if specs.is_empty() {
            return BindingHandle::inert();
        }

        let id = self.arm(trigger, specs, condition, options);
        self.handle(id)
    }

    /// 绑定错峰动画
    pub fn bind_stagger(
        &self,
        group: &StaggerGroup,
        stagger: &StaggerChildren,
        condition: ViewportCondition,
        options: BindOptions,
    ) -> BindingHandle {
        let intents = presets::stagger_children(self.env.as_ref(), stagger, group.targets.len());
        self.bind_group(group, intents, condition, options)
    }

    /// 绑定视差
    ///
    /// 减少动态效果时返回惰性句柄（视差没有瞬时版本）。
    pub fn bind_parallax(
        &self,
        element: Option<&Rc<dyn Element>>,
        parallax: &Parallax,
        options: BindOptions,
    ) -> BindingHandle {
        let binding = presets::parallax(self.env.as_ref(), parallax);
        self.bind_continuous(element, binding, options)
    }

    fn bind_continuous(
        &self,
        element: Option<&Rc<dyn Element>>,
        binding: ParallaxBinding,
        options: BindOptions,
    ) -> BindingHandle {
        if !options.enabled {
            return BindingHandle::inert();
        }
        let Some(element) = element.filter(|e| e.is_attached()) else {
            return BindingHandle::inert();
        };
        let ParallaxBinding::Tracking(mapping) = binding else {
            return BindingHandle::inert();
        };

        let rest = element::read_property(element.as_ref(), mapping.property);
        let id = self.arm_parallax(element, mapping, rest, options);
        self.handle(id)
    }

    /// 按动画种类绑定
    ///
    /// 单体动画作用于多个目标时，整组共享同一个意图并一起触发。
    pub fn bind_kind(
        &self,
        targets: &[Rc<dyn Element>],
        kind: &AnimationKind,
        condition: ViewportCondition,
        options: BindOptions,
    ) -> BindingHandle {
        match kind.resolve(self.env.as_ref(), targets.len()) {
            ResolvedAnimation::Single(intent) if targets.len() <= 1 => {
                self.bind(targets.first(), intent, condition, options)
            }
            ResolvedAnimation::Single(intent) => {
                let intents = vec![intent; targets.len()];
                self.bind_group(&StaggerGroup::new(targets.to_vec()), intents, condition, options)
            }
            ResolvedAnimation::Group(intents) => {
                self.bind_group(&StaggerGroup::new(targets.to_vec()), intents, condition, options)
            }
            ResolvedAnimation::Continuous(binding) => {
                self.bind_continuous(targets.first(), binding, options)
            }
        }
    }

    fn arm(
        &self,
        trigger: &Rc<dyn Element>,
        specs: Vec<TargetSpec>,
        condition: ViewportCondition,
        options: BindOptions,
    ) -> BindingId {
        let env = self.env.as_ref();
        let reduced = policy::reduced_motion(env);

        let mut targets: Vec<Target> = specs
            .into_iter()
            .map(|mut spec| {
                spec.intent.duration = resolve_duration(env, spec.intent.duration);
                let target = Target::new(&spec);
                if !reduced && options.immediate_render {
                    element::apply_props(spec.element.as_ref(), &target.start);
                }
                target
            })
            .collect();

        let mut state = self.inner.borrow_mut();
        let target_count = targets.len();

        // 减少动态效果：仍然登记绑定，但直接应用终态
        let fired = if reduced {
            start_targets(&mut targets, true);
            true
        } else {
            false
        };

        let id = state.insert_armed(Binding {
            trigger: Rc::downgrade(trigger),
            kind: BindingKind::Triggered {
                targets,
                condition,
                playing: false,
            },
            state: BindingState::Unarmed,
            options,
        });
        debug!(binding = %id, targets = target_count, once = condition.once, "绑定已就绪");

        if fired {
            if let Some(binding) = state.bindings.get_mut(&id) {
                binding.state = BindingState::Fired;
            }
            state.events.push(BindingEvent::Fired(id));
            state.events.push(BindingEvent::Completed(id));
            debug!(binding = %id, "减少动态效果：直接应用终态");
        }

        drain_released(&mut state, &self.released);
        id
    }

    fn arm_parallax(
        &self,
        element: &Rc<dyn Element>,
        mapping: ParallaxMapping,
        rest: f32,
        options: BindOptions,
    ) -> BindingId {
        let mut state = self.inner.borrow_mut();
        let id = state.insert_armed(Binding {
            trigger: Rc::downgrade(element),
            kind: BindingKind::Parallax {
                element: Rc::downgrade(element),
                mapping,
                rest,
            },
            state: BindingState::Unarmed,
            options,
        });
        debug!(
            binding = %id,
            property = %mapping.property,
            displacement = mapping.displacement,
            "视差绑定已就绪"
        );
        id
    }

    // ========== 重新绑定 / 销毁 ==========

    /// 以新意图替换绑定（所有目标使用同一意图）
    ///
    /// 旧绑定先完全拆除，再创建新绑定；句柄原地更新为新绑定。
    /// 惰性句柄保持惰性。
    pub fn rebind(&self, handle: &mut BindingHandle, intent: AnimationIntent) {
        self.replace(handle, |_| Some(intent.clone()));
    }

    /// 以新的意图列表替换组绑定，按顺序对应目标
    pub fn rebind_group(&self, handle: &mut BindingHandle, intents: Vec<AnimationIntent>) {
        self.replace(handle, |index| intents.get(index).cloned());
    }

    fn replace(
        &self,
        handle: &mut BindingHandle,
        intent_for: impl Fn(usize) -> Option<AnimationIntent>,
    ) {
        let Some(id) = handle.id else {
            return;
        };
        if !Weak::ptr_eq(&handle.inner, &Rc::downgrade(&self.inner)) {
            return;
        }

        // 同步拆除旧绑定
        let old = self.inner.borrow_mut().destroy(id);
        let Some(old) = old else {
            handle.id = None;
            return;
        };

        let new_id = match old.kind {
            BindingKind::Triggered {
                targets, condition, ..
            } => {
                let trigger = old.trigger.upgrade().filter(|e| e.is_attached());
                // 新意图可能不覆盖旧意图修改过的属性
                targets.iter().for_each(Target::restore_rest);
                let specs: Vec<TargetSpec> = targets
                    .iter()
                    .enumerate()
                    .filter_map(|(index, target)| target.spec(intent_for(index)?))
                    .collect();
                match trigger {
                    Some(trigger) if !specs.is_empty() => {
                        Some(self.arm(&trigger, specs, condition, old.options))
                    }
                    _ => None,
                }
            }
            BindingKind::Parallax {
                element,
                mapping,
                rest,
            } => element.upgrade().filter(|e| e.is_attached()).map(|element| {
                element.set_property(mapping.property, rest);
                self.arm_parallax(&element, mapping, rest, old.options)
            }),
        };

        handle.id = new_id;
    }

    /// 销毁绑定（幂等，可在任意调用栈中调用）
    pub fn destroy(&self, handle: &BindingHandle) {
        handle.destroy();
    }

    /// 销毁全部绑定
    pub fn destroy_all(&self) {
        let mut state = self.inner.borrow_mut();
        let ids: Vec<BindingId> = state.bindings.keys().copied().collect();
        for id in ids {
            state.destroy(id);
        }
        drain_released(&mut state, &self.released);
    }

    // ========== 帧更新 ==========

    /// 推进一帧：检查视口条件并推进补间
    ///
    /// # 返回
    /// 自上次调用以来产生的事件（包括绑定与销毁）
    pub fn tick(&self, dt: f32, viewport: &Viewport) -> Vec<BindingEvent> {
        let reduced = policy::reduced_motion(self.env.as_ref());

        let mut state = self.inner.borrow_mut();
        let ids: Vec<BindingId> = state.bindings.keys().copied().collect();
        for id in ids {
            // 前一个绑定的元素回调可能释放了后面的绑定
            drain_released(&mut state, &self.released);
            let SchedulerState {
                bindings, events, ..
            } = &mut *state;
            if let Some(binding) = bindings.get_mut(&id) {
                binding.update(id, dt, viewport, reduced, events, &self.released);
            }
        }
        drain_released(&mut state, &self.released);

        std::mem::take(&mut state.events)
    }

    // ========== 查询 ==========

    /// 句柄对应绑定的状态（惰性句柄返回 `None`）
    pub fn state(&self, handle: &BindingHandle) -> Option<BindingState> {
        let id = handle.id?;
        if self.released.borrow().contains(&id) {
            return Some(BindingState::Destroyed);
        }
        let state = self.inner.borrow();
        Some(
            state
                .bindings
                .get(&id)
                .map(|b| b.state)
                .unwrap_or(BindingState::Destroyed),
        )
    }

    /// 活跃绑定数量
    pub fn live_count(&self) -> usize {
        let released = self.released.borrow();
        self.inner
            .borrow()
            .bindings
            .keys()
            .filter(|id| !released.contains(id))
            .count()
    }

    /// 以某元素为目标的活跃绑定数量
    pub fn live_bindings_for(&self, element: &Rc<dyn Element>) -> usize {
        self.inner
            .borrow()
            .bindings
            .values()
            .filter(|b| b.targets_element(element))
            .count()
    }

    /// 是否有正在播放的补间
    pub fn has_active_animations(&self) -> bool {
        self.inner.borrow().bindings.values().any(|b| {
            matches!(
                b.kind,
                BindingKind::Triggered { playing: true, .. }
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::EasingFunction;
    use crate::geometry::Rect;
    use crate::intent::Property;
    use crate::presets::{FadeInUp, fade_in_up};
    use crate::sim::{SimElement, SimEnvironment};

    const DT: f32 = 1.0 / 60.0;

    struct Fixture {
        env: Rc<SimEnvironment>,
        scheduler: TriggerScheduler,
        viewport: Viewport,
    }

    fn fixture() -> Fixture {
        let env = Rc::new(SimEnvironment::browser(1280.0));
        let scheduler = TriggerScheduler::new(env.clone());
        Fixture {
            env,
            scheduler,
            viewport: Viewport::new(1280.0, 800.0),
        }
    }

    /// 顶边在文档 1000px 处的元素（滚动 360px 时到达 80% 线）
    fn below_fold() -> (Rc<SimElement>, Rc<dyn Element>) {
        let sim = Rc::new(SimElement::new(Rect::new(0.0, 1000.0, 600.0, 300.0)));
        let element: Rc<dyn Element> = sim.clone();
        (sim, element)
    }

    fn fade_up(env: &SimEnvironment) -> AnimationIntent {
        fade_in_up(env, &FadeInUp::default())
    }

    fn run(scheduler: &TriggerScheduler, viewport: &Viewport, frames: usize) -> Vec<BindingEvent> {
        (0..frames)
            .flat_map(|_| scheduler.tick(DT, viewport))
            .collect()
    }

    #[test]
    fn test_bind_arms_and_applies_from_state() {
        let f = fixture();
        let (sim, element) = below_fold();

        let handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions::default(),
        );

        assert_eq!(f.scheduler.state(&handle), Some(BindingState::Armed));
        assert_eq!(sim.value(Property::Opacity), 0.0);
        assert_eq!(sim.value(Property::Y), 50.0);

        // 未滚动到触发线，不会触发
        let events = run(&f.scheduler, &f.viewport, 10);
        assert_eq!(events, vec![BindingEvent::Armed(handle.id().unwrap())]);
        assert_eq!(sim.value(Property::Opacity), 0.0);
    }

    #[test]
    fn test_fires_and_completes_at_rest() {
        let f = fixture();
        let (sim, element) = below_fold();
        let handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions::default(),
        );
        let id = handle.id().unwrap();

        let scrolled = f.viewport.with_scroll_y(400.0);
        let events = run(&f.scheduler, &scrolled, 10);
        assert!(events.contains(&BindingEvent::Fired(id)));
        assert_eq!(f.scheduler.state(&handle), Some(BindingState::Fired));

        // 播放中
        let opacity = sim.value(Property::Opacity);
        assert!(opacity > 0.0 && opacity < 1.0);
        assert!(sim.will_change());

        // 0.8 秒后完成
        let events = run(&f.scheduler, &scrolled, 60);
        assert!(events.contains(&BindingEvent::Completed(id)));
        assert_eq!(sim.value(Property::Opacity), 1.0);
        assert_eq!(sim.value(Property::Y), 0.0);
        assert!(!sim.will_change());
        assert!(!f.scheduler.has_active_animations());
    }

    #[test]
    fn test_missing_or_detached_element_is_inert() {
        let f = fixture();

        let handle = f.scheduler.bind(
            None,
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions::default(),
        );
        assert!(handle.is_inert());
        assert_eq!(f.scheduler.state(&handle), None);

        let (sim, element) = below_fold();
        sim.detach();
        let handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions::default(),
        );
        assert!(handle.is_inert());
        assert_eq!(f.scheduler.live_count(), 0);

        // 惰性句柄可以安全销毁
        f.scheduler.destroy(&handle);
        f.scheduler.destroy(&handle);
        assert!(f.scheduler.tick(DT, &f.viewport).is_empty());
    }

    #[test]
    fn test_disabled_binding_is_inert() {
        let f = fixture();
        let (sim, element) = below_fold();

        let handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions {
                enabled: false,
                ..Default::default()
            },
        );
        assert!(handle.is_inert());
        assert_eq!(sim.value(Property::Opacity), 1.0);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let f = fixture();
        let (_sim, element) = below_fold();
        let handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions::default(),
        );
        let id = handle.id().unwrap();
        f.scheduler.tick(DT, &f.viewport);

        f.scheduler.destroy(&handle);
        f.scheduler.destroy(&handle);
        handle.destroy();

        let events = f.scheduler.tick(DT, &f.viewport);
        assert_eq!(events, vec![BindingEvent::Destroyed(id)]);
        assert_eq!(f.scheduler.state(&handle), Some(BindingState::Destroyed));
        assert_eq!(f.scheduler.live_count(), 0);
    }

    #[test]
    fn test_destroy_mid_animation_freezes_values() {
        let f = fixture();
        let (sim, element) = below_fold();
        let handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions::default(),
        );

        let scrolled = f.viewport.with_scroll_y(400.0);
        run(&f.scheduler, &scrolled, 15);
        let opacity = sim.value(Property::Opacity);
        let y = sim.value(Property::Y);
        assert!(opacity > 0.0 && opacity < 1.0);

        f.scheduler.destroy(&handle);
        run(&f.scheduler, &scrolled, 60);

        assert_eq!(sim.value(Property::Opacity), opacity);
        assert_eq!(sim.value(Property::Y), y);
        assert!(!sim.will_change());
    }

    #[test]
    fn test_never_fires_after_destroy() {
        let f = fixture();
        let (sim, element) = below_fold();
        let handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions::default(),
        );
        let id = handle.id().unwrap();
        f.scheduler.destroy(&handle);

        let events = run(&f.scheduler, &f.viewport.with_scroll_y(2000.0), 30);
        assert!(!events.contains(&BindingEvent::Fired(id)));
        // 停留在起始状态（不回弹）
        assert_eq!(sim.value(Property::Opacity), 0.0);
    }

    #[test]
    fn test_dropping_handle_destroys_binding() {
        let f = fixture();
        let (_sim, element) = below_fold();
        let id = {
            let handle = f.scheduler.bind(
                Some(&element),
                fade_up(&f.env),
                ViewportCondition::default(),
                BindOptions::default(),
            );
            handle.id().unwrap()
        };

        assert_eq!(f.scheduler.live_count(), 0);
        let events = f.scheduler.tick(DT, &f.viewport);
        assert_eq!(
            events,
            vec![BindingEvent::Armed(id), BindingEvent::Destroyed(id)]
        );
    }

    #[test]
    fn test_rebind_keeps_single_live_binding() {
        let f = fixture();
        let (sim, element) = below_fold();
        let mut handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions::default(),
        );
        let old_id = handle.id().unwrap();
        f.scheduler.tick(DT, &f.viewport);
        assert_eq!(f.scheduler.live_bindings_for(&element), 1);

        let from_left = AnimationIntent::from_props(
            PropertyMap::from([(Property::Opacity, 0.0), (Property::X, -80.0)]),
            0.5,
        );
        f.scheduler.rebind(&mut handle, from_left);
        let new_id = handle.id().unwrap();

        assert_ne!(old_id, new_id);
        assert_eq!(f.scheduler.live_bindings_for(&element), 1);
        assert_eq!(f.scheduler.live_count(), 1);

        // 旧绑定先销毁，新绑定后就绪
        let events = f.scheduler.tick(DT, &f.viewport);
        assert_eq!(
            events,
            vec![BindingEvent::Destroyed(old_id), BindingEvent::Armed(new_id)]
        );

        // 新绑定使用首次绑定时记录的静止值作为终态
        let events = run(&f.scheduler, &f.viewport.with_scroll_y(400.0), 60);
        assert!(events.contains(&BindingEvent::Completed(new_id)));
        assert_eq!(sim.value(Property::Opacity), 1.0);
        assert_eq!(sim.value(Property::X), 0.0);
    }

    #[test]
    fn test_rebind_inert_handle_stays_inert() {
        let f = fixture();
        let mut handle = BindingHandle::inert();
        f.scheduler.rebind(&mut handle, fade_up(&f.env));
        assert!(handle.is_inert());
        assert_eq!(f.scheduler.live_count(), 0);
    }

    #[test]
    fn test_reduced_motion_applies_end_state_instantly() {
        let f = fixture();
        f.env.set_reduced_motion(true);
        let (sim, element) = below_fold();
        sim.set_property(Property::Opacity, 1.0);

        let intent = fade_up(&f.env);
        assert_eq!(intent.duration, 0.0);

        let handle = f.scheduler.bind(
            Some(&element),
            intent,
            ViewportCondition::default(),
            BindOptions::default(),
        );
        let id = handle.id().unwrap();

        // 仍然登记了绑定，元素处于静止状态
        assert_eq!(f.scheduler.state(&handle), Some(BindingState::Fired));
        assert_eq!(sim.value(Property::Opacity), 1.0);
        assert_eq!(sim.value(Property::Y), 0.0);
        assert!(!sim.will_change());

        let events = f.scheduler.tick(DT, &f.viewport);
        assert_eq!(
            events,
            vec![
                BindingEvent::Armed(id),
                BindingEvent::Fired(id),
                BindingEvent::Completed(id)
            ]
        );

        f.scheduler.destroy(&handle);
        assert_eq!(f.scheduler.live_count(), 0);
    }

    #[test]
    fn test_custom_intent_duration_is_resolved() {
        let f = fixture();
        f.env.set_reduced_motion(true);
        let (sim, element) = below_fold();

        // 未经预设构造的意图同样走时长解析
        let intent = AnimationIntent::to_props(PropertyMap::from([(Property::Scale, 2.0)]), 3.0)
            .with_ease(EasingFunction::Linear);
        let _handle = f.scheduler.bind(
            Some(&element),
            intent,
            ViewportCondition::default(),
            BindOptions::default(),
        );

        assert_eq!(sim.value(Property::Scale), 2.0);
    }

    #[test]
    fn test_repeating_trigger_refires() {
        let f = fixture();
        let (_sim, element) = below_fold();
        let handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default().repeating(),
            BindOptions::default(),
        );
        let id = handle.id().unwrap();

        let inside = f.viewport.with_scroll_y(400.0);
        let events = run(&f.scheduler, &inside, 5);
        assert_eq!(events.iter().filter(|e| **e == BindingEvent::Fired(id)).count(), 1);

        let events = run(&f.scheduler, &f.viewport, 5);
        assert!(events.contains(&BindingEvent::Rearmed(id)));
        assert_eq!(f.scheduler.state(&handle), Some(BindingState::Armed));

        let events = run(&f.scheduler, &inside, 5);
        assert!(events.contains(&BindingEvent::Fired(id)));
    }

    #[test]
    fn test_one_shot_trigger_does_not_rearm() {
        let f = fixture();
        let (_sim, element) = below_fold();
        let handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions::default(),
        );
        let id = handle.id().unwrap();

        run(&f.scheduler, &f.viewport.with_scroll_y(400.0), 5);
        let events = run(&f.scheduler, &f.viewport, 5);
        assert!(!events.contains(&BindingEvent::Rearmed(id)));
        assert_eq!(f.scheduler.state(&handle), Some(BindingState::Fired));
    }

    #[test]
    fn test_stagger_group_fires_as_unit() {
        let f = fixture();
        let sims: Vec<Rc<SimElement>> = (0..3)
            .map(|i| {
                Rc::new(SimElement::new(Rect::new(
                    i as f32 * 200.0,
                    1000.0,
                    180.0,
                    240.0,
                )))
            })
            .collect();
        let targets: Vec<Rc<dyn Element>> = sims
            .iter()
            .map(|s| s.clone() as Rc<dyn Element>)
            .collect();

        let handle = f.scheduler.bind_stagger(
            &StaggerGroup::new(targets),
            &StaggerChildren::default(),
            ViewportCondition::default(),
            BindOptions::default(),
        );
        let id = handle.id().unwrap();

        // 0.2 秒后：第一个已开始，第三个（延迟 0.3）仍在等待
        let events = run(&f.scheduler, &f.viewport.with_scroll_y(400.0), 12);
        assert_eq!(events.iter().filter(|e| **e == BindingEvent::Fired(id)).count(), 1);
        assert!(sims[0].value(Property::Opacity) > 0.0);
        assert_eq!(sims[2].value(Property::Opacity), 0.0);

        // 0.3 + 0.7 秒后全部完成
        let events = run(&f.scheduler, &f.viewport.with_scroll_y(400.0), 60);
        assert!(events.contains(&BindingEvent::Completed(id)));
        for sim in &sims {
            assert_eq!(sim.value(Property::Opacity), 1.0);
            assert_eq!(sim.value(Property::Y), 0.0);
        }
    }

    #[test]
    fn test_parallax_tracks_scroll() {
        let f = fixture();
        let (sim, element) = below_fold();

        let _handle = f.scheduler.bind_parallax(
            Some(&element),
            &Parallax::default(),
            BindOptions::default(),
        );

        // 区间：scroll 200（顶边到达底部）→ 1300（底边到达顶部）
        f.scheduler.tick(DT, &f.viewport.with_scroll_y(200.0));
        assert_eq!(sim.value(Property::Y), 0.0);

        f.scheduler.tick(DT, &f.viewport.with_scroll_y(750.0));
        assert!((sim.value(Property::Y) - 25.0).abs() < 1e-3);

        f.scheduler.tick(DT, &f.viewport.with_scroll_y(5000.0));
        assert_eq!(sim.value(Property::Y), 50.0);
    }

    #[test]
    fn test_parallax_offsets_from_existing_value() {
        let f = fixture();
        let (sim, element) = below_fold();
        sim.set_property(Property::Y, 20.0);

        let _handle = f.scheduler.bind_parallax(
            Some(&element),
            &Parallax::default(),
            BindOptions::default(),
        );

        f.scheduler.tick(DT, &f.viewport.with_scroll_y(200.0));
        assert_eq!(sim.value(Property::Y), 20.0);

        f.scheduler.tick(DT, &f.viewport.with_scroll_y(750.0));
        assert!((sim.value(Property::Y) - 45.0).abs() < 1e-3);

        f.scheduler.tick(DT, &f.viewport.with_scroll_y(5000.0));
        assert_eq!(sim.value(Property::Y), 70.0);
    }

    #[test]
    fn test_parallax_under_reduced_motion_is_noop() {
        let f = fixture();
        f.env.set_reduced_motion(true);
        let (sim, element) = below_fold();

        let handle = f.scheduler.bind_parallax(
            Some(&element),
            &Parallax::default(),
            BindOptions::default(),
        );
        assert!(handle.is_inert());

        f.scheduler.tick(DT, &f.viewport.with_scroll_y(750.0));
        assert_eq!(sim.value(Property::Y), 0.0);
    }

    #[test]
    fn test_dropped_element_does_not_panic() {
        let f = fixture();
        let (sim, element) = below_fold();
        let handle = f.scheduler.bind(
            Some(&element),
            fade_up(&f.env),
            ViewportCondition::default(),
            BindOptions::default(),
        );
        run(&f.scheduler, &f.viewport.with_scroll_y(400.0), 5);

        // 表现层释放了元素
        drop(element);
        drop(sim);
        run(&f.scheduler, &f.viewport.with_scroll_y(400.0), 60);

        assert_eq!(f.scheduler.state(&handle), Some(BindingState::Fired));
        f.scheduler.destroy(&handle);
        assert_eq!(f.scheduler.live_count(), 0);
    }
}
