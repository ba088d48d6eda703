//! 绑定生命周期：销毁幂等、重新绑定互斥、跨调用栈释放

use std::cell::RefCell;
use std::rc::Rc;

use motion_core::sim::{SimElement, SimEnvironment};
use motion_core::{
    AnimationIntent, BindOptions, BindingEvent, BindingHandle, BindingState, Element, FadeInScale,
    FadeInUp, Property, Rect, TriggerScheduler, Viewport, ViewportCondition, fade_in_scale,
    fade_in_up,
};

const DT: f32 = 1.0 / 60.0;

fn setup() -> (Rc<SimEnvironment>, TriggerScheduler) {
    let env = Rc::new(SimEnvironment::browser(1280.0));
    let scheduler = TriggerScheduler::new(env.clone());
    (env, scheduler)
}

#[test]
fn test_rebind_sequence_keeps_mutual_exclusion() {
    let (env, scheduler) = setup();
    let sim = Rc::new(SimElement::new(Rect::new(0.0, 1500.0, 800.0, 400.0)));
    let element: Rc<dyn Element> = sim.clone();
    let viewport = Viewport::new(1280.0, 800.0);

    let mut handle = scheduler.bind(
        Some(&element),
        fade_in_up(env.as_ref(), &FadeInUp::default()),
        ViewportCondition::default(),
        BindOptions::default(),
    );

    // 配置依赖反复变化（例如图片位置左右切换）
    for i in 0..10 {
        let from_x = if i % 2 == 0 { -60.0 } else { 60.0 };
        let intent = AnimationIntent::from_props(
            [(Property::Opacity, 0.0), (Property::X, from_x)].into(),
            0.6,
        );
        scheduler.rebind(&mut handle, intent);
        assert_eq!(scheduler.live_bindings_for(&element), 1);
        assert_eq!(scheduler.live_count(), 1);
        scheduler.tick(DT, &viewport);
    }

    assert_eq!(scheduler.state(&handle), Some(BindingState::Armed));
    assert_eq!(sim.value(Property::X), 60.0);
    // 首个意图修改过的属性已恢复
    assert_eq!(sim.value(Property::Y), 0.0);
}

#[test]
fn test_destroy_twice_matches_destroy_once() {
    let (env, scheduler) = setup();
    let viewport = Viewport::new(1280.0, 800.0);

    let run = |destroys: usize| {
        let sim = Rc::new(SimElement::new(Rect::new(0.0, 100.0, 800.0, 400.0)));
        let element: Rc<dyn Element> = sim.clone();
        let handle = scheduler.bind(
            Some(&element),
            fade_in_scale(env.as_ref(), &FadeInScale::default()),
            ViewportCondition::default(),
            BindOptions::default(),
        );
        for _ in 0..20 {
            scheduler.tick(DT, &viewport);
        }
        for _ in 0..destroys {
            scheduler.destroy(&handle);
        }
        let events = scheduler.tick(DT, &viewport);
        (sim.properties(), events.len(), scheduler.state(&handle))
    };

    let once = run(1);
    let twice = run(2);
    assert_eq!(once.0, twice.0);
    assert_eq!(once.1, twice.1);
    assert_eq!(once.2, Some(BindingState::Destroyed));
    assert_eq!(twice.2, Some(BindingState::Destroyed));
}

/// 在动画回调中释放自身绑定的元素
struct SelfReleasing {
    inner: SimElement,
    handle: RefCell<Option<BindingHandle>>,
}

impl Element for SelfReleasing {
    fn get_property(&self, property: Property) -> Option<f32> {
        self.inner.get_property(property)
    }

    fn set_property(&self, property: Property, value: f32) -> bool {
        self.inner.set_property(property, value)
    }

    fn bounds(&self) -> Option<Rect> {
        self.inner.bounds()
    }

    fn set_will_change(&self, active: bool) {
        if active {
            // 在调度器 tick 的调用栈中 drop 句柄
            self.handle.borrow_mut().take();
        }
    }
}

#[test]
fn test_release_from_inside_tick_stops_binding() {
    let (env, scheduler) = setup();
    let viewport = Viewport::new(1280.0, 800.0);

    let element = Rc::new(SelfReleasing {
        inner: SimElement::new(Rect::new(0.0, 100.0, 800.0, 400.0)),
        handle: RefCell::new(None),
    });
    let as_element: Rc<dyn Element> = element.clone();
    let handle = scheduler.bind(
        Some(&as_element),
        fade_in_up(env.as_ref(), &FadeInUp::default()),
        ViewportCondition::default(),
        BindOptions::default(),
    );
    let id = handle.id().unwrap();
    *element.handle.borrow_mut() = Some(handle);

    // 触发时元素在 tick 的调用栈中释放句柄：本帧内即被销毁，补间不再推进
    let events = scheduler.tick(DT, &viewport);
    let fired = events.iter().position(|e| *e == BindingEvent::Fired(id));
    let destroyed = events.iter().position(|e| *e == BindingEvent::Destroyed(id));
    assert!(fired.is_some());
    assert!(destroyed > fired);
    assert_eq!(events.last(), Some(&BindingEvent::Destroyed(id)));
    assert_eq!(scheduler.live_count(), 0);
    assert_eq!(element.inner.value(Property::Opacity), 0.0);

    for _ in 0..30 {
        let events = scheduler.tick(DT, &viewport);
        assert!(events.is_empty());
    }
    assert_eq!(element.inner.value(Property::Opacity), 0.0);
}

/// 开始播放时销毁另一个元素的绑定
struct ReleasesOther {
    inner: SimElement,
    other: RefCell<Option<Rc<BindingHandle>>>,
}

impl Element for ReleasesOther {
    fn get_property(&self, property: Property) -> Option<f32> {
        self.inner.get_property(property)
    }

    fn set_property(&self, property: Property, value: f32) -> bool {
        self.inner.set_property(property, value)
    }

    fn bounds(&self) -> Option<Rect> {
        self.inner.bounds()
    }

    fn set_will_change(&self, active: bool) {
        if active && let Some(other) = self.other.borrow().as_ref() {
            other.destroy();
        }
    }
}

#[test]
fn test_binding_released_by_earlier_binding_never_fires() {
    let (env, scheduler) = setup();
    let viewport = Viewport::new(1280.0, 800.0);

    // 两个元素都在 80% 线之上，同一帧满足条件
    let a = Rc::new(ReleasesOther {
        inner: SimElement::new(Rect::new(0.0, 100.0, 800.0, 200.0)),
        other: RefCell::new(None),
    });
    let b = Rc::new(SimElement::new(Rect::new(0.0, 350.0, 800.0, 200.0)));
    let a_el: Rc<dyn Element> = a.clone();
    let b_el: Rc<dyn Element> = b.clone();

    let a_handle = scheduler.bind(
        Some(&a_el),
        fade_in_up(env.as_ref(), &FadeInUp::default()),
        ViewportCondition::default(),
        BindOptions::default(),
    );
    let b_handle = Rc::new(scheduler.bind(
        Some(&b_el),
        fade_in_up(env.as_ref(), &FadeInUp::default()),
        ViewportCondition::default(),
        BindOptions::default(),
    ));
    let a_id = a_handle.id().unwrap();
    let b_id = b_handle.id().unwrap();
    *a.other.borrow_mut() = Some(b_handle.clone());

    let events = scheduler.tick(DT, &viewport);
    assert!(events.contains(&BindingEvent::Fired(a_id)));
    assert!(!events.contains(&BindingEvent::Fired(b_id)));
    assert!(events.contains(&BindingEvent::Destroyed(b_id)));
    assert_eq!(b.value(Property::Opacity), 0.0);
    assert!(!b.will_change());
    assert_eq!(scheduler.live_count(), 1);
    assert_eq!(scheduler.state(&b_handle), Some(BindingState::Destroyed));

    for _ in 0..90 {
        let events = scheduler.tick(DT, &viewport);
        assert!(!events.contains(&BindingEvent::Fired(b_id)));
    }
    assert_eq!(b.value(Property::Opacity), 0.0);
    assert_eq!(a.inner.value(Property::Opacity), 1.0);
    drop(a_handle);
}

#[test]
fn test_toggling_reduced_motion_between_binds() {
    let (env, scheduler) = setup();

    let first = Rc::new(SimElement::new(Rect::new(0.0, 3000.0, 100.0, 100.0)));
    let first_el: Rc<dyn Element> = first.clone();
    let _a = scheduler.bind(
        Some(&first_el),
        fade_in_up(env.as_ref(), &FadeInUp::default()),
        ViewportCondition::default(),
        BindOptions::default(),
    );
    assert_eq!(first.value(Property::Opacity), 0.0);

    // 用户在运行中切换系统设置，新的查询立即生效
    env.set_reduced_motion(true);
    let second = Rc::new(SimElement::new(Rect::new(0.0, 3000.0, 100.0, 100.0)));
    let second_el: Rc<dyn Element> = second.clone();
    let _b = scheduler.bind(
        Some(&second_el),
        fade_in_up(env.as_ref(), &FadeInUp::default()),
        ViewportCondition::default(),
        BindOptions::default(),
    );
    assert_eq!(second.value(Property::Opacity), 1.0);
}
