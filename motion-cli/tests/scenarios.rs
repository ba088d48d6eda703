//! 场景文件端到端测试

use std::fs;
use std::path::PathBuf;

use motion_cli::{Scenario, ScenarioError, run};
use motion_core::{CursorPhase, MotionConfig, Property};

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../scenarios")
        .join(name)
}

#[test]
fn test_landing_scenario() {
    let scenario = Scenario::load(scenario_path("landing.json")).unwrap();
    let report = run(&scenario, &MotionConfig::default()).unwrap();

    assert_eq!(report.name, "landing");
    assert!(report.policy.reduced_motion);
    assert!(!report.policy.is_mobile);

    // 首屏与滚动经过的区块都已完成
    let opacity = |id: &str| report.elements[id].properties.get(&Property::Opacity).copied();
    assert_eq!(opacity("hero-title"), Some(1.0));
    for card in ["feature-1", "feature-2", "feature-3"] {
        assert_eq!(opacity(card), Some(1.0), "{card}");
        assert!(!report.elements[card].will_change);
    }
    assert_eq!(opacity("faq"), Some(1.0));

    // 页脚从未进入视口
    assert_eq!(opacity("footer"), Some(0.0));
    assert!(
        !report
            .events
            .iter()
            .any(|e| e.animation == Some(4) && e.event == "fired")
    );

    // 减少动态效果下回到顶部是瞬时的
    assert_eq!(report.scroll_y, 0.0);

    let cursor = report.cursor.as_ref().unwrap();
    assert_eq!(cursor.phase, CursorPhase::Hidden);
    assert_eq!(cursor.label, None);

    assert_eq!(report.live_bindings, 5);

    // 错峰组作为一个整体触发并完成，且晚于首屏标题
    let stagger: Vec<&str> = report
        .events
        .iter()
        .filter(|e| e.animation == Some(2))
        .map(|e| e.event)
        .collect();
    assert_eq!(stagger, vec!["armed", "fired", "completed"]);
    let fired = |animation: usize| {
        report
            .events
            .iter()
            .find(|e| e.animation == Some(animation) && e.event == "fired")
            .map(|e| e.time)
    };
    assert!(fired(0).is_some());
    assert!(fired(0) < fired(2));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["elements"]["hero-title"]["properties"]["opacity"], 1.0);
    assert_eq!(json["events"][0]["event"], "armed");
    assert_eq!(json["cursor"]["phase"], "hidden");
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");
    fs::write(
        &path,
        r#"{
            "name": "tiny",
            "viewport": { "width": 375, "height": 700 },
            "elements": [
                { "id": "box", "rect": { "x": 0, "y": 50, "width": 375, "height": 200 } }
            ],
            "animations": [{ "targets": ["box"], "kind": { "type": "fade_scale" } }],
            "steps": [{ "action": "wait", "seconds": 1.5 }]
        }"#,
    )
    .unwrap();

    let scenario = Scenario::load(&path).unwrap();
    let report = run(&scenario, &MotionConfig::default()).unwrap();
    assert!(report.policy.is_mobile);
    assert_eq!(report.elements["box"].properties[&Property::Scale], 1.0);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Scenario::load(dir.path().join("missing.json"));
    assert!(matches!(result, Err(ScenarioError::Io(_))));
}
