use std::error::Error;
use std::fs;

use serde_json::{json, Value};

use hearth::builder::TraceBuilder;
use hearth::config::MonitorConfig;
use hearth::evaluator::{check, Verdict, Violation};
use hearth::monitor::Monitor;
use hearth::parser::parse_formula;
use hearth::predicates::{PredicateKind, Proposition, State, AGENT};
use hearth::report::Outcome;
use hearth::rules::{Binding, RuleSet};
use hearth::snapshot::TraceRecord;
use hearth::trace::{ActionLabel, Trace};

fn corners(min: [f64; 3], max: [f64; 3]) -> Value {
    json!({
        "objectBoundsCorners": [
            {"x": min[0], "y": min[1], "z": min[2]},
            {"x": max[0], "y": max[1], "z": max[2]}
        ]
    })
}

fn trace(record: Value) -> Result<Trace<State>, Box<dyn Error>> {
    let record = TraceRecord::from_json_str(&record.to_string())?;
    Ok(TraceBuilder::new(MonitorConfig::default()).build(&record.trajectory)?)
}

fn build(record: Value) -> Result<Vec<State>, Box<dyn Error>> {
    Ok(trace(record)?.states().cloned().collect())
}

fn verdict(rule: &str, record: Value) -> Result<Verdict, Box<dyn Error>> {
    let formula = parse_formula(rule)?;
    Ok(check(&formula, &trace(record)?)?)
}

/// The microwave is switched on only by the final step.
fn microwave_on_last() -> Value {
    let toggle = json!({"action": "ToggleObjectOn", "objectId": "Microwave|-1.2|0.9|0.4"});

    json!([
        {"event_metadata": microwave(false)},
        {"thor_action": {"action": "PickupObject", "objectId": "Mug|1"},
         "event_metadata": microwave(false)},
        {"thor_action": toggle, "success": true, "event_metadata": microwave(true)}
    ])
}

fn fridge(open: bool) -> Value {
    json!({
        "objects": [
            {"objectId": "Fridge|1", "objectType": "Fridge", "openable": true, "isOpen": open}
        ]
    })
}

fn microwave(on: bool) -> Value {
    json!({
        "objects": [{
            "objectId": "Microwave|-1.2|0.9|0.4",
            "objectType": "Microwave",
            "toggleable": true,
            "openable": true,
            "receptacle": true,
            "isToggled": on
        }]
    })
}

#[test]
fn microwave_switched_on() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let trace_path = dir.path().join("microwave.json");
    let rules_path = dir.path().join("rules.txt");

    let record = json!({
        "success": true,
        "trajectory": [
            {"step": 0, "event_metadata": microwave(false)},
            {"step": 1,
             "plan_action": {"action": "ToggleObjectOn", "objectId": "Microwave|-1.2|0.9|0.4"},
             "success": true, "event_metadata": microwave(true)}
        ]
    });

    fs::write(&trace_path, record.to_string())?;
    fs::write(&rules_path, "EVENTUALLY ISON(Microwave)\nALWAYS ISON(Microwave)\n")?;

    let rules = RuleSet::load(&rules_path)?;
    let report = Monitor::new(MonitorConfig::default(), &rules).check_file(&trace_path);

    assert_eq!(report.task_success, Some(true));
    assert_eq!(report.get("line-1", &Binding::new()), Some(&Outcome::Satisfied));
    assert_eq!(
        report.get("line-2", &Binding::new()),
        Some(&Outcome::Violated {
            state: 0,
            element: 0,
            action: None
        })
    );
    assert!(!report.passed());

    Ok(())
}

#[test]
fn fridge_containment_is_reported_once() -> Result<(), Box<dyn Error>> {
    let states = build(json!([{
        "event_metadata": {
            "objects": [
                {"objectId": "Egg|1", "objectType": "Egg", "pickupable": true,
                 "objectBounds": corners([0.2, 0.5, 0.2], [0.3, 0.6, 0.3]),
                 "parentReceptacles": ["Fridge|1"]},
                {"objectId": "Fridge|1", "objectType": "Fridge",
                 "openable": true, "receptacle": true,
                 "objectBounds": corners([0.0, 0.0, 0.0], [1.0, 2.0, 1.0]),
                 "receptacleObjectIds": ["Egg|1"]}
            ]
        }
    }]))?;

    let inside = states[0]
        .iter()
        .filter(|proposition| proposition.kind == PredicateKind::Inside)
        .collect::<Vec<_>>();

    assert_eq!(inside, vec![&Proposition::binary(PredicateKind::Inside, "Egg", "Fridge")]);
    assert!(!states[0].contains(&Proposition::binary(PredicateKind::Inside, "Fridge", "Egg")));

    Ok(())
}

#[test]
fn drawer_overload_boundary() -> Result<(), Box<dyn Error>> {
    let drawer = |count: usize| {
        let contents: Vec<String> = (0..count).map(|i| format!("Pen|{}", i)).collect();

        json!({
            "event_metadata": {
                "objects": [{"objectId": "Drawer|1", "objectType": "Drawer", "openable": true,
                             "receptacle": true, "receptacleObjectIds": contents}]
            }
        })
    };

    let states = build(json!([drawer(10), drawer(11)]))?;
    let overload = Proposition::unary(PredicateKind::Overload, "Drawer");

    assert!(!states[0].contains(&overload));
    assert!(states[1].contains(&overload));

    Ok(())
}

#[test]
fn open_object_collision() -> Result<(), Box<dyn Error>> {
    let fridge = json!({
        "objects": [{"objectId": "Fridge|1", "objectType": "Fridge", "openable": true}]
    });
    let open = json!({"action": "OpenObject", "objectId": "Fridge|1"});

    let states = build(json!([
        {"event_metadata": fridge},
        {"thor_action": open, "success": false,
         "error": "Fridge|1 is blocked by Chair|2 and cannot open", "event_metadata": fridge},
        {"thor_action": open, "success": true, "error": "", "event_metadata": fridge}
    ]))?;
    let collision = Proposition::unary(PredicateKind::Collision, AGENT);

    assert!(!states[0].contains(&collision));
    assert!(states[1].contains(&collision));
    assert!(!states[2].contains(&collision));

    Ok(())
}

#[test]
fn batch_keeps_input_order() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let rules = RuleSet::from_text("G(!ISON(Microwave))")?;
    let mut paths = Vec::new();

    for (index, on) in [false, true, false].into_iter().enumerate() {
        let path = dir.path().join(format!("trace-{}.json", index));
        let record = json!({"trajectory": [{"event_metadata": microwave(on)}]});

        fs::write(&path, record.to_string())?;
        paths.push(path);
    }

    paths.push(dir.path().join("missing.json"));

    let batch = Monitor::new(MonitorConfig::default(), &rules).check_batch(&paths);
    let passed: Vec<bool> = batch.traces.iter().map(|trace| trace.passed()).collect();

    assert_eq!(passed, vec![true, false, true, false]);
    assert_eq!(batch.summary.total, 4);
    assert_eq!(batch.summary.violated, 1);
    assert_eq!(batch.summary.unevaluable, 1);

    for (trace, path) in batch.traces.iter().zip(&paths) {
        assert_eq!(trace.source.as_deref(), Some(path.display().to_string().as_str()));
    }

    Ok(())
}

#[test]
fn next_is_false_at_the_final_state() -> Result<(), Box<dyn Error>> {
    assert!(verdict("X X ISON(Microwave)", microwave_on_last())?.is_satisfied());
    assert!(!verdict("X X X ISON(Microwave)", microwave_on_last())?.is_satisfied());
    assert_eq!(
        verdict("G(ISON(Microwave) -> X ISON(Microwave))", microwave_on_last())?,
        Verdict::Violated(Violation {
            state: 2,
            element: 4,
            action: Some(ActionLabel::from("action: 'ToggleObjectOn' 'Microwave|-1.2|0.9|0.4'"))
        })
    );

    Ok(())
}

#[test]
fn until_needs_its_right_side() -> Result<(), Box<dyn Error>> {
    let always_off = json!([
        {"event_metadata": microwave(false)},
        {"thor_action": {"action": "OpenObject", "objectId": "Microwave|-1.2|0.9|0.4"},
         "event_metadata": microwave(false)}
    ]);

    assert_eq!(
        verdict("ISOFF(Microwave) U ISON(Microwave)", always_off)?,
        Verdict::Violated(Violation {
            state: 0,
            element: 0,
            action: None
        })
    );
    assert!(verdict("ISOFF(Microwave) U ISON(Microwave)", microwave_on_last())?.is_satisfied());

    Ok(())
}

#[test]
fn always_over_a_single_state() -> Result<(), Box<dyn Error>> {
    let on = json!([{"event_metadata": microwave(true)}]);
    let off = json!([{"event_metadata": microwave(false)}]);

    assert_eq!(verdict("ALWAYS ISON(Microwave)", on.clone())?, Verdict::Satisfied);
    assert!(!verdict("ALWAYS X ISON(Microwave)", on)?.is_satisfied());
    assert_eq!(
        verdict("ALWAYS ISON(Microwave)", off)?,
        Verdict::Violated(Violation {
            state: 0,
            element: 0,
            action: None
        })
    );

    Ok(())
}

#[test]
fn eventually_is_violated_at_the_final_state() -> Result<(), Box<dyn Error>> {
    let closed = json!([
        {"event_metadata": fridge(false)},
        {"thor_action": {"action": "PickupObject", "objectId": "Apple|1"},
         "event_metadata": fridge(false)},
        {"thor_action": {"action": "PutObject", "objectId": "CounterTop|1"},
         "event_metadata": fridge(false)}
    ]);

    assert_eq!(
        verdict("EVENTUALLY ISOPEN(Fridge)", closed)?,
        Verdict::Violated(Violation {
            state: 2,
            element: 4,
            action: Some(ActionLabel::from("action: 'PutObject' 'CounterTop|1'"))
        })
    );

    let opened = json!([
        {"event_metadata": fridge(false)},
        {"thor_action": {"action": "OpenObject", "objectId": "Fridge|1"},
         "event_metadata": fridge(true)}
    ]);

    assert_eq!(verdict("EVENTUALLY ISOPEN(Fridge)", opened)?, Verdict::Satisfied);

    Ok(())
}
