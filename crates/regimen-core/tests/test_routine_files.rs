use regimen_core::companion::StepType;
use regimen_core::config::{EngineConfig, RootConfig, RoutineDefinition};

#[test]
fn test_demo_routine_parses() {
    let definition: RoutineDefinition =
        toml::from_str(include_str!("../../../demos/morning-routine.toml")).unwrap();

    assert_eq!(definition.routine.id, "morning-basic");
    let steps = definition.ordered_steps();
    assert_eq!(steps.len(), 5);
    assert_eq!(steps[0].id, "cleanse");
    assert!(steps[0].haptics);

    let serum = &steps[2];
    assert_eq!(serum.step_type, StepType::Timed);
    assert!(serum.is_timed());
    assert_eq!(serum.wait_seconds, Some(90));
    let engine = EngineConfig::default();
    assert_eq!(engine.max_seconds_for(serum), 300);
    assert_eq!(engine.max_seconds_for(&steps[1]), 600);
}

#[test]
fn test_demo_config_matches_defaults() {
    let config: RootConfig = toml::from_str(include_str!("../../../demos/config.toml")).unwrap();
    assert_eq!(config, RootConfig::default());
}
