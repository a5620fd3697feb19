//! Tests for the rule set loader module.

use std::fs;

use tempfile::TempDir;

use super::*;
use crate::model::Operator;
use crate::schema::{Action, Threshold};

const VALID_SET_YAML: &str = r#"
id: energy
name: Energy automation
description: Drive the filter from the energy meter
rules:
  - id: open-filter
    name: Open filter on high energy
    cooldown_seconds: 1.5
    conditions:
      - parameter_index: 0
        operator: ">="
        threshold: 0.75
      - parameter_index: 2
        operator: in
        threshold: [1, 2]
    actions:
      - type: set_parameter
        track_index: 1
        device_index: 0
        parameter_index: 4
        target_value: 0.9
      - type: fire_clip
        track_index: 2
        clip_index: 3
        data:
          quantize: bar
  - id: close-filter
    enabled: false
    conditions:
      - parameter_index: 0
        operator: "<"
        threshold: 0.2
    actions:
      - type: set_parameter
        track_index: 1
        device_index: 0
        parameter_index: 4
        target_value: 0.1
"#;

fn temp_loader() -> (TempDir, RuleSetLoader) {
    let dir = TempDir::new().expect("create tempdir");
    let loader = RuleSetLoader::new(dir.path());
    (dir, loader)
}

fn loaded_ids(results: &[LoadResult]) -> Vec<&str> {
    results
        .iter()
        .filter_map(|r| r.ruleset().map(|s| s.id.as_str()))
        .collect()
}

#[test]
fn parse_full_document() {
    let set = parse_ruleset(VALID_SET_YAML).unwrap();
    assert_eq!(set.id, "energy");
    assert_eq!(set.name, "Energy automation");
    assert_eq!(set.description.as_deref(), Some("Drive the filter from the energy meter"));
    assert!(set.enabled);
    assert_eq!(set.len(), 2);

    let open = set.get_rule("open-filter").unwrap();
    assert_eq!(open.cooldown_seconds, 1.5);
    assert_eq!(open.conditions[0].operator, Operator::Gte);
    assert_eq!(open.conditions[1].threshold, Threshold::Set(vec![1.0, 2.0]));
    assert_eq!(open.actions.len(), 2);

    let close = set.get_rule("close-filter").unwrap();
    assert!(!close.enabled);
    assert_eq!(close.name, "close-filter");
}

#[test]
fn loaded_actions_round_trip_exactly() {
    let set = parse_ruleset(VALID_SET_YAML).unwrap();
    let fire = &set.get_rule("open-filter").unwrap().actions[1];

    let expected = Action::fire_clip(2, 3).with_data("quantize", "bar");
    assert_eq!(fire, &expected);

    let value = fire.to_value().unwrap();
    assert_eq!(
        value,
        serde_json::json!({"type": "fire_clip", "track_index": 2, "clip_index": 3, "data": {"quantize": "bar"}})
    );
    assert_eq!(&Action::from_value(value).unwrap(), fire);
}

#[test]
fn unknown_operator_rejects_whole_document() {
    let yaml = VALID_SET_YAML.replace("operator: \"<\"", "operator: less");
    match parse_ruleset(&yaml) {
        Err(RuleError::Invalid(report)) => {
            let errors: Vec<_> = report.errors().collect();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].path, "rules[1].conditions[0].operator");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn missing_required_fields_are_parse_errors() {
    let no_threshold = VALID_SET_YAML.replace("        threshold: 0.75\n", "");
    assert!(matches!(parse_ruleset(&no_threshold), Err(RuleError::Parse(_))));

    let no_operator = VALID_SET_YAML.replace("        operator: \">=\"\n", "");
    assert!(matches!(parse_ruleset(&no_operator), Err(RuleError::Parse(_))));

    let no_rule_id = VALID_SET_YAML.replace("  - id: close-filter\n    enabled", "  - enabled");
    assert!(matches!(parse_ruleset(&no_rule_id), Err(RuleError::Parse(_))));
}

#[test]
fn unknown_fields_are_rejected() {
    let yaml = VALID_SET_YAML.replace("cooldown_seconds: 1.5", "cooldown: 1.5");
    assert!(matches!(parse_ruleset(&yaml), Err(RuleError::Parse(_))));
}

#[test]
fn duplicate_rule_ids_reject_document() {
    let yaml = VALID_SET_YAML.replace("id: close-filter", "id: open-filter");
    let err = parse_ruleset(&yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate rule id 'open-filter'"));
}

#[test]
fn load_single_file_root() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("energy.yml");
    fs::write(&path, VALID_SET_YAML).unwrap();

    let mut loader = RuleSetLoader::new(&path);
    let results = loader.load_all().unwrap();
    assert_eq!(loaded_ids(&results), vec!["energy"]);
    assert!(loader.source_of("energy").is_some());
}

#[test]
fn load_all_skips_dotfiles_and_non_yaml() {
    let (dir, mut loader) = temp_loader();

    fs::write(dir.path().join("energy.yml"), VALID_SET_YAML).unwrap();
    fs::write(dir.path().join(".hidden.yml"), VALID_SET_YAML).unwrap();
    fs::write(dir.path().join("readme.txt"), "not a rule").unwrap();

    let results = loader.load_all().unwrap();

    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();

    assert_eq!(loaded_ids(&results), vec!["energy"]);
    assert_eq!(skipped, 2);
}

#[test]
fn load_all_recursive_in_path_order() {
    let (dir, mut loader) = temp_loader();

    fs::write(dir.path().join("b.yml"), VALID_SET_YAML.replace("id: energy", "id: second")).unwrap();
    let sub = dir.path().join("a-sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("first.yaml"), VALID_SET_YAML.replace("id: energy", "id: first")).unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(loaded_ids(&results), vec!["first", "second"]);
}

#[test]
fn bad_file_does_not_abort_scan() {
    let (dir, mut loader) = temp_loader();

    fs::write(dir.path().join("a.yml"), "id: broken\nrules: 7\n").unwrap();
    fs::write(dir.path().join("b.yml"), VALID_SET_YAML).unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(results.iter().filter(|r| r.is_failed()).count(), 1);
    assert_eq!(loaded_ids(&results), vec!["energy"]);
}

#[test]
fn missing_root_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut loader = RuleSetLoader::new(dir.path().join("nope.yml"));
    assert!(matches!(loader.load_all(), Err(RuleError::Io(_))));
}

#[test]
fn write_then_reload() {
    let (dir, mut loader) = temp_loader();
    let set = parse_ruleset(VALID_SET_YAML).unwrap();

    let path = loader.write_ruleset(&set).unwrap();
    assert_eq!(path.file_name().unwrap(), "energy.yml");
    assert!(!dir.path().join(".energy.tmp").exists());

    let reloaded = load_ruleset_file(&path).unwrap();
    assert_eq!(reloaded, set);
}

#[test]
fn write_requires_directory_root() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("energy.yml");
    fs::write(&path, VALID_SET_YAML).unwrap();

    let mut loader = RuleSetLoader::new(&path);
    let set = parse_ruleset(VALID_SET_YAML).unwrap();
    assert!(matches!(loader.write_ruleset(&set), Err(RuleError::Validation(_))));
}
