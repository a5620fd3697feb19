//! Tests for schema types.

use super::*;

const FILTER_SET_YAML: &str = r#"
id: filter-sweep
name: Filter sweep
rules:
  - id: open
    cooldown_seconds: 2
    conditions:
      - parameter_index: 0
        operator: ">="
        threshold: 0.75
      - parameter_index: 3
        operator: not_in
        threshold: [0, 1]
    actions:
      - type: set_parameter
        track_index: 1
        device_index: 0
        parameter_index: 4
        target_value: 0.9
      - type: send_osc
        data:
          address: /filter/open
          args: [1, 2]
"#;

#[test]
fn deserialize_document_with_defaults() {
    let doc: RuleSetDocument = serde_yaml::from_str(FILTER_SET_YAML).unwrap();
    assert_eq!(doc.id, "filter-sweep");
    assert_eq!(doc.name, "Filter sweep");
    assert!(doc.description.is_none());
    assert!(doc.enabled);
    assert_eq!(doc.rules.len(), 1);

    let rule = &doc.rules[0];
    assert_eq!(rule.name, "");
    assert!(rule.enabled);
    assert_eq!(rule.cooldown_seconds, 2.0);
    assert_eq!(rule.conditions[0].operator, ">=");
    assert_eq!(rule.conditions[0].threshold, Threshold::Number(0.75));
    assert_eq!(rule.conditions[1].threshold, Threshold::Set(vec![0.0, 1.0]));
}

#[test]
fn minimal_document() {
    let doc: RuleSetDocument = serde_yaml::from_str("id: empty\n").unwrap();
    assert!(doc.rules.is_empty());
    assert!(doc.enabled);
    assert_eq!(doc.name, "");
}

#[test]
fn unknown_top_level_key_is_rejected() {
    let yaml = format!("{FILTER_SET_YAML}schedule: nightly\n");
    assert!(serde_yaml::from_str::<RuleSetDocument>(&yaml).is_err());
}

#[test]
fn threshold_accessors() {
    let number = Threshold::from(0.5);
    assert_eq!(number.as_number(), Some(0.5));
    assert!(number.as_set().is_none());
    assert_eq!(number.type_name(), "number");

    let set = Threshold::from(vec![1.0, 2.0]);
    assert_eq!(set.as_set(), Some(&[1.0, 2.0][..]));
    assert!(set.as_number().is_none());
    assert_eq!(set.type_name(), "list");
}

#[test]
fn threshold_rejects_non_numeric() {
    assert!(serde_yaml::from_str::<Threshold>("high").is_err());
    assert!(serde_yaml::from_str::<Threshold>("[a, b]").is_err());
}

// ── Actions ─────────────────────────────────────────────────────────

#[test]
fn action_kind_views() {
    assert_eq!(
        Action::set_parameter(1, 0, 4, 0.9).kind(),
        ActionKind::SetParameter {
            track_index: 1,
            device_index: 0,
            parameter_index: 4,
            value: 0.9
        }
    );
    assert_eq!(
        Action::fire_clip(2, 3).kind(),
        ActionKind::FireClip {
            track_index: 2,
            clip_index: 3
        }
    );
    assert_eq!(
        Action::stop_clip(2, None).kind(),
        ActionKind::StopClip {
            track_index: 2,
            clip_index: None
        }
    );
    assert_eq!(Action::set_tempo(124.0).kind(), ActionKind::SetTempo { bpm: 124.0 });
}

#[test]
fn incomplete_known_action() {
    let mut action = Action::fire_clip(2, 3);
    action.clip_index = None;

    assert_eq!(action.missing_fields(), vec!["clip_index"]);
    assert_eq!(
        action.kind(),
        ActionKind::Incomplete {
            action_type: FIRE_CLIP,
            missing: "clip_index"
        }
    );
}

#[test]
fn custom_action_passes_through() {
    let doc: RuleSetDocument = serde_yaml::from_str(FILTER_SET_YAML).unwrap();
    let custom = &doc.rules[0].actions[1];

    assert!(custom.missing_fields().is_empty());
    match custom.kind() {
        ActionKind::Other { action_type, data } => {
            assert_eq!(action_type, "send_osc");
            let data = data.unwrap();
            assert_eq!(data["address"], "/filter/open");
            assert_eq!(data["args"], serde_json::json!([1, 2]));
        }
        other => panic!("expected pass-through action, got {other:?}"),
    }
}

#[test]
fn action_value_omits_unset_fields() {
    let value = Action::set_tempo(120.0).to_value().unwrap();
    assert_eq!(value, serde_json::json!({"type": "set_tempo", "target_value": 120.0}));
}

#[test]
fn action_unknown_field_is_rejected() {
    let yaml = "type: fire_clip\ntrack_index: 1\nclip: 2\n";
    assert!(serde_yaml::from_str::<Action>(yaml).is_err());
}
