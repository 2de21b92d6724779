//! Property tests for field error isolation
//!
//! Filling in one required field must remove exactly that field's error and
//! leave every other error untouched.

use proptest::prelude::*;
use serde_json::json;
use step_model::{FieldPath, StepFormData, StepTemplate, StepTypeId, StringTable, ViewMode};
use step_validation::{FieldRule, RuleSet, Validator};

const FIELDS: [&str; 4] = ["spec.url", "spec.method", "spec.body", "spec.owner"];

fn rules() -> RuleSet {
    FIELDS
        .iter()
        .fold(RuleSet::new(), |set, f| set.with(FieldRule::text(f, *f).required()))
}

proptest! {
    #[test]
    fn populating_one_field_clears_only_its_error(
        filled in proptest::collection::vec(any::<bool>(), FIELDS.len()),
        pick in 0..FIELDS.len(),
    ) {
        let strings = StringTable::english();
        let validator = Validator::new(&strings);
        let mut data = StepFormData::new(StepTypeId::new("Http")).with_spec(json!({}));
        for (field, is_filled) in FIELDS.iter().zip(&filled) {
            if *is_filled {
                data.set(&FieldPath::literal(field), json!("value")).unwrap();
            }
        }

        let before = validator.validate(&data, &rules(), &StepTemplate::empty(), ViewMode::Edit).unwrap();
        data.set(&FieldPath::literal(FIELDS[pick]), json!("now set")).unwrap();
        let after = validator.validate(&data, &rules(), &StepTemplate::empty(), ViewMode::Edit).unwrap();

        prop_assert!(!after.contains(FIELDS[pick]));
        for (i, field) in FIELDS.iter().enumerate() {
            if i != pick {
                prop_assert_eq!(before.get_str(field), after.get_str(field));
            }
        }
        prop_assert!(after.len() <= before.len());
    }
}

#[test]
fn empty_step_in_edit_mode_reports_base_fields() {
    let strings = StringTable::english();
    let data: StepFormData = serde_json::from_value(json!({
        "identifier": "", "name": "", "timeout": "", "type": "Http", "spec": {}
    }))
    .unwrap();
    let errors = Validator::new(&strings)
        .validate(&data, &RuleSet::step_base_default(), &StepTemplate::empty(), ViewMode::Edit)
        .unwrap();
    assert!(errors.contains("name"));
    assert!(errors.contains("identifier"));
    assert!(errors.contains("timeout"));

    let short = data.clone().with_timeout("9s");
    let errors = Validator::new(&strings)
        .validate(&short, &RuleSet::step_base_default(), &StepTemplate::empty(), ViewMode::Edit)
        .unwrap();
    assert_eq!(errors.get_str("timeout"), Some("Timeout must be at least 10s"));
}
