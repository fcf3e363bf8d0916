use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use smt_document::{import_json, ExportOptions, SubmodelElement};
use smt_form::{validate, FormController, FormError, REQUIRED_ITEMS_MESSAGE, REQUIRED_MESSAGE};
use smt_model::{FieldValue, FlatValues};
use smt_test_utils as fixtures;
use std::sync::Arc;

fn mount(template: &serde_json::Value, values: FlatValues) -> FormController {
    FormController::new(Arc::new(fixtures::tree(template)), values)
}

fn tag_values(form: &FormController) -> Vec<String> {
    let result = form.export(ExportOptions::default()).unwrap();
    result
        .submodel
        .find("Tags")
        .map(|tags| {
            tags.children()
                .iter()
                .filter_map(|item| match item {
                    SubmodelElement::Property(p) => p.value.clone(),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_required_scalar_reported_and_cleared() {
    let mut form = mount(&fixtures::serial_and_tags(), FlatValues::new());

    assert!(!form.validate_all());
    assert_eq!(form.error("SerialNumber"), Some(REQUIRED_MESSAGE));
    assert_eq!(form.error("Tags"), None);

    form.set_value("SerialNumber", FieldValue::from("SN-1")).unwrap();
    assert_eq!(form.error("SerialNumber"), None);
    assert!(form.validate_all());
}

#[test]
fn test_removing_first_tag_keeps_original_index() {
    let values = fixtures::flat_values(&[
        ("SerialNumber", json!("SN-1")),
        ("Tags.0", json!("A")),
        ("Tags.1", json!("B")),
    ]);
    let mut form = mount(&fixtures::serial_and_tags(), values);
    assert_eq!(form.items("Tags"), &[0, 1]);

    assert_eq!(form.remove_array_item("Tags", 0), Some(0));

    assert_eq!(form.items("Tags"), &[1]);
    assert_eq!(form.value("Tags.0"), None);
    assert_eq!(form.value("Tags.1"), Some(&FieldValue::from("B")));
    assert_eq!(tag_values(&form), vec!["B"]);
}

#[test]
fn test_remove_out_of_bounds_changes_nothing() {
    let values = fixtures::flat_values(&[("Tags.0", json!("A"))]);
    let mut form = mount(&fixtures::serial_and_tags(), values);

    assert_eq!(form.remove_array_item("Tags", 3), None);
    assert_eq!(form.items("Tags"), &[0]);
    assert!(!form.is_dirty());
}

#[test]
fn test_removal_purges_only_that_item() {
    let values = fixtures::flat_values(&[
        ("Contacts.0.Name", json!("Ada")),
        ("Contacts.0.Phones.0", json!("111")),
        ("Contacts.1.Name", json!("Bob")),
        ("Contacts.1.Phones.0", json!("222")),
        ("Contacts.10.Name", json!("Cy")),
        ("Contacts.10.Phones.0", json!("333")),
    ]);
    let mut form = mount(&fixtures::contacts(), values);
    form.set_touched("Contacts.1.Name");
    form.set_touched("Contacts.10.Name");
    form.set_error("Contacts.1.Phones.0", Some("bad".to_string()));

    assert_eq!(form.remove_array_item("Contacts", 1), Some(1));

    let keys: Vec<&str> = form.values().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["Contacts.0.Name", "Contacts.0.Phones.0", "Contacts.10.Name", "Contacts.10.Phones.0"]
    );
    assert!(form.errors().is_empty());
    assert!(!form.is_touched("Contacts.1.Name"));
    assert!(form.is_touched("Contacts.10.Name"));
    assert!(form.items("Contacts.1.Phones").is_empty());
    assert_eq!(form.items("Contacts.10.Phones"), &[0]);
}

#[test]
fn test_required_arrays_need_filled_items() {
    let mut form = mount(&fixtures::contacts(), FlatValues::new());

    assert!(!form.validate_all());
    assert_eq!(form.error("Contacts"), Some(REQUIRED_ITEMS_MESSAGE));
    assert_eq!(form.error("Contacts.0.Name"), Some(REQUIRED_MESSAGE));
    assert_eq!(form.error("Contacts.0.Phones"), Some(REQUIRED_ITEMS_MESSAGE));

    form.set_value("Contacts.0.Name", FieldValue::from("Ada")).unwrap();
    form.set_value("Contacts.0.Phones.0", FieldValue::from("111")).unwrap();
    assert!(form.validate_all());
    assert!(form.is_valid());
}

#[test]
fn test_validate_all_is_idempotent() {
    let values = fixtures::flat_values(&[
        ("SerialNumber", json!("lowercase")),
        ("YearOfConstruction", json!(3000)),
        ("Batch", json!("X")),
    ]);
    let mut form = mount(&fixtures::nameplate(), values);

    form.validate_all();
    let first = form.errors().clone();
    form.validate_all();

    assert_eq!(&first, form.errors());
    assert!(first.contains_key("SerialNumber"));
    assert!(first.contains_key("YearOfConstruction"));
    assert!(first.contains_key("Batch"));
    assert!(first.contains_key("ManufacturerName"));
}

#[test]
fn test_validate_all_drops_stale_errors() {
    let mut form = mount(&fixtures::serial_and_tags(), FlatValues::new());
    form.set_error("Tags.9", Some("stale".to_string()));
    form.set_value("SerialNumber", FieldValue::from("SN-1")).unwrap();

    assert!(form.validate_all());
    assert!(form.errors().is_empty());
}

#[test]
fn test_export_follows_reordered_items() {
    let values = fixtures::flat_values(&[
        ("SerialNumber", json!("SN-1")),
        ("Tags.0", json!("A")),
        ("Tags.1", json!("B")),
        ("Tags.2", json!("C")),
    ]);
    let mut form = mount(&fixtures::serial_and_tags(), values);

    assert!(form.reorder_array_item("Tags", 2, 0));
    assert!(!form.reorder_array_item("Tags", 0, 9));

    assert_eq!(form.items("Tags"), &[2, 0, 1]);
    assert_eq!(tag_values(&form), vec!["C", "A", "B"]);
}

#[test]
fn test_added_items_never_reuse_indices() {
    let mut form = mount(&fixtures::serial_and_tags(), FlatValues::new());
    let a = form.add_array_item("Tags").unwrap();
    let b = form.add_array_item("Tags").unwrap();
    form.remove_array_item("Tags", 1);
    let c = form.add_array_item("Tags").unwrap();

    assert_eq!((a, b, c), (0, 1, 2));
    assert_eq!(form.items("Tags"), &[0, 2]);
}

#[test]
fn test_late_write_does_not_revive_removed_item() {
    let values = fixtures::flat_values(&[("Tags.0", json!("A")), ("Tags.1", json!("B"))]);
    let mut form = mount(&fixtures::serial_and_tags(), values);
    form.remove_array_item("Tags", 1);

    let err = form.set_value("Tags.1", FieldValue::from("stale")).unwrap_err();
    assert!(matches!(err, FormError::RemovedItem(ref path) if path == "Tags.1"));
    assert_eq!(form.items("Tags"), &[0]);
    assert_eq!(form.value("Tags.1"), None);

    form.set_value("Tags.4", FieldValue::from("E")).unwrap();
    assert_eq!(form.items("Tags"), &[0, 4]);
    assert_eq!(form.add_array_item("Tags").unwrap(), 5);
}

#[test]
fn test_late_write_into_removed_group_is_rejected() {
    let values = fixtures::flat_values(&[
        ("Contacts.0.Name", json!("Ada")),
        ("Contacts.1.Name", json!("Bob")),
        ("Contacts.1.Phones.0", json!("222")),
    ]);
    let mut form = mount(&fixtures::contacts(), values);
    assert_eq!(form.remove_array_item("Contacts", 1), Some(1));

    assert!(form.set_value("Contacts.1.Phones.0", FieldValue::from("999")).is_err());
    assert_eq!(form.items("Contacts"), &[0]);
    assert!(form.items("Contacts.1.Phones").is_empty());
}

#[test]
fn test_imported_document_seeds_form() {
    let document = json!({
        "modelType": "Submodel",
        "id": "urn:quality:1",
        "idShort": "Quality",
        "submodelElements": [{
            "modelType": "SubmodelElementList",
            "idShort": "Measurements",
            "typeValueListElement": "SubmodelElementCollection",
            "value": [
                {"modelType": "SubmodelElementCollection", "value": [
                    {"modelType": "Property", "idShort": "Value", "valueType": "xs:decimal", "value": "1.5"}
                ]},
                {"modelType": "SubmodelElementCollection", "value": [
                    {"modelType": "Property", "idShort": "Value", "valueType": "xs:decimal", "value": "2"},
                    {"modelType": "Property", "idShort": "Unit", "valueType": "xs:string", "value": "mm"}
                ]}
            ]
        }]
    });
    let values = import_json(&document).unwrap();
    let mut form = mount(&fixtures::measurements(), values);

    assert_eq!(form.items("Measurements"), &[0, 1]);
    assert_eq!(form.value("Measurements.1.Value"), Some(&FieldValue::Number(2.0)));
    assert!(form.validate_all());

    let exported = form.export(ExportOptions::default()).unwrap();
    assert_eq!(exported.submodel.find("Measurements").unwrap().children().len(), 2);
    assert!(exported.is_conformant());
}

#[test]
fn test_choice_rule_shared_by_all_instances() {
    let mut form = mount(&fixtures::measurements(), FlatValues::new());
    form.set_value("Measurements.0.Unit", FieldValue::from("km")).unwrap();
    form.set_value("Measurements.3.Unit", FieldValue::from("cm")).unwrap();

    assert!(form.error("Measurements.0.Unit").is_some());
    assert_eq!(form.error("Measurements.3.Unit"), None);
    assert_eq!(form.items("Measurements"), &[0, 3]);
}

proptest! {
    #[test]
    fn prop_bounds_are_inclusive(n in 1800i64..2200) {
        let tree = fixtures::tree(&fixtures::nameplate());
        let element = tree.find("YearOfConstruction").unwrap();
        let error = validate(element, &FieldValue::Integer(n));
        prop_assert_eq!(error.is_none(), (1900..=2100).contains(&n));
    }
}
