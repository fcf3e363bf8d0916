use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use smt_document::{
    check_value, export, import, import_json, ExportOptions, Exporter, SubmodelElement,
};
use smt_model::{ElementKind, FieldValue, FlatValues, LangString};
use smt_test_utils as fixtures;
use std::collections::BTreeMap;

fn options() -> ExportOptions {
    ExportOptions::default()
}

#[test]
fn test_optional_empty_fields_are_omitted() {
    let tree = fixtures::tree(&fixtures::address());
    let values = fixtures::flat_values(&[("Address.Street", json!("Main St 1"))]);

    let result = export(&tree, &values, options()).unwrap();
    let json = serde_json::to_value(&result.submodel.submodel_elements).unwrap();

    assert_eq!(
        json,
        json!([{
            "modelType": "SubmodelElementCollection",
            "idShort": "Address",
            "value": [{
                "modelType": "Property",
                "idShort": "Street",
                "valueType": "xs:string",
                "value": "Main St 1"
            }]
        }])
    );
    assert!(result.is_conformant());
}

#[test]
fn test_include_empty_optional_keeps_every_field() {
    let tree = fixtures::tree(&fixtures::address());
    let result = export(
        &tree,
        &FlatValues::new(),
        options().with_include_empty_optional(true),
    )
    .unwrap();

    let address = result.submodel.find("Address").unwrap();
    let ids: Vec<_> = address.children().iter().filter_map(SubmodelElement::id_short).collect();
    assert_eq!(ids, vec!["Street", "City"]);
}

#[test]
fn test_required_empty_field_still_exported() {
    let tree = fixtures::tree(&fixtures::serial_and_tags());
    let result = export(&tree, &FlatValues::new(), options()).unwrap();

    assert_eq!(result.submodel.submodel_elements.len(), 1);
    match result.submodel.element("SerialNumber") {
        Some(SubmodelElement::Property(p)) => assert_eq!(p.value, None),
        other => panic!("unexpected element: {other:?}"),
    }
}

#[test]
fn test_repeatable_property_exports_as_list() {
    let tree = fixtures::tree(&fixtures::serial_and_tags());
    // Item 0 was removed in the form; only index 1 survives
    let values = fixtures::flat_values(&[("SerialNumber", json!("SN-1")), ("Tags.1", json!("b"))]);

    let result = export(&tree, &values, options()).unwrap();
    let Some(SubmodelElement::SubmodelElementList(tags)) = result.submodel.element("Tags") else {
        panic!("Tags should be a list");
    };

    assert_eq!(tags.type_value_list_element, ElementKind::Property);
    assert_eq!(tags.value.len(), 1);
    match &tags.value[0] {
        SubmodelElement::Property(p) => assert_eq!(p.value.as_deref(), Some("b")),
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(result.is_conformant());
}

#[test]
fn test_list_items_follow_form_order() {
    let tree = fixtures::tree(&fixtures::measurements());
    let values = fixtures::flat_values(&[
        ("Measurements.0.Value", json!(1.0)),
        ("Measurements.2.Value", json!(2.0)),
        ("Measurements.5.Value", json!(3.0)),
    ]);
    let order = BTreeMap::from([("Measurements".to_string(), vec![5, 0, 2])]);

    let result = Exporter::new(&tree)
        .with_index_order(&order)
        .export(&values)
        .unwrap();

    let list = result.submodel.find("Measurements").unwrap();
    let exported: Vec<_> = list
        .children()
        .iter()
        .map(|item| match &item.children()[0] {
            SubmodelElement::Property(p) => p.value.clone().unwrap_or_default(),
            other => panic!("unexpected child: {other:?}"),
        })
        .collect();
    assert_eq!(exported, vec!["3", "1", "2"]);
}

#[test]
fn test_ascending_order_without_form_order() {
    let tree = fixtures::tree(&fixtures::serial_and_tags());
    let values = fixtures::flat_values(&[("Tags.7", json!("z")), ("Tags.2", json!("y"))]);

    let result = export(&tree, &values, options()).unwrap();
    let tags = result.submodel.find("Tags").unwrap();
    let text: Vec<_> = tags
        .children()
        .iter()
        .map(|item| match item {
            SubmodelElement::Property(p) => p.value.clone().unwrap_or_default(),
            other => panic!("unexpected item: {other:?}"),
        })
        .collect();
    assert_eq!(text, vec!["y", "z"]);
}

#[test]
fn test_nested_arrays_export_per_item() {
    let tree = fixtures::tree(&fixtures::contacts());
    let values = fixtures::flat_values(&[
        ("Contacts.0.Name", json!("Ada")),
        ("Contacts.0.Phones.0", json!("111")),
        ("Contacts.0.Phones.1", json!("222")),
        ("Contacts.1.Name", json!("Bob")),
        ("Contacts.1.Phones.0", json!("333")),
    ]);

    let result = export(&tree, &values, options()).unwrap();

    let phones = result.submodel.find("Contacts.0.Phones").unwrap();
    assert_eq!(phones.children().len(), 2);
    let phones = result.submodel.find("Contacts.1.Phones").unwrap();
    assert_eq!(phones.children().len(), 1);
    assert!(result.is_conformant(), "{:?}", result.violations);

    // Import inverts the export for contiguous indices
    assert_eq!(import(&result.submodel), values);
}

#[test]
fn test_import_types_measurements_as_numbers() {
    let items: Vec<_> = [1, 2, 3]
        .iter()
        .map(|n| {
            json!({
                "modelType": "SubmodelElementCollection",
                "value": [{
                    "modelType": "Property",
                    "idShort": "Value",
                    "valueType": "xs:decimal",
                    "value": format!("{n}.5")
                }]
            })
        })
        .collect();
    let document = json!({
        "modelType": "Submodel",
        "id": "urn:quality:1",
        "idShort": "Quality",
        "submodelElements": [{
            "modelType": "SubmodelElementList",
            "idShort": "Measurements",
            "typeValueListElement": "SubmodelElementCollection",
            "value": items
        }]
    });

    let values = import_json(&document).unwrap();

    assert_eq!(values.len(), 3);
    assert_eq!(values.get("Measurements.0.Value"), Some(&FieldValue::Number(1.5)));
    assert_eq!(values.get("Measurements.1.Value"), Some(&FieldValue::Number(2.5)));
    assert_eq!(values.get("Measurements.2.Value"), Some(&FieldValue::Number(3.5)));
}

#[test]
fn test_multi_language_values_drop_empty_text() {
    let tree = fixtures::tree(&fixtures::nameplate());
    let values: FlatValues = [
        ("SerialNumber".to_string(), FieldValue::from("AB-12")),
        (
            "ManufacturerName".to_string(),
            FieldValue::LangStrings(vec![LangString::new("en", "Acme"), LangString::new("de", "")]),
        ),
    ]
    .into();

    let result = export(&tree, &values, options()).unwrap();
    match result.submodel.element("ManufacturerName") {
        Some(SubmodelElement::MultiLanguageProperty(mlp)) => {
            assert_eq!(mlp.value, vec![LangString::new("en", "Acme")]);
            assert_eq!(mlp.header.display_name[0].text, "Manufacturer name");
            assert!(mlp.header.qualifiers.is_empty());
        }
        other => panic!("unexpected element: {other:?}"),
    }
}

#[test]
fn test_integer_values_are_rounded() {
    let tree = fixtures::tree(&fixtures::nameplate());
    let values = fixtures::flat_values(&[("YearOfConstruction", json!(2023.6))]);

    let result = export(&tree, &values, options()).unwrap();
    match result.submodel.element("YearOfConstruction") {
        Some(SubmodelElement::Property(p)) => assert_eq!(p.value.as_deref(), Some("2024")),
        other => panic!("unexpected element: {other:?}"),
    }
}

#[test]
fn test_unsupported_kinds_warn_and_passthrough_kinds_copy() {
    let tree = fixtures::tree(&fixtures::all_kinds());
    let result = export(
        &tree,
        &FlatValues::new(),
        options().with_include_empty_optional(true),
    )
    .unwrap();

    let warned: Vec<_> = result.warnings.iter().map(|w| w.path.as_str()).collect();
    assert_eq!(warned, vec!["Calibrate", "Changed"]);
    assert!(result.submodel.element("Calibrate").is_none());
    assert!(result.submodel.element("Changed").is_none());

    let relationship = serde_json::to_value(result.submodel.element("Rel").unwrap()).unwrap();
    assert_eq!(relationship["first"]["keys"][0]["value"], "urn:a");
    assert!(result.submodel.element("CanWeld").is_some());

    match result.submodel.element("Manual") {
        Some(SubmodelElement::File(file)) => {
            assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
        }
        other => panic!("unexpected element: {other:?}"),
    }
    assert!(result.is_conformant(), "{:?}", result.violations);
}

#[test]
fn test_document_identity() {
    let tree = fixtures::tree(&fixtures::address());

    let kept = export(&tree, &FlatValues::new(), options()).unwrap().submodel;
    assert_eq!(kept.id, "https://example.com/ids/sm/Contact");
    assert_eq!(kept.kind.as_deref(), Some("Instance"));
    assert!(kept.semantic_id.is_some());

    let minted = export(&tree, &FlatValues::new(), options().with_generate_new_id(true))
        .unwrap()
        .submodel;
    assert!(minted.id.starts_with("urn:uuid:"));
    assert_eq!(minted.id_short, "Contact");
}

#[test]
fn test_schema_check_can_be_skipped() {
    let tree = fixtures::tree(&fixtures::address());
    let result = export(&tree, &FlatValues::new(), options().with_check_schema(false)).unwrap();
    assert!(result.violations.is_empty());
}

#[test]
fn test_non_conformant_document_reports_violations() {
    let document = json!({
        "modelType": "Submodel",
        "id": "",
        "idShort": "1bad",
        "submodelElements": [{"modelType": "Property", "idShort": "P"}]
    });
    let violations = check_value(&document).unwrap();
    assert!(violations.len() >= 3, "{violations:?}");
    assert!(violations.iter().any(|v| v.path == "/submodelElements/0"));
}

/// One generated `Samples` item: what the form holds and what import yields
fn sample() -> impl Strategy<Value = (FieldValue, FieldValue)> {
    prop_oneof![
        any::<i64>().prop_map(|i| (FieldValue::Integer(i), FieldValue::Integer(i))),
        "[1-9][0-9]{19,28}".prop_map(|digits| (FieldValue::from(format!("+{digits}")), FieldValue::from(digits))),
    ]
}

/// `(count, weight, sealed, samples)` of one batch
fn batch() -> impl Strategy<Value = (i64, Option<f64>, Option<bool>, Vec<(FieldValue, FieldValue)>)> {
    (
        any::<i64>(),
        prop::option::of(-1.0e9..1.0e9f64),
        prop::option::of(any::<bool>()),
        prop::collection::vec(sample(), 0..4),
    )
}

proptest! {
    #[test]
    fn prop_typed_nested_roundtrip(batches in prop::collection::vec(batch(), 1..4)) {
        let tree = fixtures::tree(&fixtures::readings());
        let mut values = FlatValues::new();
        let mut expected = FlatValues::new();
        for (i, (count, weight, sealed, samples)) in batches.into_iter().enumerate() {
            values.insert(format!("Batches.{i}.Count"), FieldValue::from(count.to_string()));
            expected.insert(format!("Batches.{i}.Count"), FieldValue::Integer(count));
            if let Some(weight) = weight {
                values.insert(format!("Batches.{i}.Weight"), FieldValue::Number(weight));
                expected.insert(format!("Batches.{i}.Weight"), FieldValue::Number(weight));
            }
            if let Some(sealed) = sealed {
                values.insert(format!("Batches.{i}.Sealed"), FieldValue::Bool(sealed));
                expected.insert(format!("Batches.{i}.Sealed"), FieldValue::Bool(sealed));
            }
            for (j, (input, imported)) in samples.into_iter().enumerate() {
                values.insert(format!("Batches.{i}.Samples.{j}"), input);
                expected.insert(format!("Batches.{i}.Samples.{j}"), imported);
            }
        }

        let result = export(&tree, &values, ExportOptions::default().with_check_schema(false)).unwrap();
        prop_assert_eq!(import(&result.submodel), expected);
    }

    #[test]
    fn prop_tags_roundtrip(tags in prop::collection::vec("[a-z]{1,8}", 0..6)) {
        let tree = fixtures::tree(&fixtures::serial_and_tags());
        let values: FlatValues = tags
            .iter()
            .enumerate()
            .map(|(i, t)| (format!("Tags.{i}"), FieldValue::from(t.as_str())))
            .collect();

        let result = export(&tree, &values, ExportOptions::default().with_check_schema(false)).unwrap();
        prop_assert_eq!(import(&result.submodel), values);
    }
}
