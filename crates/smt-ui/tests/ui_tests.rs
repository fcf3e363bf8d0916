use pretty_assertions::assert_eq;
use smt_test_utils as fixtures;
use smt_ui::{generate, ComponentKind};

#[test]
fn test_generation_is_stable() {
    let tree = fixtures::tree(&fixtures::all_kinds());
    assert_eq!(generate(&tree), generate(&tree));
}

#[test]
fn test_form_root_uses_submodel_id_short() {
    let ui = generate(&fixtures::tree(&fixtures::address()));
    assert_eq!(ui.root.component, ComponentKind::Form);
    assert_eq!(ui.root.props.label, "Contact");
    assert_eq!(ui.nodes().len(), 1);
}

#[test]
fn test_non_repeatable_group_renders_children_directly() {
    let ui = generate(&fixtures::tree(&fixtures::address()));
    let address = ui.find("Address").unwrap();

    assert_eq!(address.component, ComponentKind::CollectionGroup);
    assert!(address.array.is_none());
    let keys: Vec<&str> = address.children.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["Address.Street", "Address.City"]);
    assert!(address.children[0].props.required);
    assert!(!address.children[1].props.required);
}

#[test]
fn test_declared_list_stamps_item_template() {
    let ui = generate(&fixtures::tree(&fixtures::measurements()));
    let list = ui.find("Measurements").unwrap();

    assert_eq!(list.component, ComponentKind::ArrayContainer);
    assert_eq!(list.array.as_ref().unwrap().min_items, 1);
    assert_eq!(list.array.as_ref().unwrap().add_label, "Add Measurements");

    let item = list.stamp().unwrap();
    assert_eq!(item.component, ComponentKind::CollectionGroup);
    let value = &item.children[0];
    assert_eq!(value.key, "Measurements.Value");
    assert_eq!(value.component, ComponentKind::DecimalField);
    assert_eq!(item.children[1].component, ComponentKind::Select);
}

#[test]
fn test_read_only_kinds_and_access_mode() {
    let ui = generate(&fixtures::tree(&fixtures::all_kinds()));
    for key in ["Calibrate", "CanWeld", "Rel", "Changed"] {
        let node = ui.find(key).unwrap();
        assert_eq!(node.component, ComponentKind::ReadOnlyField, "{key}");
        assert!(node.props.read_only);
    }
    assert_eq!(ui.find("Part").unwrap().component, ComponentKind::EntityGroup);
    assert_eq!(ui.find("Part.Weight").unwrap().component, ComponentKind::DecimalField);
}

#[test]
fn test_ui_tree_serializes() {
    let ui = generate(&fixtures::tree(&fixtures::serial_and_tags()));
    let json = serde_json::to_value(&ui).unwrap();
    assert_eq!(json["root"]["component"], "form");
    assert_eq!(json["root"]["children"][1]["component"], "array_container");
    assert_eq!(json["root"]["children"][1]["children"][0]["component"], "text_field");
}
