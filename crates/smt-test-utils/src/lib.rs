//! Testing utilities for the SMT forms workspace
//!
//! Template fixtures as raw JSON plus small builders for trees and values.

#![allow(missing_docs)]

use serde_json::{json, Value};
use smt_model::{ElementTree, FlatValues, TemplateParser};

pub fn qualifier(qualifier_type: &str, value: &str) -> Value {
    json!({"type": qualifier_type, "valueType": "xs:string", "value": value, "kind": "TemplateQualifier"})
}

pub fn cardinality(value: &str) -> Value {
    qualifier("SMT/Cardinality", value)
}

pub fn property(id_short: &str, value_type: &str, card: &str) -> Value {
    json!({
        "modelType": "Property",
        "idShort": id_short,
        "valueType": value_type,
        "qualifiers": [cardinality(card)]
    })
}

pub fn property_with(id_short: &str, value_type: &str, qualifiers: Vec<Value>) -> Value {
    json!({
        "modelType": "Property",
        "idShort": id_short,
        "valueType": value_type,
        "qualifiers": qualifiers
    })
}

pub fn collection(id_short: &str, card: &str, children: Vec<Value>) -> Value {
    json!({
        "modelType": "SubmodelElementCollection",
        "idShort": id_short,
        "qualifiers": [cardinality(card)],
        "value": children
    })
}

pub fn list_of(id_short: &str, card: &str, item: Value) -> Value {
    let type_value = item["modelType"].clone();
    json!({
        "modelType": "SubmodelElementList",
        "idShort": id_short,
        "typeValueListElement": type_value,
        "orderRelevant": true,
        "qualifiers": [cardinality(card)],
        "value": [item]
    })
}

pub fn submodel(id_short: &str, elements: Vec<Value>) -> Value {
    json!({
        "modelType": "Submodel",
        "kind": "Template",
        "id": format!("https://example.com/ids/sm/{id_short}"),
        "idShort": id_short,
        "semanticId": {
            "type": "ExternalReference",
            "keys": [{"type": "GlobalReference", "value": format!("https://example.com/smt/{id_short}/1/0")}]
        },
        "submodelElements": elements
    })
}

pub fn environment(submodel: Value) -> Value {
    json!({"assetAdministrationShells": [], "submodels": [submodel], "conceptDescriptions": []})
}

/// `SerialNumber` (One) and `Tags` (ZeroToMany)
pub fn serial_and_tags() -> Value {
    submodel(
        "Nameplate",
        vec![
            property("SerialNumber", "xs:string", "One"),
            property("Tags", "xs:string", "ZeroToMany"),
        ],
    )
}

/// `Address` collection with required `Street` and optional `City`
pub fn address() -> Value {
    submodel(
        "Contact",
        vec![collection(
            "Address",
            "One",
            vec![
                property("Street", "xs:string", "One"),
                property("City", "xs:string", "ZeroToOne"),
            ],
        )],
    )
}

/// `Measurements` list of collections with a decimal `Value`
pub fn measurements() -> Value {
    let item = json!({
        "modelType": "SubmodelElementCollection",
        "value": [
            property("Value", "xs:decimal", "One"),
            property_with(
                "Unit",
                "xs:string",
                vec![cardinality("ZeroToOne"), qualifier("SMT/FormChoices", "mm|cm|m")]
            )
        ]
    });
    submodel("Quality", vec![list_of("Measurements", "OneToMany", item)])
}

/// Repeatable `Contacts` group holding a required repeatable `Phones`
pub fn contacts() -> Value {
    submodel(
        "Contacts",
        vec![collection(
            "Contacts",
            "OneToMany",
            vec![
                property("Name", "xs:string", "One"),
                property("Phones", "xs:string", "OneToMany"),
            ],
        )],
    )
}

/// Repeatable `Batches` group of typed scalars with a declared `Samples`
/// list of unbounded integers
pub fn readings() -> Value {
    let samples = json!({
        "modelType": "SubmodelElementList",
        "idShort": "Samples",
        "typeValueListElement": "Property",
        "valueTypeListElement": "xs:integer",
        "orderRelevant": true,
        "qualifiers": [cardinality("ZeroToMany")],
        "value": [{"modelType": "Property", "valueType": "xs:integer"}]
    });
    submodel(
        "Readings",
        vec![collection(
            "Batches",
            "OneToMany",
            vec![
                property("Count", "xs:long", "One"),
                property("Weight", "xs:double", "ZeroToOne"),
                property("Sealed", "xs:boolean", "ZeroToOne"),
                samples,
            ],
        )],
    )
}

/// Nameplate-like template exercising constraints
pub fn nameplate() -> Value {
    submodel(
        "Nameplate",
        vec![
            property_with(
                "SerialNumber",
                "xs:string",
                vec![cardinality("One"), qualifier("SMT/AllowedValue", "[A-Z]{2}-\\d+")],
            ),
            json!({
                "modelType": "MultiLanguageProperty",
                "idShort": "ManufacturerName",
                "displayName": [{"language": "en", "text": "Manufacturer name"}],
                "description": [{"language": "en", "text": "Legally valid designation"}],
                "qualifiers": [cardinality("One"), qualifier("SMT/RequiredLang", "en")]
            }),
            property_with(
                "YearOfConstruction",
                "xs:int",
                vec![cardinality("ZeroToOne"), qualifier("SMT/AllowedRange", "[1900, 2100]")],
            ),
            property_with(
                "Batch",
                "xs:string",
                vec![
                    cardinality("ZeroToOne"),
                    qualifier("SMT/MinLength", "2"),
                    qualifier("SMT/MaxLength", "4"),
                ],
            ),
            property_with(
                "Revision",
                "xs:string",
                vec![cardinality("ZeroToOne"), qualifier("SMT/DefaultValue", "A")],
            ),
        ],
    )
}

/// One element of every supported kind
pub fn all_kinds() -> Value {
    submodel(
        "AllKinds",
        vec![
            property("Flag", "xs:boolean", "ZeroToOne"),
            property("Day", "xs:date", "ZeroToOne"),
            property("Stamp", "xs:dateTime", "ZeroToOne"),
            property("Clock", "xs:time", "ZeroToOne"),
            property("Link", "xs:anyURI", "ZeroToOne"),
            property("Raw", "xs:base64Binary", "ZeroToOne"),
            property("Count", "xs:integer", "ZeroToOne"),
            json!({"modelType": "MultiLanguageProperty", "idShort": "Title"}),
            json!({"modelType": "Range", "idShort": "Span", "valueType": "xs:double"}),
            json!({"modelType": "File", "idShort": "Manual", "contentType": "application/pdf"}),
            json!({"modelType": "Blob", "idShort": "Thumb", "contentType": "image/png"}),
            json!({"modelType": "ReferenceElement", "idShort": "Ref"}),
            json!({
                "modelType": "Entity",
                "idShort": "Part",
                "entityType": "SelfManagedEntity",
                "statements": [property("Weight", "xs:double", "ZeroToOne")]
            }),
            json!({"modelType": "Operation", "idShort": "Calibrate"}),
            json!({"modelType": "Capability", "idShort": "CanWeld"}),
            json!({
                "modelType": "RelationshipElement",
                "idShort": "Rel",
                "first": {"type": "ModelReference", "keys": [{"type": "Submodel", "value": "urn:a"}]},
                "second": {"type": "ModelReference", "keys": [{"type": "Submodel", "value": "urn:b"}]}
            }),
            json!({"modelType": "BasicEventElement", "idShort": "Changed"}),
        ],
    )
}

/// Template with one of each recoverable defect
pub fn malformed() -> Value {
    submodel(
        "Broken",
        vec![
            json!({"modelType": "Property", "valueType": "xs:string"}),
            json!({"modelType": "Hologram", "idShort": "Ghost"}),
            property_with(
                "Code",
                "xs:string",
                vec![cardinality("One"), qualifier("SMT/AllowedValue", "([a-z")],
            ),
            json!({"modelType": "SubmodelElementList", "idShort": "Empty"}),
            property("Twin", "xs:string", "One"),
            property("Twin", "xs:string", "One"),
            json!("not an element"),
        ],
    )
}

/// Parse a fixture; panics on failure
pub fn tree(template: &Value) -> ElementTree {
    TemplateParser::new()
        .parse(template)
        .expect("fixture should parse")
}

/// Flat values from `(key, json)` pairs; panics on unrepresentable values
pub fn flat_values(pairs: &[(&str, Value)]) -> FlatValues {
    pairs
        .iter()
        .map(|(key, value)| {
            let value = serde_json::from_value(value.clone()).expect("value should be a field value");
            ((*key).to_string(), value)
        })
        .collect()
}
