//! End-to-end behavior of the mapping layer
//!
//! Covers list appends on parsed documents, creation of nested containers
//! on bare objects, validation reports, ordering, constraint enforcement and
//! round trips for every field kind.

use pretty_assertions::assert_eq;
use std::io::Write;
use xmlmapkit::mods::{Mods, Name, NamePart, OriginInfo, TitleInfo};
use xmlmapkit::schema::{FieldSpec, SchemaDef};
use xmlmapkit::validation::{FileSchemaLoader, RequiredFieldsValidator};
use xmlmapkit::{
    xml_object, ObjectState, ScalarType, SerializeOptions, ValidatorAdapter, XmlMapError,
    XmlObject, XmlValue,
};

const DOE: &str = r#"<mods:mods xmlns:mods="http://www.loc.gov/standards/mods/v3/"><mods:name type="personal"><mods:namePart>Doe, Jane</mods:namePart></mods:name></mods:mods>"#;

fn compact<T: XmlObject>(obj: &T) -> String {
    obj.serialize_with(&SerializeOptions::default().without_declaration())
        .unwrap()
}

#[test]
fn scenario_a_append_name_part() {
    let record = Mods::parse(DOE).unwrap();
    let name = record.names().get(0).unwrap();
    assert_eq!(name.kind().as_deref(), Some("personal"));
    assert_eq!(
        name.name_parts().get(0).unwrap().value().as_deref(),
        Some("Doe, Jane")
    );

    let mut given = NamePart::new().unwrap();
    given.set_kind("given").unwrap();
    given.set_value("Jane").unwrap();
    name.name_parts().append(given).unwrap();

    assert_eq!(
        name.name_parts().get(1).unwrap().kind().as_deref(),
        Some("given")
    );
    assert_eq!(
        compact(&record),
        r#"<mods:mods xmlns:mods="http://www.loc.gov/standards/mods/v3/"><mods:name type="personal"><mods:namePart>Doe, Jane</mods:namePart><mods:namePart type="given">Jane</mods:namePart></mods:name></mods:mods>"#
    );
}

#[test]
fn scenario_b_nested_container_created_once() {
    let mut origin = OriginInfo::new().unwrap();
    origin.set_publisher("Colorado College").unwrap();
    assert_eq!(
        compact(&origin),
        r#"<mods:originInfo xmlns:mods="http://www.loc.gov/standards/mods/v3/"><mods:publisher>Colorado College</mods:publisher></mods:originInfo>"#
    );

    let mut record = Mods::new().unwrap();
    record
        .create_origin_info()
        .unwrap()
        .set_publisher("Colorado College")
        .unwrap();
    record
        .origin_info()
        .unwrap()
        .set_date_issued("2011")
        .unwrap();
    assert_eq!(
        compact(&record),
        r#"<mods:mods xmlns:mods="http://www.loc.gov/standards/mods/v3/"><mods:originInfo><mods:dateIssued>2011</mods:dateIssued><mods:publisher>Colorado College</mods:publisher></mods:originInfo></mods:mods>"#
    );
}

#[test]
fn scenario_b_shared_intermediate_elements() {
    let mut origin = OriginInfo::new().unwrap();
    origin.set_place_term("Colorado Springs, Colo.").unwrap();
    origin.set_place_term_type("text").unwrap();
    let xml = compact(&origin);
    assert_eq!(xml.matches("<mods:place>").count(), 1);
    assert_eq!(xml.matches("<mods:placeTerm").count(), 1);
    assert!(xml.contains(r#"<mods:placeTerm type="text">Colorado Springs, Colo.</mods:placeTerm>"#));
}

#[test]
fn scenario_c_validation_reports_without_mutating() {
    let mut schema = tempfile::NamedTempFile::new().unwrap();
    write!(schema, "<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\"/>").unwrap();
    let location = schema.path().to_str().unwrap().to_string();

    let mut record = Mods::new().unwrap();
    record.set_title_info(TitleInfo::new().unwrap()).unwrap();
    let before = compact(&record);

    let adapter = ValidatorAdapter::new(FileSchemaLoader, RequiredFieldsValidator);
    let report = adapter.validate_at(&record, &location);
    assert!(!report.valid);
    assert!(!report.diagnostics.is_empty());
    assert_eq!(report.diagnostics[0].location, "/mods:mods[1]/mods:titleInfo[1]");
    assert_eq!(compact(&record), before);

    assert!(matches!(
        record.check_required(),
        Err(XmlMapError::MissingRequiredField { .. })
    ));
}

#[test]
fn scenario_c_remote_schema_is_reported() {
    let record = Mods::new().unwrap();
    let report = ValidatorAdapter::new(FileSchemaLoader, RequiredFieldsValidator).validate(&record);
    assert!(!report.valid);
    assert_eq!(
        report.diagnostics[0].location,
        "http://www.loc.gov/standards/mods/mods.xsd"
    );
}

#[test]
fn appended_items_keep_insertion_order() {
    let record = Mods::parse(DOE).unwrap();
    let name = record.names().get(0).unwrap();
    let values = ["Jane", "Q", "Doe", "Jr."];
    for value in values {
        let mut part = NamePart::new().unwrap();
        part.set_value(value).unwrap();
        name.name_parts().append(part).unwrap();
    }
    let read: Vec<String> = name
        .name_parts()
        .iter()
        .filter_map(|part| part.value())
        .collect();
    assert_eq!(read, vec!["Doe, Jane", "Jane", "Q", "Doe", "Jr."]);
}

#[test]
fn rejected_choice_leaves_tree_untouched() {
    let record = Mods::parse(DOE).unwrap();
    let before = compact(&record);
    let mut name = record.names().get(0).unwrap();

    let err = name.set_kind("family").unwrap_err();
    assert!(matches!(
        err,
        XmlMapError::ChoiceConstraint { ref field, ref value, .. } if field == "type" && value == "family"
    ));
    assert_eq!(compact(&record), before);

    let mut part = name.name_parts().get(0).unwrap();
    assert!(part.set_kind("nickname").is_err());
    assert_eq!(compact(&record), before);
}

#[test]
fn handles_taken_before_a_splice_keep_writing() {
    let record = Mods::parse(r#"<mods:mods xmlns:mods="http://www.loc.gov/standards/mods/v3/"/>"#).unwrap();
    let mut name = Name::new().unwrap();
    name.set_kind("personal").unwrap();
    let mut part = name.name_parts().append_new().unwrap();

    record.names().append(name).unwrap();
    part.set_value("Written after splice").unwrap();

    assert_eq!(part.state(), ObjectState::Attached);
    assert!(compact(&record).contains("<mods:namePart>Written after splice</mods:namePart>"));
}

#[test]
fn replacing_an_object_field_keeps_the_old_handle_attached() {
    let mut record = Mods::parse(
        r#"<mods:mods xmlns:mods="http://www.loc.gov/standards/mods/v3/"><mods:titleInfo><mods:title>Old</mods:title></mods:titleInfo></mods:mods>"#,
    )
    .unwrap();
    let mut old = record.title_info().unwrap();
    let mut fresh = TitleInfo::new().unwrap();
    fresh.set_title("New").unwrap();
    let placed = record.set_title_info(fresh).unwrap();

    assert_eq!(old.state(), ObjectState::Attached);
    assert_eq!(old.handle().node(), placed.handle().node());
    assert_eq!(old.title().as_deref(), Some("New"));
    old.set_sub_title("kept").unwrap();
    assert_eq!(
        compact(&record),
        r#"<mods:mods xmlns:mods="http://www.loc.gov/standards/mods/v3/"><mods:titleInfo><mods:subTitle>kept</mods:subTitle><mods:title>New</mods:title></mods:titleInfo></mods:mods>"#
    );
}

static SAMPLE: SchemaDef = SchemaDef {
    name: "Sample",
    root: Some("s:sample"),
    namespaces: &[("s", "urn:sample")],
    fields: &[
        FieldSpec::string("label", "s:label"),
        FieldSpec::integer("count", "@count"),
        FieldSpec::float("ratio", "s:stats/s:ratio"),
        FieldSpec::boolean("active", "s:stats/@active"),
        FieldSpec::string_list("tags", "s:tag"),
        FieldSpec::scalar_list("years", "s:year", ScalarType::Integer),
        FieldSpec::node("child", "s:child", &SAMPLE),
        FieldSpec::node_list("items", "s:item", &SAMPLE),
    ],
    ..SchemaDef::EMPTY
};

xml_object! {
    struct Sample => SAMPLE;
}

#[test]
fn every_field_kind_round_trips() {
    let mut sample = Sample::new().unwrap();
    let handle = sample.handle_mut();
    handle.set("label", "outer").unwrap();
    handle.set("count", 3).unwrap();
    handle.set("ratio", 0.5).unwrap();
    handle.set("active", true).unwrap();
    handle.values("tags").push("a").unwrap();
    handle.values("tags").push("b").unwrap();
    handle.values("years").push(1999).unwrap();
    handle.values("years").push(2011).unwrap();
    handle
        .object_or_create::<Sample>("child")
        .unwrap()
        .handle_mut()
        .set("label", "inner")
        .unwrap();
    for label in ["x", "y", "z"] {
        let mut item = Sample::new().unwrap();
        item.handle_mut().set("label", label).unwrap();
        handle.list::<Sample>("items").append(item).unwrap();
    }

    let reparsed = Sample::parse(&sample.serialize().unwrap()).unwrap();
    let r = reparsed.handle();
    assert_eq!(r.get("label"), Some(XmlValue::from("outer")));
    assert_eq!(r.get("count"), Some(XmlValue::Integer(3)));
    assert_eq!(r.get("ratio"), Some(XmlValue::Float(0.5)));
    assert_eq!(r.get("active"), Some(XmlValue::Boolean(true)));
    assert_eq!(r.values("tags").to_strings(), vec!["a", "b"]);
    assert_eq!(
        r.values("years").to_vec(),
        vec![XmlValue::Integer(1999), XmlValue::Integer(2011)]
    );
    assert_eq!(
        r.object::<Sample>("child").unwrap().handle().get_string("label"),
        Some("inner".to_string())
    );
    let labels: Vec<String> = r
        .list::<Sample>("items")
        .iter()
        .filter_map(|item| item.handle().get_string("label"))
        .collect();
    assert_eq!(labels, vec!["x", "y", "z"]);

    assert_eq!(r.get("label"), r.get("label"));
    assert_eq!(reparsed.serialize().unwrap(), sample.serialize().unwrap());
}

#[test]
fn type_mismatch_is_rejected_before_writing() {
    let mut sample = Sample::new().unwrap();
    let before = compact(&sample);
    let err = sample.handle_mut().set("count", "many").unwrap_err();
    assert!(matches!(err, XmlMapError::TypeCoercion { expected: "integer", .. }));
    assert!(sample.handle_mut().set("active", 2).is_err());
    assert_eq!(compact(&sample), before);
}

#[test]
fn undecodable_text_reads_as_absent() {
    let sample = Sample::parse(r#"<s:sample xmlns:s="urn:sample" count="three"><s:label>kept</s:label></s:sample>"#).unwrap();
    assert_eq!(sample.handle().get("count"), None);
    assert_eq!(sample.handle().get_string("label").as_deref(), Some("kept"));
}

#[test]
fn failed_object_assignment_changes_nothing() {
    let mut sample = Sample::new().unwrap();
    sample.handle_mut().set("label", "outer").unwrap();
    let item = sample.handle().list::<Sample>("items").append_new().unwrap();
    let before = compact(&sample);

    let err = sample.handle_mut().set_object("child", item).unwrap_err();
    assert!(matches!(err, XmlMapError::NotSupported(_)));
    assert_eq!(compact(&sample), before);

    let itself = sample.clone();
    assert!(sample.handle_mut().set_object("child", itself).is_err());
    assert_eq!(compact(&sample), before);
}
