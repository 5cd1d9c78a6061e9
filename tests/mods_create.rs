//! Tests building a MODS thesis record from scratch

use pretty_assertions::assert_eq;
use xmlmapkit::mods::{
    Abstract, Genre, Identifier, Language, LanguageTerm, Mods, Name, NamePart, Note, OriginInfo,
    PhysicalDescription, Role, RoleTerm, TitleInfo, TypeOfResource,
};
use xmlmapkit::{ObjectState, XmlMapResult, XmlObject};

const ABSTRACT: &str = "The value and importance of diversity in one's portfolio has long been \
postulated, but it was Harry M. Markowitz who proposed the first mathematical model that would \
allow investors to systematically compute the optimal allocation of assets.";

const TITLE: &str =
    "Security Return Covariance Forecasting and Applications for Multi-Period Mean-Variance Formulation";

fn role(value: &str) -> XmlMapResult<Role> {
    let mut term = RoleTerm::new()?;
    term.set_authority("marcrt")?;
    term.set_kind("text")?;
    term.set_value(value)?;
    let mut role = Role::new()?;
    role.set_role_term(term)?;
    Ok(role)
}

fn part(kind: Option<&str>, value: &str) -> XmlMapResult<NamePart> {
    let mut part = NamePart::new()?;
    if let Some(kind) = kind {
        part.set_kind(kind)?;
    }
    part.set_value(value)?;
    Ok(part)
}

fn name(kind: &str, parts: &[(Option<&str>, &str)], role_value: &str) -> XmlMapResult<Name> {
    let mut entry = Name::new()?;
    entry.set_kind(kind)?;
    for (part_kind, value) in parts {
        entry.name_parts().append(part(*part_kind, value)?)?;
    }
    entry.roles().append(role(role_value)?)?;
    Ok(entry)
}

fn thesis() -> XmlMapResult<Mods> {
    let mut record = Mods::new()?;

    let mut summary = Abstract::new()?;
    summary.set_value(ABSTRACT)?;
    record.set_abstract(summary)?;

    let mut creator = name(
        "personal",
        &[(Some("given"), "Blair"), (Some("middle"), "M"), (Some("family"), "Sargent")],
        "creator",
    )?;
    creator.set_display_form("Sargent, Blair M.")?;
    record.names().append(creator)?;
    record
        .names()
        .append(name("personal", &[(None, "de Arauju, Pedro")], "advisor")?)?;
    record.names().append(name(
        "corporate",
        &[(None, "Department of Economics and Business")],
        "sponsor",
    )?)?;
    record
        .names()
        .append(name("corporate", &[(None, "Colorado College")], "degree grantor")?)?;

    let mut genre = Genre::new()?;
    genre.set_authority("marcgt")?;
    genre.set_value("thesis")?;
    record.set_genre(genre)?;

    let mut pid = Identifier::new()?;
    pid.set_kind("pid")?;
    pid.set_value("coccc:3156")?;
    record.identifiers().append(pid)?;

    let mut english = LanguageTerm::new()?;
    english.set_kind("code")?;
    english.set_value("EN")?;
    let language = Language::new()?;
    language.terms().append(english)?;
    record.languages().append(language)?;

    let mut note = Note::new()?;
    note.set_kind("thesis")?;
    note.set_value("Senior Thesis -- Colorado College")?;
    record.notes().append(note)?;

    let mut origin = OriginInfo::new()?;
    origin.set_date_captured("2011")?;
    origin.set_date_issued("2011")?;
    origin.set_date_issued_keydate("yes")?;
    origin.set_place_term("Colorado Springs, Colo.")?;
    origin.set_place_term_type("text")?;
    origin.set_publisher("Colorado College")?;
    record.set_origin_info(origin)?;

    let mut description = PhysicalDescription::new()?;
    description.set_extent("56 p. ill.")?;
    description.set_digital_origin("born digital")?;
    record.set_physical_description(description)?;

    let mut resource = TypeOfResource::new()?;
    resource.set_value("text")?;
    record.set_type_of_resource(resource)?;

    record.set_title_info(TitleInfo::new()?)?;
    record.title_info().expect("title info").set_title(TITLE)?;

    Ok(record)
}

#[test]
fn abstract_value() {
    let record = thesis().unwrap();
    assert_eq!(record.r#abstract().unwrap().value().as_deref(), Some(ABSTRACT));
}

#[test]
fn creator() {
    let record = thesis().unwrap();
    let creator = record.names().get(0).unwrap();
    assert_eq!(creator.kind().as_deref(), Some("personal"));
    assert_eq!(creator.display_form().as_deref(), Some("Sargent, Blair M."));
    let parts: Vec<(Option<String>, Option<String>)> = creator
        .name_parts()
        .iter()
        .map(|p| (p.kind(), p.value()))
        .collect();
    assert_eq!(
        parts,
        vec![
            (Some("given".to_string()), Some("Blair".to_string())),
            (Some("middle".to_string()), Some("M".to_string())),
            (Some("family".to_string()), Some("Sargent".to_string())),
        ]
    );
    let term = creator.roles().get(0).unwrap().role_term().unwrap();
    assert_eq!(term.value().as_deref(), Some("creator"));
    assert_eq!(term.kind().as_deref(), Some("text"));
    assert_eq!(term.authority().as_deref(), Some("marcrt"));
}

#[test]
fn advisor_department_institution() {
    let record = thesis().unwrap();
    let names = record.names();
    let expected = [
        ("personal", "de Arauju, Pedro", "advisor"),
        ("corporate", "Department of Economics and Business", "sponsor"),
        ("corporate", "Colorado College", "degree grantor"),
    ];
    for (i, (kind, part, role)) in expected.iter().enumerate() {
        let name = names.get(i + 1).unwrap();
        assert_eq!(name.kind().as_deref(), Some(*kind));
        assert_eq!(name.name_parts().get(0).unwrap().value().as_deref(), Some(*part));
        let term = name.roles().get(0).unwrap().role_term().unwrap();
        assert_eq!(term.value().as_deref(), Some(*role));
        assert_eq!(term.authority().as_deref(), Some("marcrt"));
    }
}

#[test]
fn genre_identifier_language() {
    let record = thesis().unwrap();
    let genre = record.genre().unwrap();
    assert_eq!(genre.authority().as_deref(), Some("marcgt"));
    assert_eq!(genre.value().as_deref(), Some("thesis"));

    let pid = record.identifiers().get(0).unwrap();
    assert_eq!(pid.kind().as_deref(), Some("pid"));
    assert_eq!(pid.value().as_deref(), Some("coccc:3156"));

    let term = record.languages().get(0).unwrap().terms().get(0).unwrap();
    assert_eq!(term.kind().as_deref(), Some("code"));
    assert_eq!(term.value().as_deref(), Some("EN"));
}

#[test]
fn notes_origin_description() {
    let record = thesis().unwrap();
    assert_eq!(
        record.notes().get(0).unwrap().value().as_deref(),
        Some("Senior Thesis -- Colorado College")
    );

    let origin = record.origin_info().unwrap();
    assert_eq!(origin.place_term_type().as_deref(), Some("text"));
    assert_eq!(origin.place_term().as_deref(), Some("Colorado Springs, Colo."));
    assert_eq!(origin.publisher().as_deref(), Some("Colorado College"));
    assert_eq!(origin.date_issued_keydate().as_deref(), Some("yes"));

    let description = record.physical_description().unwrap();
    assert_eq!(description.extent().as_deref(), Some("56 p. ill."));
    assert_eq!(description.digital_origin().as_deref(), Some("born digital"));
}

#[test]
fn title_and_type_of_resource() {
    let record = thesis().unwrap();
    assert_eq!(record.title_info().unwrap().title().as_deref(), Some(TITLE));
    assert_eq!(record.type_of_resource().unwrap().value().as_deref(), Some("text"));
    assert!(record.check_required().is_ok());
}

#[test]
fn built_record_is_detached_until_rooted() {
    let record = thesis().unwrap();
    assert_eq!(record.state(), ObjectState::Detached);
    assert_eq!(record.genre().unwrap().state(), ObjectState::Detached);

    let doc = xmlmapkit::XmlDocument::new();
    let record = doc.set_root(record).unwrap();
    assert_eq!(record.state(), ObjectState::Attached);
    assert_eq!(record.genre().unwrap().state(), ObjectState::Attached);
}

#[test]
fn children_follow_declaration_order() {
    let record = thesis().unwrap();
    let order: Vec<String> = record
        .handle()
        .child_elements()
        .into_iter()
        .map(|child| child.name.local)
        .collect();
    assert_eq!(
        order,
        vec![
            "abstract",
            "genre",
            "identifier",
            "language",
            "name",
            "name",
            "name",
            "name",
            "note",
            "originInfo",
            "physicalDescription",
            "titleInfo",
            "typeOfResource",
        ]
    );
}

#[test]
fn reparsed_record_matches() {
    let record = thesis().unwrap();
    let xml = record.serialize().unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<mods:mods xmlns:mods=\"http://www.loc.gov/standards/mods/v3/\">"));

    let reparsed = Mods::parse(&xml).unwrap();
    assert_eq!(reparsed.names().len(), 4);
    assert_eq!(reparsed.title_info().unwrap().title().as_deref(), Some(TITLE));
    assert_eq!(reparsed.serialize().unwrap(), xml);
}
