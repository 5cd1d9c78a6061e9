//! MODS catalogue
//!
//! Schema definitions and typed objects for Library of Congress MODS
//! (Metadata Object Description Schema) records. Every type shares the
//! `mods` prefix bound to [`ns::MODS`]; the record type [`Mods`] binds the
//! `mods:mods` root element and names the published XSD as its schema
//! location.
//!
//! Attribute fields named `type` in MODS are exposed as `kind` accessors.
//!
//! ```
//! use xmlmapkit::mods::{Mods, Name, NamePart};
//! use xmlmapkit::XmlObject;
//!
//! let mut record = Mods::new().unwrap();
//! let mut author = Name::new().unwrap();
//! author.set_kind("personal").unwrap();
//! let mut part = NamePart::new().unwrap();
//! part.set_value("Doe, Jane").unwrap();
//! author.name_parts().append(part).unwrap();
//! record.names().append(author).unwrap();
//!
//! let names = record.names();
//! assert_eq!(names.len(), 1);
//! let first = names.get(0).unwrap();
//! assert_eq!(first.name_parts().get(0).unwrap().value().as_deref(), Some("Doe, Jane"));
//! ```

use crate::core::namespace::ns;
use crate::schema::{FieldSpec, SchemaDef};
use crate::{node_field, node_list_field, string_field, value_list_field, xml_object};

/// Published location of the MODS XSD
pub const MODS_SCHEMA_LOCATION: &str = "http://www.loc.gov/standards/mods/mods.xsd";

/// Namespace declarations shared by every MODS type
pub static BASE_MODS: SchemaDef = SchemaDef {
    name: "BaseMods",
    namespaces: &[(ns::MODS_PREFIX, ns::MODS)],
    ..SchemaDef::EMPTY
};

pub static MODS_ELEMENT: SchemaDef = SchemaDef {
    name: "ModsElement",
    extends: &[&BASE_MODS],
    fields: &[
        FieldSpec::string("name", "local-name(.)"),
        FieldSpec::string("value", "."),
    ],
    ..SchemaDef::EMPTY
};

pub static GENRE: SchemaDef = SchemaDef {
    name: "Genre",
    root: Some("mods:genre"),
    extends: &[&MODS_ELEMENT],
    fields: &[FieldSpec::string("authority", "@authority").choices(&["marcgt"])],
    ..SchemaDef::EMPTY
};

pub static IDENTIFIER: SchemaDef = SchemaDef {
    name: "Identifier",
    root: Some("mods:identifier"),
    extends: &[&MODS_ELEMENT],
    fields: &[FieldSpec::string("type", "@type")],
    ..SchemaDef::EMPTY
};

pub static LANGUAGE_TERM: SchemaDef = SchemaDef {
    name: "LanguageTerm",
    root: Some("mods:languageTerm"),
    extends: &[&MODS_ELEMENT],
    fields: &[FieldSpec::string("type", "@type").choices(&["text", "code"])],
    ..SchemaDef::EMPTY
};

pub static LANGUAGE: SchemaDef = SchemaDef {
    name: "Language",
    root: Some("mods:language"),
    extends: &[&BASE_MODS],
    fields: &[FieldSpec::node_list("terms", "mods:languageTerm", &LANGUAGE_TERM)],
    ..SchemaDef::EMPTY
};

pub static NAME_PART: SchemaDef = SchemaDef {
    name: "NamePart",
    root: Some("mods:namePart"),
    extends: &[&MODS_ELEMENT],
    fields: &[FieldSpec::string("type", "@type").choices(&[
        "family",
        "middle",
        "given",
        "termsOfAddress",
    ])],
    ..SchemaDef::EMPTY
};

pub static ROLE_TERM: SchemaDef = SchemaDef {
    name: "RoleTerm",
    root: Some("mods:roleTerm"),
    extends: &[&MODS_ELEMENT],
    fields: &[
        FieldSpec::string("authority", "@authority"),
        FieldSpec::string("type", "@type").choices(&["code", "text"]),
    ],
    ..SchemaDef::EMPTY
};

pub static ROLE: SchemaDef = SchemaDef {
    name: "Role",
    root: Some("mods:role"),
    extends: &[&BASE_MODS],
    fields: &[FieldSpec::node("role_term", "mods:roleTerm", &ROLE_TERM)],
    ..SchemaDef::EMPTY
};

pub static NAME: SchemaDef = SchemaDef {
    name: "Name",
    root: Some("mods:name"),
    extends: &[&BASE_MODS],
    fields: &[
        FieldSpec::string("display_form", "@displayForm"),
        FieldSpec::node_list("name_parts", "mods:namePart", &NAME_PART),
        FieldSpec::node_list("roles", "mods:role", &ROLE),
        FieldSpec::string("type", "@type").choices(&["personal", "corporate", "conference"]),
    ],
    ..SchemaDef::EMPTY
};

pub static NOTE: SchemaDef = SchemaDef {
    name: "Note",
    root: Some("mods:note"),
    extends: &[&BASE_MODS],
    fields: &[
        FieldSpec::string("display_label", "@displayLabel"),
        FieldSpec::string("type", "@type"),
        FieldSpec::string("value", "."),
    ],
    ..SchemaDef::EMPTY
};

pub static ORIGIN_INFO: SchemaDef = SchemaDef {
    name: "OriginInfo",
    root: Some("mods:originInfo"),
    extends: &[&BASE_MODS],
    fields: &[
        FieldSpec::string("date_captured", "mods:dateCaptured"),
        FieldSpec::string("date_issued", "mods:dateIssued"),
        FieldSpec::string("date_issued_keydate", "mods:dateIssued/@keyDate").choices(&["yes", "no"]),
        FieldSpec::string("place", "mods:place"),
        FieldSpec::string("place_term", "mods:place/mods:placeTerm"),
        FieldSpec::string("place_term_type", "mods:place/mods:placeTerm/@type"),
        FieldSpec::string("publisher", "mods:publisher"),
    ],
    ..SchemaDef::EMPTY
};

pub static PHYSICAL_DESCRIPTION: SchemaDef = SchemaDef {
    name: "PhysicalDescription",
    root: Some("mods:physicalDescription"),
    extends: &[&BASE_MODS],
    fields: &[
        FieldSpec::string("extent", "mods:extent"),
        FieldSpec::string("digital_origin", "mods:digitalOrigin"),
    ],
    ..SchemaDef::EMPTY
};

pub static SUBJECT: SchemaDef = SchemaDef {
    name: "Subject",
    root: Some("mods:subject"),
    extends: &[&BASE_MODS],
    fields: &[
        FieldSpec::string_list("geographics", "mods:geographic"),
        FieldSpec::string_list("names", "mods:name"),
        FieldSpec::string_list("temporals", "mods:temporal"),
        FieldSpec::string_list("topics", "mods:topic"),
    ],
    ..SchemaDef::EMPTY
};

pub static TITLE_INFO: SchemaDef = SchemaDef {
    name: "TitleInfo",
    root: Some("mods:titleInfo"),
    extends: &[&BASE_MODS],
    fields: &[
        FieldSpec::string("sub_title", "mods:subTitle"),
        FieldSpec::string("title", "mods:title").required(),
    ],
    ..SchemaDef::EMPTY
};

pub static TYPE_OF_RESOURCE: SchemaDef = SchemaDef {
    name: "TypeOfResource",
    root: Some("mods:typeOfResource"),
    extends: &[&BASE_MODS],
    fields: &[
        FieldSpec::string("collection", "@collection").choices(&["yes"]),
        FieldSpec::string("manuscript", "@manuscript").choices(&["no"]),
        FieldSpec::string("value", "."),
    ],
    ..SchemaDef::EMPTY
};

pub static ABSTRACT: SchemaDef = SchemaDef {
    name: "Abstract",
    root: Some("mods:abstract"),
    extends: &[&BASE_MODS],
    fields: &[
        FieldSpec::string("display_label", "@displayLabel"),
        FieldSpec::string("type", "@type"),
        FieldSpec::string("value", "."),
    ],
    ..SchemaDef::EMPTY
};

/// A single MODS record
pub static MODS: SchemaDef = SchemaDef {
    name: "Mods",
    root: Some("mods:mods"),
    extends: &[&BASE_MODS],
    schema_location: Some(MODS_SCHEMA_LOCATION),
    fields: &[
        FieldSpec::node_list("elements", "mods:*", &MODS_ELEMENT),
        FieldSpec::node("abstract", "mods:abstract", &ABSTRACT),
        FieldSpec::node("genre", "mods:genre", &GENRE),
        FieldSpec::node_list("identifiers", "mods:identifier", &IDENTIFIER),
        FieldSpec::node_list("languages", "mods:language", &LANGUAGE),
        FieldSpec::node_list("names", "mods:name", &NAME),
        FieldSpec::node_list("notes", "mods:note", &NOTE),
        FieldSpec::node("origin_info", "mods:originInfo", &ORIGIN_INFO),
        FieldSpec::node(
            "physical_description",
            "mods:physicalDescription",
            &PHYSICAL_DESCRIPTION,
        ),
        FieldSpec::node_list("subjects", "mods:subject", &SUBJECT),
        FieldSpec::node("title_info", "mods:titleInfo", &TITLE_INFO),
        FieldSpec::node("type_of_resource", "mods:typeOfResource", &TYPE_OF_RESOURCE),
    ],
    ..SchemaDef::EMPTY
};

/// Accessors every [`MODS_ELEMENT`] descendant inherits
macro_rules! element_accessors {
    ($($ty:ident),+) => {
        $(
            impl $ty {
                /// Local name of the element
                pub fn element_name(&self) -> Option<String> {
                    $crate::schema::XmlObject::handle(self).get_string("name")
                }

                string_field!(
                    /// Text content of the element
                    value, set_value, "value"
                );
            }
        )+
    };
}

xml_object! {
    /// Any MODS element, seen through its name and text
    pub struct ModsElement => MODS_ELEMENT;
}

xml_object! {
    /// `mods:genre`
    pub struct Genre => GENRE;
}

xml_object! {
    /// Repeatable `mods:identifier`
    pub struct Identifier => IDENTIFIER;
}

xml_object! {
    /// Repeatable `mods:languageTerm`
    pub struct LanguageTerm => LANGUAGE_TERM;
}

xml_object! {
    /// `mods:language`
    pub struct Language => LANGUAGE;
}

xml_object! {
    /// `mods:namePart`, child of `mods:name`
    pub struct NamePart => NAME_PART;
}

xml_object! {
    /// `mods:roleTerm`, child of `mods:role`
    pub struct RoleTerm => ROLE_TERM;
}

xml_object! {
    /// `mods:role`
    pub struct Role => ROLE;
}

xml_object! {
    /// `mods:name`
    pub struct Name => NAME;
}

xml_object! {
    /// `mods:note`
    pub struct Note => NOTE;
}

xml_object! {
    /// `mods:originInfo` with its place, publisher and date children
    pub struct OriginInfo => ORIGIN_INFO;
}

xml_object! {
    /// `mods:physicalDescription`
    pub struct PhysicalDescription => PHYSICAL_DESCRIPTION;
}

xml_object! {
    /// `mods:subject`
    pub struct Subject => SUBJECT;
}

xml_object! {
    /// `mods:titleInfo`
    pub struct TitleInfo => TITLE_INFO;
}

xml_object! {
    /// `mods:typeOfResource`
    pub struct TypeOfResource => TYPE_OF_RESOURCE;
}

xml_object! {
    /// `mods:abstract`
    pub struct Abstract => ABSTRACT;
}

xml_object! {
    /// A MODS record (`mods:mods`)
    pub struct Mods => MODS;
}

element_accessors!(ModsElement, Genre, Identifier, LanguageTerm, NamePart, RoleTerm);

impl Genre {
    string_field!(authority, set_authority, "authority");
}

impl Identifier {
    string_field!(kind, set_kind, "type");
}

impl LanguageTerm {
    string_field!(kind, set_kind, "type");
}

impl Language {
    node_list_field!(terms, LanguageTerm, "terms");
}

impl NamePart {
    string_field!(kind, set_kind, "type");
}

impl RoleTerm {
    string_field!(authority, set_authority, "authority");
    string_field!(kind, set_kind, "type");
}

impl Role {
    node_field!(role_term, create_role_term, set_role_term, RoleTerm, "role_term");
}

impl Name {
    string_field!(display_form, set_display_form, "display_form");
    node_list_field!(name_parts, NamePart, "name_parts");
    node_list_field!(roles, Role, "roles");
    string_field!(kind, set_kind, "type");
}

impl Note {
    string_field!(display_label, set_display_label, "display_label");
    string_field!(kind, set_kind, "type");
    string_field!(value, set_value, "value");
}

impl OriginInfo {
    string_field!(date_captured, set_date_captured, "date_captured");
    string_field!(date_issued, set_date_issued, "date_issued");
    string_field!(
        /// `keyDate` flag of `mods:dateIssued`
        date_issued_keydate, set_date_issued_keydate, "date_issued_keydate"
    );
    string_field!(place, set_place, "place");
    string_field!(place_term, set_place_term, "place_term");
    string_field!(place_term_type, set_place_term_type, "place_term_type");
    string_field!(publisher, set_publisher, "publisher");
}

impl PhysicalDescription {
    string_field!(extent, set_extent, "extent");
    string_field!(digital_origin, set_digital_origin, "digital_origin");
}

impl Subject {
    value_list_field!(geographics, "geographics");
    value_list_field!(names, "names");
    value_list_field!(temporals, "temporals");
    value_list_field!(topics, "topics");
}

impl TitleInfo {
    string_field!(sub_title, set_sub_title, "sub_title");
    string_field!(title, set_title, "title");
}

impl TypeOfResource {
    string_field!(collection, set_collection, "collection");
    string_field!(manuscript, set_manuscript, "manuscript");
    string_field!(value, set_value, "value");
}

impl Abstract {
    string_field!(display_label, set_display_label, "display_label");
    string_field!(kind, set_kind, "type");
    string_field!(value, set_value, "value");
}

impl Mods {
    node_list_field!(
        /// Every top-level MODS element, declared or not
        elements, ModsElement, "elements"
    );
    node_field!(r#abstract, create_abstract, set_abstract, Abstract, "abstract");
    node_field!(genre, create_genre, set_genre, Genre, "genre");
    node_list_field!(identifiers, Identifier, "identifiers");
    node_list_field!(languages, Language, "languages");
    node_list_field!(names, Name, "names");
    node_list_field!(notes, Note, "notes");
    node_field!(origin_info, create_origin_info, set_origin_info, OriginInfo, "origin_info");
    node_field!(
        physical_description,
        create_physical_description,
        set_physical_description,
        PhysicalDescription,
        "physical_description"
    );
    node_list_field!(subjects, Subject, "subjects");
    node_field!(title_info, create_title_info, set_title_info, TitleInfo, "title_info");
    node_field!(
        type_of_resource,
        create_type_of_resource,
        set_type_of_resource,
        TypeOfResource,
        "type_of_resource"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::XmlMapError;
    use crate::schema::{table_for, XmlObject};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_schema_resolves() {
        for def in [
            &MODS_ELEMENT,
            &GENRE,
            &IDENTIFIER,
            &LANGUAGE_TERM,
            &LANGUAGE,
            &NAME_PART,
            &ROLE_TERM,
            &ROLE,
            &NAME,
            &NOTE,
            &ORIGIN_INFO,
            &PHYSICAL_DESCRIPTION,
            &SUBJECT,
            &TITLE_INFO,
            &TYPE_OF_RESOURCE,
            &ABSTRACT,
            &MODS,
        ] {
            let table = table_for(def).unwrap();
            assert_eq!(table.namespaces().get_uri("mods"), Some(ns::MODS));
        }
    }

    #[test]
    fn test_element_fields_are_inherited_first() {
        let table = table_for(&GENRE).unwrap();
        assert_eq!(table.field_names(), vec!["name", "value", "authority"]);
        assert_eq!(
            table_for(&MODS).unwrap().schema_location(),
            Some(MODS_SCHEMA_LOCATION)
        );
    }

    #[test]
    fn test_genre_choice_is_enforced() {
        let mut genre = Genre::new().unwrap();
        genre.set_value("thesis").unwrap();
        let err = genre.set_authority("lcsh").unwrap_err();
        assert!(matches!(err, XmlMapError::ChoiceConstraint { .. }));
        genre.set_authority("marcgt").unwrap();
        assert_eq!(genre.element_name().as_deref(), Some("genre"));
        assert_eq!(genre.authority().as_deref(), Some("marcgt"));
    }

    #[test]
    fn test_origin_info_shares_containers() {
        let mut origin = OriginInfo::new().unwrap();
        origin.set_place_term("Colorado Springs, Colo.").unwrap();
        origin.set_place_term_type("text").unwrap();
        origin.set_date_issued("2011").unwrap();
        origin.set_date_issued_keydate("yes").unwrap();
        assert_eq!(origin.handle().child_elements().len(), 2);
        assert_eq!(origin.place().as_deref(), Some("Colorado Springs, Colo."));
        assert_eq!(origin.date_issued_keydate().as_deref(), Some("yes"));
    }
}
