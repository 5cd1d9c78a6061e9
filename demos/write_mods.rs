//! Build a MODS record from scratch
//!
//! This example assembles a thesis record out of detached objects, attaches
//! it to a document and writes the indented XML to stdout or to a file.

use std::env;
use std::fs;

use xmlmapkit::mods::{Genre, Mods, Name, NamePart, Role, RoleTerm, TypeOfResource};
use xmlmapkit::{SerializeOptions, XmlDocument, XmlMapResult, XmlObject};

fn author(family: &str, given: &str) -> XmlMapResult<Name> {
    let mut name = Name::new()?;
    name.set_kind("personal")?;
    for (kind, value) in [("family", family), ("given", given)] {
        let mut part = NamePart::new()?;
        part.set_kind(kind)?;
        part.set_value(value)?;
        name.name_parts().append(part)?;
    }

    let mut term = RoleTerm::new()?;
    term.set_authority("marcrelator")?;
    term.set_kind("text")?;
    term.set_value("creator")?;
    let mut role = Role::new()?;
    role.set_role_term(term)?;
    name.roles().append(role)?;
    Ok(name)
}

fn build_record() -> XmlMapResult<Mods> {
    let mut record = Mods::new()?;

    record
        .create_title_info()?
        .set_title("Asymmetric Behavior in the Stock Market")?;
    record.names().append(author("Doe", "Jane")?)?;

    let mut genre = Genre::new()?;
    genre.set_authority("marcgt")?;
    genre.set_value("thesis")?;
    record.set_genre(genre)?;

    let mut origin = record.create_origin_info()?;
    origin.set_publisher("Colorado College")?;
    origin.set_date_issued("2011")?;
    origin.set_place_term("Colorado Springs, Colo.")?;
    origin.set_place_term_type("text")?;

    let subject = record.subjects().append_new()?;
    subject.topics().push("Behavioral Economics")?;

    let mut resource = TypeOfResource::new()?;
    resource.set_value("text")?;
    record.set_type_of_resource(resource)?;

    record.check_required()?;
    Ok(record)
}

fn write_mods() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let doc = XmlDocument::new();
    let record = doc.set_root(build_record()?)?;
    let xml = record.serialize_with(&SerializeOptions::default().with_indent(2))?;

    match args.get(1) {
        Some(path) => {
            fs::write(path, &xml)?;
            println!("wrote {} bytes to {}", xml.len(), path);
        }
        None => println!("{}", xml),
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = write_mods() {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
}
