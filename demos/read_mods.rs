//! Read a MODS record from a file
//!
//! This example parses a MODS record and prints its title, names, origin
//! information and subjects, then runs the required-field validator. Build
//! with `--features http` to fetch the MODS schema it declares.

use std::env;
use std::fs;

use xmlmapkit::mods::Mods;
use xmlmapkit::validation::RequiredFieldsValidator;
use xmlmapkit::{ValidationReport, ValidatorAdapter, XmlMapResult, XmlObject};

/// Validate against the published MODS schema
#[cfg(feature = "http")]
fn validate(record: &Mods) -> XmlMapResult<ValidationReport> {
    let loader = xmlmapkit::validation::HttpSchemaLoader::new()?;
    Ok(ValidatorAdapter::new(loader, RequiredFieldsValidator).validate(record))
}

/// Without the `http` feature the remote schema shows up as a diagnostic
#[cfg(not(feature = "http"))]
fn validate(record: &Mods) -> XmlMapResult<ValidationReport> {
    let loader = xmlmapkit::validation::FileSchemaLoader;
    Ok(ValidatorAdapter::new(loader, RequiredFieldsValidator).validate(record))
}

fn read_mods_from_file() -> Result<(), Box<dyn std::error::Error>> {
    // There should be only one argument: a path to a MODS file.
    let args: Vec<String> = env::args().collect();

    let path = match args.len() {
        2 => Ok(&args[1]),
        n => Err(format!(
            "expected 1 argument (file name), got {} arguments",
            n - 1
        )),
    }?;

    let record = Mods::parse(&fs::read_to_string(path)?)?;

    if let Some(title) = record.title_info().and_then(|t| t.title()) {
        println!("title = {}", title);
    }

    for (index, name) in record.names().iter().enumerate() {
        let parts: Vec<String> = name.name_parts().iter().filter_map(|p| p.value()).collect();
        let role = name
            .roles()
            .get(0)
            .and_then(|r| r.role_term())
            .and_then(|t| t.value());
        println!(
            "name[{}] ({}) = {} [{}]",
            index,
            name.kind().unwrap_or_default(),
            parts.join(" "),
            role.unwrap_or_default()
        );
    }

    if let Some(origin) = record.origin_info() {
        if let Some(publisher) = origin.publisher() {
            println!("publisher = {}", publisher);
        }
        if let Some(issued) = origin.date_issued() {
            println!("dateIssued = {}", issued);
        }
    }

    for subject in record.subjects().iter() {
        for topic in subject.topics().to_strings() {
            println!("topic = {}", topic);
        }
    }

    println!("top-level elements = {}", record.elements().len());

    let report = validate(&record)?;
    if report.valid {
        println!("record is complete");
    } else {
        for diagnostic in &report.diagnostics {
            println!("{}: {}", diagnostic.location, diagnostic.message);
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = read_mods_from_file() {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
}
