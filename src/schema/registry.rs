//! Schema registry
//!
//! This module flattens a [`SchemaDef`] and the definitions it extends into
//! one ordered [`SchemaTable`], merges namespace declarations and compiles
//! every field path. Tables are built once per definition and cached for the
//! process.

use crate::core::error::{XmlMapError, XmlMapResult};
use crate::core::namespace::NamespaceContext;
use crate::core::node::{Document, NodeId, QName};
use crate::core::xpath::{compile, CompiledPath, NameTest, Predicate, Step, Target};
use crate::schema::field::{FieldSpec, SchemaDef};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

// Global table cache keyed by definition address
static SCHEMA_TABLES: OnceLock<RwLock<HashMap<usize, Arc<SchemaTable>>>> = OnceLock::new();

/// A field with its path compiled against the schema's namespaces
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub spec: &'static FieldSpec,
    pub path: CompiledPath,
    /// Position in the flattened table
    pub index: usize,
}

impl ResolvedField {
    pub fn name(&self) -> &'static str {
        self.spec.name
    }
}

/// Flattened, resolved field table of one schema
#[derive(Debug)]
pub struct SchemaTable {
    def: &'static SchemaDef,
    fields: Vec<ResolvedField>,
    by_name: HashMap<&'static str, usize>,
    namespaces: NamespaceContext,
    root: Option<QName>,
    schema_location: Option<&'static str>,
}

impl SchemaTable {
    /// Name of the definition this table was built from
    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn def(&self) -> &'static SchemaDef {
        self.def
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.by_name.get(name).map(|index| &self.fields[*index])
    }

    /// Fields in table order
    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(ResolvedField::name).collect()
    }

    /// Merged namespace context used to compile the paths
    pub fn namespaces(&self) -> &NamespaceContext {
        &self.namespaces
    }

    /// Root element binding used for bare construction and parsing
    pub fn root(&self) -> Option<&QName> {
        self.root.as_ref()
    }

    pub fn schema_location(&self) -> Option<&'static str> {
        self.schema_location
    }

    /// Table order rank of `element`, found `prefix.len()` steps below the context
    ///
    /// A field ranks the element when its path starts with `prefix` and its
    /// next step names the element. Wildcard steps never rank elements.
    pub fn rank(&self, prefix: &[&Step], doc: &Document, element: NodeId) -> Option<usize> {
        let name = doc.name(element)?;
        self.fields.iter().find_map(|field| {
            let steps = child_steps(field.path.steps());
            if steps.len() <= prefix.len() || steps[..prefix.len()] != *prefix {
                return None;
            }
            let Step::Child { test, predicates } = steps[prefix.len()] else {
                return None;
            };
            if !matches!(test, NameTest::Name(_)) || !test.matches(name) {
                return None;
            }
            let attributes_match = predicates.iter().all(|predicate| match predicate {
                Predicate::Position(_) => true,
                Predicate::AttributeEquals { name, value } => {
                    doc.attribute(element, name.namespace.as_deref(), &name.local)
                        == Some(value.as_str())
                }
            });
            attributes_match.then_some(field.index)
        })
    }
}

/// Child steps of a path with `.` steps removed
pub(crate) fn child_steps(steps: &[Step]) -> Vec<&Step> {
    steps.iter().filter(|s| !matches!(s, Step::SelfNode)).collect()
}

fn get_schema_tables() -> &'static RwLock<HashMap<usize, Arc<SchemaTable>>> {
    SCHEMA_TABLES.get_or_init(|| RwLock::new(HashMap::new()))
}

fn cache_key(def: &'static SchemaDef) -> usize {
    def as *const SchemaDef as usize
}

fn cached(def: &'static SchemaDef) -> XmlMapResult<Option<Arc<SchemaTable>>> {
    let guard = get_schema_tables()
        .read()
        .map_err(|_| XmlMapError::InternalError("Schema registry lock poisoned".to_string()))?;
    Ok(guard.get(&cache_key(def)).cloned())
}

/// Get the resolved table for a schema, building it on first use
///
/// Building also resolves every schema reachable through object fields, so
/// a malformed path anywhere below `def` fails here. Tables are published
/// only once the whole reachable set has been built.
pub fn table_for(def: &'static SchemaDef) -> XmlMapResult<Arc<SchemaTable>> {
    if let Some(table) = cached(def)? {
        return Ok(table);
    }

    let mut pending = HashMap::new();
    build_reachable(def, &mut pending)?;

    let mut guard = get_schema_tables()
        .write()
        .map_err(|_| XmlMapError::InternalError("Schema registry lock poisoned".to_string()))?;
    for (key, table) in pending {
        guard.entry(key).or_insert(table);
    }
    guard
        .get(&cache_key(def))
        .cloned()
        .ok_or_else(|| XmlMapError::InternalError(format!("Table for '{}' was not built", def.name)))
}

/// Build `def` and every uncached schema its object fields lead to
fn build_reachable(
    def: &'static SchemaDef,
    pending: &mut HashMap<usize, Arc<SchemaTable>>,
) -> XmlMapResult<()> {
    let key = cache_key(def);
    if pending.contains_key(&key) || cached(def)?.is_some() {
        return Ok(());
    }
    let table = Arc::new(build_table(def)?);
    pending.insert(key, table.clone());
    for field in table.fields() {
        if let Some(nested) = field.spec.element_schema() {
            build_reachable(nested, pending)?;
        }
    }
    Ok(())
}

struct Flattened {
    fields: Vec<&'static FieldSpec>,
    namespaces: NamespaceContext,
    root: Option<&'static str>,
    schema_location: Option<&'static str>,
}

/// Collect inherited and own declarations
///
/// Parents are visited in declaration order; a name or prefix already
/// provided by an earlier parent is kept. The definition's own entries then
/// override inherited ones in place.
fn flatten(def: &'static SchemaDef) -> XmlMapResult<Flattened> {
    let mut fields: Vec<&'static FieldSpec> = Vec::new();
    let mut inherited = NamespaceContext::new();
    let mut root = None;
    let mut schema_location = None;

    for parent in def.extends {
        let flat = flatten(parent)?;
        for spec in flat.fields {
            if !fields.iter().any(|f| f.name == spec.name) {
                fields.push(spec);
            }
        }
        for (prefix, uri) in flat.namespaces.iter() {
            if inherited.get_uri(prefix).is_none() {
                inherited.insert(prefix, uri);
            }
        }
        root = root.or(flat.root);
        schema_location = schema_location.or(flat.schema_location);
    }

    for (i, spec) in def.fields.iter().enumerate() {
        if def.fields[..i].iter().any(|f| f.name == spec.name) {
            return Err(XmlMapError::BadParam(format!(
                "Field '{}' is declared twice in '{}'",
                spec.name, def.name
            )));
        }
        match fields.iter().position(|f| f.name == spec.name) {
            Some(pos) => fields[pos] = spec,
            None => fields.push(spec),
        }
    }

    let own: NamespaceContext = def.namespaces.iter().copied().collect();
    Ok(Flattened {
        fields,
        namespaces: NamespaceContext::merge(&inherited, &own),
        root: def.root.or(root),
        schema_location: def.schema_location.or(schema_location),
    })
}

fn build_table(def: &'static SchemaDef) -> XmlMapResult<SchemaTable> {
    let flat = flatten(def)?;

    let mut fields = Vec::with_capacity(flat.fields.len());
    let mut by_name = HashMap::with_capacity(flat.fields.len());
    for (index, spec) in flat.fields.into_iter().enumerate() {
        let path = compile(spec.path, &flat.namespaces).map_err(|err| match err {
            XmlMapError::BadXPath(msg) => {
                XmlMapError::BadXPath(format!("{}.{}: {}", def.name, spec.name, msg))
            }
            other => other,
        })?;
        if matches!(path.target(), Target::Function(_)) && spec.is_list() {
            return Err(XmlMapError::BadXPath(format!(
                "{}.{}: computed values cannot back a list",
                def.name, spec.name
            )));
        }
        if spec.element_schema().is_some() && !matches!(path.target(), Target::Elements) {
            return Err(XmlMapError::BadXPath(format!(
                "{}.{}: object fields must select elements",
                def.name, spec.name
            )));
        }
        by_name.insert(spec.name, index);
        fields.push(ResolvedField { spec, path, index });
    }

    let root = match flat.root {
        Some(root) => Some(resolve_root(def, root, &flat.namespaces)?),
        None => None,
    };

    debug!(
        schema = def.name,
        fields = fields.len(),
        namespaces = flat.namespaces.len(),
        "built schema table"
    );

    Ok(SchemaTable {
        def,
        fields,
        by_name,
        namespaces: flat.namespaces,
        root,
        schema_location: flat.schema_location,
    })
}

fn resolve_root(def: &SchemaDef, root: &str, namespaces: &NamespaceContext) -> XmlMapResult<QName> {
    let path = compile(root, namespaces)?;
    match (path.steps(), path.target()) {
        ([Step::Child { test: NameTest::Name(name), predicates }], Target::Elements)
            if predicates.is_empty() =>
        {
            Ok(name.clone())
        }
        _ => Err(XmlMapError::BadParam(format!(
            "Root binding '{}' of '{}' must be a single element name",
            root, def.name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::xpath::Target;

    static BASE: SchemaDef = SchemaDef {
        name: "Base",
        namespaces: &[("a", "urn:base-a"), ("b", "urn:base-b")],
        root: Some("a:item"),
        schema_location: Some("urn:schema"),
        fields: &[
            FieldSpec::string("first", "a:first"),
            FieldSpec::string("label", "@label"),
            FieldSpec::string("second", "a:second"),
        ],
        ..SchemaDef::EMPTY
    };

    static CHILD: SchemaDef = SchemaDef {
        name: "Child",
        extends: &[&BASE],
        namespaces: &[("a", "urn:child-a")],
        fields: &[
            FieldSpec::integer("label", "@label"),
            FieldSpec::string("third", "b:third"),
            FieldSpec::string("own", "a:own"),
        ],
        ..SchemaDef::EMPTY
    };

    static DUPLICATE: SchemaDef = SchemaDef {
        name: "Duplicate",
        fields: &[FieldSpec::string("x", "x"), FieldSpec::string("x", "y")],
        ..SchemaDef::EMPTY
    };

    static BROKEN_LEAF: SchemaDef = SchemaDef {
        name: "BrokenLeaf",
        fields: &[FieldSpec::string("bad", "nope:bad")],
        ..SchemaDef::EMPTY
    };

    static HAS_BROKEN_CHILD: SchemaDef = SchemaDef {
        name: "HasBrokenChild",
        fields: &[FieldSpec::node("leaf", "leaf", &BROKEN_LEAF)],
        ..SchemaDef::EMPTY
    };

    static GOOD_LEAF: SchemaDef = SchemaDef {
        name: "GoodLeaf",
        fields: &[FieldSpec::string("ok", "ok")],
        ..SchemaDef::EMPTY
    };

    static MIXED: SchemaDef = SchemaDef {
        name: "Mixed",
        fields: &[
            FieldSpec::node("good", "good", &GOOD_LEAF),
            FieldSpec::node("bad", "bad", &BROKEN_LEAF),
        ],
        ..SchemaDef::EMPTY
    };

    static CYCLE_A: SchemaDef = SchemaDef {
        name: "CycleA",
        fields: &[FieldSpec::node("b", "b", &CYCLE_B)],
        ..SchemaDef::EMPTY
    };

    static CYCLE_B: SchemaDef = SchemaDef {
        name: "CycleB",
        fields: &[FieldSpec::node_list("a", "a", &CYCLE_A)],
        ..SchemaDef::EMPTY
    };

    #[test]
    fn test_flattening_order_and_override() {
        let table = table_for(&CHILD).unwrap();
        assert_eq!(
            table.field_names(),
            vec!["first", "label", "second", "third", "own"]
        );
        let label = table.field("label").unwrap();
        assert_eq!(label.index, 1);
        assert_eq!(label.spec.scalar_type(), Some(crate::types::ScalarType::Integer));
    }

    #[test]
    fn test_child_namespace_shadows_parent_for_all_paths() {
        let table = table_for(&CHILD).unwrap();
        assert_eq!(table.namespaces().get_uri("a"), Some("urn:child-a"));
        assert_eq!(table.namespaces().get_uri("b"), Some("urn:base-b"));
        let own = table.field("own").unwrap();
        match &own.path.steps()[0] {
            Step::Child { test: NameTest::Name(name), .. } => {
                assert_eq!(name.namespace.as_deref(), Some("urn:child-a"))
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_root_and_location_are_inherited() {
        let table = table_for(&CHILD).unwrap();
        let root = table.root().unwrap();
        assert_eq!(root.local, "item");
        assert_eq!(root.namespace.as_deref(), Some("urn:child-a"));
        assert_eq!(table.schema_location(), Some("urn:schema"));
        assert!(matches!(table.field("label").unwrap().path.target(), Target::Attribute(_)));
    }

    #[test]
    fn test_tables_are_cached() {
        let first = table_for(&BASE).unwrap();
        let second = table_for(&BASE).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        assert!(matches!(table_for(&DUPLICATE), Err(XmlMapError::BadParam(_))));
    }

    #[test]
    fn test_nested_resolution_errors_surface_at_first_use() {
        assert!(matches!(table_for(&HAS_BROKEN_CHILD), Err(XmlMapError::BadXPath(_))));
        assert!(cached(&HAS_BROKEN_CHILD).unwrap().is_none());
    }

    #[test]
    fn test_failed_build_publishes_nothing() {
        assert!(matches!(table_for(&MIXED), Err(XmlMapError::BadXPath(_))));
        assert!(cached(&MIXED).unwrap().is_none());
        assert!(cached(&GOOD_LEAF).unwrap().is_none());
        assert!(table_for(&GOOD_LEAF).is_ok());
    }

    #[test]
    fn test_cyclic_schemas_resolve() {
        assert!(table_for(&CYCLE_A).is_ok());
        assert!(cached(&CYCLE_B).unwrap().is_some());
    }
}
