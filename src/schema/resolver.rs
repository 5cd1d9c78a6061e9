//! Field resolver
//!
//! Translates one resolved field evaluated against one context element into
//! a decoded value (read) or a committed mutation (write).
//!
//! Writes that need structure which does not exist yet build the missing
//! chain of elements detached from the tree and insert it in a single step,
//! after every check that can fail has passed. The chain is placed among the
//! context's children according to the order of the fields in the table.

use crate::core::error::{XmlMapError, XmlMapResult};
use crate::core::node::{Document, NodeId};
use crate::core::xpath::{NameTest, PathMatch, Predicate, Step, Target};
use crate::schema::registry::{child_steps, ResolvedField, SchemaTable};
use crate::types::value::{ScalarType, XmlValue};
use tracing::{debug, warn};

/// Text of a path match: string value of an element, attribute value or computed value
pub(crate) fn match_text(doc: &Document, found: &PathMatch) -> Option<String> {
    match found {
        PathMatch::Element(id) => Some(doc.text_content(*id)),
        PathMatch::Attribute { owner, name } => doc
            .attribute(*owner, name.namespace.as_deref(), &name.local)
            .map(str::to_string),
        PathMatch::Value(value) => Some(value.clone()),
    }
}

/// Decode one match as the field's scalar type
pub(crate) fn decode_match(doc: &Document, field: &ResolvedField, found: &PathMatch) -> Option<XmlValue> {
    let ty = field.spec.scalar_type().unwrap_or(ScalarType::String);
    let text = match_text(doc, found)?;
    let value = ty.decode(&text);
    if value.is_none() {
        warn!(
            field = field.name(),
            expected = ty.name(),
            text = %text,
            "stored text does not decode as the field type"
        );
    }
    value
}

/// Read a scalar field: the first match decoded, or `None`
pub(crate) fn read_scalar(doc: &Document, context: NodeId, field: &ResolvedField) -> Option<XmlValue> {
    let matches = field.path.evaluate(doc, context);
    let first = matches.first()?;
    decode_match(doc, field, first)
}

/// Validate a value for assignment and encode it as document text
///
/// Coercion and choices are checked here so callers can fail before
/// touching the tree.
pub(crate) fn encode_value(field: &ResolvedField, value: &XmlValue) -> XmlMapResult<String> {
    let ty = field.spec.scalar_type().ok_or_else(|| {
        XmlMapError::BadParam(format!(
            "Field '{}' is an {} field, not a scalar",
            field.name(),
            field.spec.kind.name()
        ))
    })?;
    let literal = ty.encode(field.name(), value)?;
    let choices = field.spec.choices;
    if !choices.is_empty() && !choices.contains(&literal.as_str()) {
        return Err(XmlMapError::ChoiceConstraint {
            field: field.name().to_string(),
            value: literal,
            choices: choices.iter().map(|c| c.to_string()).collect(),
        });
    }
    Ok(literal)
}

fn read_only(field: &ResolvedField) -> XmlMapError {
    XmlMapError::NotSupported(format!(
        "Field '{}' is computed by '{}' and cannot be written",
        field.name(),
        field.path.source()
    ))
}

/// Overwrite the first match in place or create the target
pub(crate) fn write_scalar(
    doc: &mut Document,
    context: NodeId,
    table: &SchemaTable,
    field: &ResolvedField,
    literal: &str,
) -> XmlMapResult<()> {
    match field.path.target() {
        Target::Function(_) => Err(read_only(field)),
        Target::Elements => {
            if let Some(existing) = field.path.select_elements(doc, context).first().copied() {
                return doc.set_text(existing, literal);
            }
            let steps = child_steps(field.path.steps());
            let plan = plan_chain(doc, context, table, field, &steps, steps.len())?;
            let (top, leaf) = build_chain(doc, &steps[plan.depth..], None)?;
            doc.set_text(leaf, literal)?;
            plan.commit(doc, top)
        }
        Target::Attribute(name) => {
            let name = name.clone();
            if let Some(owner) = field.path.select_elements(doc, context).first().copied() {
                return doc.set_attribute(owner, name, literal);
            }
            let steps = child_steps(field.path.steps());
            let plan = plan_chain(doc, context, table, field, &steps, steps.len())?;
            let (top, leaf) = build_chain(doc, &steps[plan.depth..], None)?;
            doc.set_attribute(leaf, name, literal)?;
            plan.commit(doc, top)
        }
    }
}

/// Remove the first match of a scalar field; returns whether anything changed
///
/// `.` paths clear the context element's text instead of removing it.
pub(crate) fn clear_scalar(doc: &mut Document, context: NodeId, field: &ResolvedField) -> XmlMapResult<bool> {
    match field.path.evaluate(doc, context).into_iter().next() {
        None => Ok(false),
        Some(PathMatch::Value(_)) => Err(read_only(field)),
        Some(PathMatch::Attribute { owner, name }) => {
            Ok(doc.remove_attribute(owner, name.namespace.as_deref(), &name.local))
        }
        Some(PathMatch::Element(id)) if id == context => {
            doc.set_text(id, "")?;
            Ok(true)
        }
        Some(PathMatch::Element(id)) => Ok(doc.remove(id)),
    }
}

/// First element selected by an object field, created if missing
pub(crate) fn locate_or_create(
    doc: &mut Document,
    context: NodeId,
    table: &SchemaTable,
    field: &ResolvedField,
) -> XmlMapResult<NodeId> {
    if let Some(existing) = field.path.select_elements(doc, context).first().copied() {
        return Ok(existing);
    }
    let steps = child_steps(field.path.steps());
    let plan = plan_chain(doc, context, table, field, &steps, steps.len())?;
    let (top, leaf) = build_chain(doc, &steps[plan.depth..], None)?;
    plan.commit(doc, top)?;
    Ok(leaf)
}

/// Put a detached element at an object field's position
///
/// `take` yields the element, already in `doc`, once every check that does
/// not depend on it has passed. An existing match keeps its id and position
/// and receives the element's attributes and children; otherwise the missing
/// chain is built with the element as its last step. Returns the element now
/// holding the object.
pub(crate) fn place_object(
    doc: &mut Document,
    context: NodeId,
    table: &SchemaTable,
    field: &ResolvedField,
    take: impl FnOnce(&mut Document) -> XmlMapResult<NodeId>,
) -> XmlMapResult<NodeId> {
    let steps = child_steps(field.path.steps());
    let Some(last) = steps.last().copied() else {
        return Err(XmlMapError::NotSupported(format!(
            "Field '{}' addresses the object itself and cannot be replaced",
            field.name()
        )));
    };
    if let Some(existing) = field.path.select_elements(doc, context).first().copied() {
        let node = take(doc)?;
        check_insertable(doc, existing, node)?;
        debug!(field = field.name(), "overwriting existing element");
        doc.overwrite(existing, node)?;
        apply_predicates(doc, existing, last)?;
        return Ok(existing);
    }
    let plan = plan_chain(doc, context, table, field, &steps, steps.len())?;
    let node = take(doc)?;
    check_insertable(doc, plan.parent, node)?;
    let (top, _) = build_chain(doc, &steps[plan.depth..], Some(node))?;
    plan.commit(doc, top)?;
    Ok(node)
}

/// Insert a new element after the last match of a list field
///
/// `take` runs after the checks and yields the element to insert (detached,
/// already in `doc`), or `None` for a new empty element named by the path.
pub(crate) fn append_element(
    doc: &mut Document,
    context: NodeId,
    table: &SchemaTable,
    field: &ResolvedField,
    take: impl FnOnce(&mut Document) -> XmlMapResult<Option<NodeId>>,
) -> XmlMapResult<NodeId> {
    let steps = child_steps(field.path.steps());
    let Some(last) = steps.last().copied() else {
        return Err(XmlMapError::NotSupported(format!(
            "Field '{}' addresses the object itself and cannot grow",
            field.name()
        )));
    };

    let existing = field.path.select_elements(doc, context);
    if let Some(anchor) = existing.last().copied() {
        check_creatable(field, last, None)?;
        let parent = doc
            .parent(anchor)
            .ok_or_else(|| XmlMapError::InternalError("List item without parent".to_string()))?;
        let index = doc.index_in_parent(anchor).map_or(0, |i| i + 1);
        let node = take(doc)?;
        if let Some(node) = node {
            check_insertable(doc, parent, node)?;
        }
        let (top, leaf) = build_chain(doc, std::slice::from_ref(&last), node)?;
        doc.insert_child(parent, index, top)?;
        return Ok(leaf);
    }

    let plan = plan_chain(doc, context, table, field, &steps, steps.len() - 1)?;
    let node = take(doc)?;
    if let Some(node) = node {
        check_insertable(doc, plan.parent, node)?;
    }
    let (top, leaf) = build_chain(doc, &steps[plan.depth..], node)?;
    plan.commit(doc, top)?;
    Ok(leaf)
}

/// `node` must be detached and must not contain `parent`
fn check_insertable(doc: &Document, parent: NodeId, node: NodeId) -> XmlMapResult<()> {
    doc.ensure_detached(node)?;
    if doc.is_within(parent, node) {
        return Err(XmlMapError::BadParam(
            "An object cannot be placed inside itself".to_string(),
        ));
    }
    Ok(())
}

/// Where a missing chain goes: `depth` steps already exist, the chain is
/// inserted under `parent` at `index`
struct ChainPlan {
    parent: NodeId,
    depth: usize,
    index: usize,
    field: &'static str,
}

impl ChainPlan {
    fn commit(&self, doc: &mut Document, top: NodeId) -> XmlMapResult<()> {
        debug!(
            field = self.field,
            existing_steps = self.depth,
            "inserting synthesized elements"
        );
        doc.insert_child(self.parent, self.index, top)
    }
}

/// Walk the existing prefix of `steps` (at most `limit` steps) and check the
/// remaining steps can be created
fn plan_chain(
    doc: &Document,
    context: NodeId,
    table: &SchemaTable,
    field: &ResolvedField,
    steps: &[&Step],
    limit: usize,
) -> XmlMapResult<ChainPlan> {
    let mut parent = context;
    let mut depth = 0;
    while depth < limit {
        match first_match(doc, parent, steps[depth]) {
            Some(found) => {
                parent = found;
                depth += 1;
            }
            None => break,
        }
    }

    if depth == steps.len() {
        return Err(XmlMapError::InternalError(format!(
            "Field '{}' already has a target",
            field.name()
        )));
    }

    for (offset, step) in steps[depth..].iter().enumerate() {
        let existing = (offset == 0).then(|| count_named(doc, parent, step));
        check_creatable(field, step, existing)?;
    }

    let index = insertion_index(doc, table, parent, &steps[..depth], field.index);
    Ok(ChainPlan {
        parent,
        depth,
        index,
        field: field.spec.name,
    })
}

fn first_match(doc: &Document, parent: NodeId, step: &Step) -> Option<NodeId> {
    let Step::Child { test, predicates } = step else {
        return Some(parent);
    };
    let mut candidates: Vec<NodeId> = doc
        .element_children(parent)
        .filter(|child| doc.name(*child).is_some_and(|name| test.matches(name)))
        .collect();
    for predicate in predicates {
        candidates = match predicate {
            Predicate::Position(n) => candidates.get(n - 1).copied().into_iter().collect(),
            Predicate::AttributeEquals { name, value } => candidates
                .into_iter()
                .filter(|id| {
                    doc.attribute(*id, name.namespace.as_deref(), &name.local)
                        == Some(value.as_str())
                })
                .collect(),
        };
    }
    candidates.first().copied()
}

/// Siblings a new element for `step` would be counted among by `[n]`
fn count_named(doc: &Document, parent: NodeId, step: &Step) -> usize {
    let Step::Child { test, predicates } = step else {
        return 0;
    };
    doc.element_children(parent)
        .filter(|child| doc.name(*child).is_some_and(|name| test.matches(name)))
        .filter(|child| {
            predicates.iter().all(|predicate| match predicate {
                Predicate::Position(_) => true,
                Predicate::AttributeEquals { name, value } => {
                    doc.attribute(*child, name.namespace.as_deref(), &name.local)
                        == Some(value.as_str())
                }
            })
        })
        .count()
}

/// A step is creatable when it names an element and a positional predicate
/// would select the new element
fn check_creatable(field: &ResolvedField, step: &Step, existing: Option<usize>) -> XmlMapResult<()> {
    let not_creatable = |why: &str| {
        XmlMapError::NotSupported(format!(
            "Cannot create '{}' for field '{}': {}",
            field.path.source(),
            field.name(),
            why
        ))
    };
    let Step::Child { test, predicates } = step else {
        return Ok(());
    };
    if !matches!(test, NameTest::Name(_)) {
        return Err(not_creatable("wildcard steps do not name an element"));
    }
    for predicate in predicates {
        if let Predicate::Position(n) = predicate {
            let expected = existing.unwrap_or(0) + 1;
            if *n != expected {
                return Err(not_creatable("position predicate would not select the new element"));
            }
        }
    }
    Ok(())
}

/// Build detached elements for `steps`, the last one being `leaf` when given
fn build_chain(doc: &mut Document, steps: &[&Step], leaf: Option<NodeId>) -> XmlMapResult<(NodeId, NodeId)> {
    let mut top: Option<NodeId> = None;
    let mut bottom: Option<NodeId> = None;
    for (i, step) in steps.iter().enumerate() {
        let Step::Child { test: NameTest::Name(name), .. } = step else {
            continue;
        };
        let element = match leaf {
            Some(leaf) if i == steps.len() - 1 => leaf,
            _ => doc.create_element(name.clone()),
        };
        shape_element(doc, element, step)?;
        match bottom {
            Some(parent) => doc.append_child(parent, element)?,
            None => top = Some(element),
        }
        bottom = Some(element);
    }
    match (top, bottom) {
        (Some(top), Some(bottom)) => Ok((top, bottom)),
        _ => Err(XmlMapError::InternalError("Empty element chain".to_string())),
    }
}

/// Give an element the name and predicate attributes `step` selects by
fn shape_element(doc: &mut Document, element: NodeId, step: &Step) -> XmlMapResult<()> {
    if let Step::Child { test: NameTest::Name(name), .. } = step {
        doc.rename(element, name.clone())?;
    }
    apply_predicates(doc, element, step)
}

fn apply_predicates(doc: &mut Document, element: NodeId, step: &Step) -> XmlMapResult<()> {
    let Step::Child { predicates, .. } = step else {
        return Ok(());
    };
    for predicate in predicates {
        if let Predicate::AttributeEquals { name, value } = predicate {
            doc.set_attribute(element, name.clone(), value.clone())?;
        }
    }
    Ok(())
}

/// Child index for a new element of the field ranked `rank`
///
/// The element goes before the first existing child that a later field
/// ranks, otherwise last.
fn insertion_index(doc: &Document, table: &SchemaTable, parent: NodeId, prefix: &[&Step], rank: usize) -> usize {
    let children = doc.children(parent);
    children
        .iter()
        .position(|child| {
            doc.is_element(*child) && table.rank(prefix, doc, *child).is_some_and(|r| r > rank)
        })
        .unwrap_or(children.len())
}
