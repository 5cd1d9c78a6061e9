//! Path expressions for field bindings
//!
//! This module compiles and evaluates the small XPath subset field
//! declarations use:
//! - `.` - the context element
//! - `local-name(.)`, `name(.)` - computed names of the context element
//! - `mods:name/mods:namePart` - relative element steps
//! - `mods:*`, `*` - wildcard steps
//! - `mods:titleInfo[1]`, `mods:dateIssued[@keyDate='yes']` - predicates
//! - `mods:name/@type`, `@xlink:href` - a final attribute step
//!
//! Prefixes are resolved against a [`NamespaceContext`] at compile time.

use crate::core::error::{XmlMapError, XmlMapResult};
use crate::core::namespace::NamespaceContext;
use crate::core::node::{Document, NodeId, QName};
use tracing::trace;

/// Element test of a location step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// `*`
    Any,
    /// `prefix:*`
    AnyInNamespace(String),
    /// `prefix:local` or `local`
    Name(QName),
}

impl NameTest {
    /// Check an element name against this test
    pub fn matches(&self, name: &QName) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::AnyInNamespace(uri) => name.namespace.as_deref() == Some(uri.as_str()),
            NameTest::Name(test) => name.matches(test.namespace.as_deref(), &test.local),
        }
    }
}

/// Step predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[n]`, 1-based
    Position(usize),
    /// `[@name='value']`
    AttributeEquals { name: QName, value: String },
}

/// One location step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `.`
    SelfNode,
    /// Child element step
    Child {
        test: NameTest,
        predicates: Vec<Predicate>,
    },
}

/// Computed value functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `local-name(.)`
    LocalName,
    /// `name(.)`
    Name,
}

/// What a path finally addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Elements selected by the steps
    Elements,
    /// Attribute on each selected element
    Attribute(QName),
    /// Computed value of the context element
    Function(Function),
}

/// A node or value produced by evaluating a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatch {
    Element(NodeId),
    Attribute { owner: NodeId, name: QName },
    Value(String),
}

/// A compiled path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPath {
    source: String,
    steps: Vec<Step>,
    target: Target,
}

impl CompiledPath {
    /// Expression text this path was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Whether the path yields a computed value rather than nodes
    pub fn is_computed(&self) -> bool {
        matches!(self.target, Target::Function(_))
    }

    /// Element steps, skipping `.`
    pub fn child_steps(&self) -> impl Iterator<Item = (&NameTest, &[Predicate])> {
        self.steps.iter().filter_map(|step| match step {
            Step::SelfNode => None,
            Step::Child { test, predicates } => Some((test, predicates.as_slice())),
        })
    }

    /// Elements selected by the steps, in document order
    pub fn select_elements(&self, doc: &Document, context: NodeId) -> Vec<NodeId> {
        let mut current = vec![context];
        for step in &self.steps {
            let Step::Child { test, predicates } = step else {
                continue;
            };
            let mut next = Vec::new();
            for node in current {
                let mut candidates: Vec<NodeId> = doc
                    .element_children(node)
                    .filter(|child| doc.name(*child).is_some_and(|name| test.matches(name)))
                    .collect();
                for predicate in predicates {
                    candidates = apply_predicate(doc, candidates, predicate);
                }
                next.extend(candidates);
            }
            current = next;
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// Evaluate against a context element
    pub fn evaluate(&self, doc: &Document, context: NodeId) -> Vec<PathMatch> {
        let matches: Vec<PathMatch> = match &self.target {
            Target::Function(function) => {
                let Some(name) = doc.name(context) else {
                    return Vec::new();
                };
                let value = match function {
                    Function::LocalName => name.local.clone(),
                    Function::Name => name.qualified(),
                };
                vec![PathMatch::Value(value)]
            }
            Target::Elements => self
                .select_elements(doc, context)
                .into_iter()
                .map(PathMatch::Element)
                .collect(),
            Target::Attribute(name) => self
                .select_elements(doc, context)
                .into_iter()
                .filter_map(|owner| {
                    doc.element(owner)?
                        .attributes
                        .iter()
                        .find(|a| a.name.matches(name.namespace.as_deref(), &name.local))
                        .map(|a| PathMatch::Attribute {
                            owner,
                            name: a.name.clone(),
                        })
                })
                .collect(),
        };
        trace!(path = %self.source, matches = matches.len(), "evaluated path");
        matches
    }
}

fn apply_predicate(doc: &Document, candidates: Vec<NodeId>, predicate: &Predicate) -> Vec<NodeId> {
    match predicate {
        Predicate::Position(n) => candidates.get(n - 1).copied().into_iter().collect(),
        Predicate::AttributeEquals { name, value } => candidates
            .into_iter()
            .filter(|id| {
                doc.attribute(*id, name.namespace.as_deref(), &name.local) == Some(value.as_str())
            })
            .collect(),
    }
}

/// Compile a path expression against a namespace context
pub fn compile(expr: &str, context: &NamespaceContext) -> XmlMapResult<CompiledPath> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(XmlMapError::BadXPath("Empty path".to_string()));
    }

    let function = match trimmed {
        "local-name(.)" | "local-name()" => Some(Function::LocalName),
        "name(.)" | "name()" => Some(Function::Name),
        _ => None,
    };
    if let Some(function) = function {
        return Ok(CompiledPath {
            source: expr.to_string(),
            steps: Vec::new(),
            target: Target::Function(function),
        });
    }
    if find_unquoted(trimmed, '(').is_some() {
        return Err(XmlMapError::BadXPath(format!(
            "Unsupported function in path: {}",
            expr
        )));
    }

    let segments = split_steps(trimmed)?;
    let mut steps = Vec::new();
    let mut target = Target::Elements;
    let last = segments.len() - 1;

    for (i, segment) in segments.iter().enumerate() {
        if let Some(attr) = segment.strip_prefix('@') {
            if i != last {
                return Err(XmlMapError::BadXPath(format!(
                    "Attribute step must be last: {}",
                    expr
                )));
            }
            target = Target::Attribute(resolve_name(attr, context, expr)?);
        } else if segment == "." {
            steps.push(Step::SelfNode);
        } else {
            steps.push(parse_step(segment, context, expr)?);
        }
    }

    Ok(CompiledPath {
        source: expr.to_string(),
        steps,
        target,
    })
}

/// Split on `/` outside of predicates and quotes
fn split_steps(expr: &str) -> XmlMapResult<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in expr.chars() {
        match (ch, quote) {
            (q, Some(open)) if q == open => {
                quote = None;
                current.push(ch);
            }
            (_, Some(_)) => current.push(ch),
            ('\'' | '"', None) => {
                quote = Some(ch);
                current.push(ch);
            }
            ('[', None) => {
                depth += 1;
                current.push(ch);
            }
            (']', None) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| XmlMapError::BadXPath(format!("Unexpected ']' in {}", expr)))?;
                current.push(ch);
            }
            ('/', None) if depth == 0 => {
                if current.is_empty() {
                    return Err(XmlMapError::BadXPath(format!(
                        "Empty or absolute step in {}",
                        expr
                    )));
                }
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    if quote.is_some() {
        return Err(XmlMapError::BadXPath(format!("Unclosed quote in {}", expr)));
    }
    if depth != 0 {
        return Err(XmlMapError::BadXPath(format!("Unclosed bracket in {}", expr)));
    }
    if current.is_empty() {
        return Err(XmlMapError::BadXPath(format!("Trailing '/' in {}", expr)));
    }
    segments.push(current);
    Ok(segments)
}

/// Byte offset of the first `target` outside a quoted literal
fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (pos, ch) in s.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == target => return Some(pos),
            None => {}
        }
    }
    None
}

fn parse_step(segment: &str, context: &NamespaceContext, expr: &str) -> XmlMapResult<Step> {
    let (name, mut rest) = match find_unquoted(segment, '[') {
        Some(pos) => (&segment[..pos], &segment[pos..]),
        None => (segment, ""),
    };

    let test = if name == "*" {
        NameTest::Any
    } else if let Some(prefix) = name.strip_suffix(":*") {
        let uri = context
            .get_uri(prefix)
            .ok_or_else(|| XmlMapError::BadXPath(format!("Unknown prefix '{}' in {}", prefix, expr)))?;
        NameTest::AnyInNamespace(uri.to_string())
    } else {
        NameTest::Name(resolve_name(name, context, expr)?)
    };

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let close = find_unquoted(rest, ']')
            .ok_or_else(|| XmlMapError::BadXPath(format!("Unclosed predicate in {}", expr)))?;
        if !rest.starts_with('[') {
            return Err(XmlMapError::BadXPath(format!("Malformed predicate in {}", expr)));
        }
        predicates.push(parse_predicate(&rest[1..close], context, expr)?);
        rest = &rest[close + 1..];
    }

    Ok(Step::Child { test, predicates })
}

fn parse_predicate(body: &str, context: &NamespaceContext, expr: &str) -> XmlMapResult<Predicate> {
    let body = body.trim();
    if let Ok(n) = body.parse::<usize>() {
        if n == 0 {
            return Err(XmlMapError::BadXPath(format!("Positions start at 1 in {}", expr)));
        }
        return Ok(Predicate::Position(n));
    }

    let malformed = || XmlMapError::BadXPath(format!("Unsupported predicate '[{}]' in {}", body, expr));
    let attr = body.strip_prefix('@').ok_or_else(malformed)?;
    let (name, literal) = attr.split_once('=').ok_or_else(malformed)?;
    let literal = literal.trim();
    let value = literal
        .strip_prefix('\'')
        .and_then(|l| l.strip_suffix('\''))
        .or_else(|| literal.strip_prefix('"').and_then(|l| l.strip_suffix('"')))
        .ok_or_else(malformed)?;

    Ok(Predicate::AttributeEquals {
        name: resolve_name(name.trim(), context, expr)?,
        value: value.to_string(),
    })
}

/// Resolve `prefix:local` or `local`; unprefixed names have no namespace
fn resolve_name(name: &str, context: &NamespaceContext, expr: &str) -> XmlMapResult<QName> {
    let (prefix, local) = match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    };
    if !is_ncname(local) || prefix.is_some_and(|p| !is_ncname(p)) {
        return Err(XmlMapError::BadXPath(format!("Invalid name '{}' in {}", name, expr)));
    }
    let namespace = match prefix {
        Some(prefix) => Some(context.get_uri(prefix).ok_or_else(|| {
            XmlMapError::BadXPath(format!("Unknown prefix '{}' in {}", prefix, expr))
        })?),
        None => None,
    };
    Ok(QName::new(prefix, local, namespace))
}

fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
