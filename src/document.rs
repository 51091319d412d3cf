//! Turtle parsing and serialization
//!
//! A document is parsed into one [`Graph`]; typed entities are then
//! extracted by scanning for `rdf:type` statements. Serialization writes a
//! chosen set of subjects in a canonical form (blank nodes labelled by
//! content, statements sorted) so that equal content always produces
//! equal text.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use oxrdf::dataset::CanonicalizationAlgorithm;
use oxrdf::{BlankNode, NamedNode};
use oxttl::{TurtleParser, TurtleSerializer};

use crate::dcat::{Agent, Catalog, ConceptScheme, DcatEntity, Dataset, Distribution};
use crate::entity::{RdfEntity, SharedGraph};
use crate::error::{CatalogError, Result};
use crate::graph::{Graph, Literal, Node, Term, Triple};
use crate::id::validate_uri;
use crate::vocab::{RDF_LANG_STRING, RDF_TYPE, XSD_STRING};

/// Entities found in a parsed document, grouped by type
#[derive(Debug, Clone)]
pub struct Document {
    graph: SharedGraph,
    pub catalogs: Vec<Catalog>,
    pub datasets: Vec<Dataset>,
    pub distributions: Vec<Distribution>,
    pub agents: Vec<Agent>,
    pub concept_schemes: Vec<ConceptScheme>,
}

impl Document {
    /// Parse Turtle text. Syntax errors are fatal; a document without any
    /// recognised entity is simply empty.
    pub fn parse(text: &str) -> Result<Self> {
        let graph = Arc::new(RwLock::new(parse_graph(text)?));
        Ok(Self::from_graph(graph))
    }

    pub fn from_graph(graph: SharedGraph) -> Self {
        Self {
            catalogs: entities_of(&graph),
            datasets: entities_of(&graph),
            distributions: entities_of(&graph),
            agents: entities_of(&graph),
            concept_schemes: entities_of(&graph),
            graph,
        }
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
            && self.datasets.is_empty()
            && self.distributions.is_empty()
            && self.agents.is_empty()
            && self.concept_schemes.is_empty()
    }
}

/// Every subject typed `type_iri`, in subject insertion order
pub fn entities_of_type(graph: &SharedGraph, type_iri: &str) -> Vec<RdfEntity> {
    let guard = graph.read().unwrap_or_else(|e| e.into_inner());
    let type_term = Term::iri(type_iri);
    let nodes: Vec<Node> = guard.subjects_with(RDF_TYPE, &type_term).cloned().collect();
    drop(guard);
    nodes
        .into_iter()
        .map(|node| RdfEntity::new(Arc::clone(graph), node))
        .collect()
}

/// Typed views over every subject of `T`'s RDF type
pub fn entities_of<T: DcatEntity>(graph: &SharedGraph) -> Vec<T> {
    entities_of_type(graph, T::RDF_TYPE)
        .into_iter()
        .map(T::from_entity)
        .collect()
}

/// Start a new document holding a single typed subject
pub fn create(uri: &str, type_iri: &str) -> Result<RdfEntity> {
    validate_uri(uri)?;
    let mut graph = Graph::with_default_namespaces();
    let node = Node::iri(uri);
    graph.insert(Triple::new(node.clone(), RDF_TYPE, Term::iri(type_iri)));
    Ok(RdfEntity::new(Arc::new(RwLock::new(graph)), node))
}

/// Parse Turtle text into a graph, keeping declared prefixes on top of the
/// default bindings
pub fn parse_graph(text: &str) -> Result<Graph> {
    let mut graph = Graph::with_default_namespaces();
    let mut parser = TurtleParser::new().for_reader(text.as_bytes());

    for result in &mut parser {
        let triple = result.map_err(CatalogError::malformed)?;
        let subject = match triple.subject {
            oxrdf::Subject::NamedNode(n) => Node::Iri(n.into_string()),
            oxrdf::Subject::BlankNode(b) => Node::Blank(b.into_string()),
            #[allow(unreachable_patterns)]
            _ => continue,
        };
        let object = match triple.object {
            oxrdf::Term::NamedNode(n) => Term::Node(Node::Iri(n.into_string())),
            oxrdf::Term::BlankNode(b) => Term::Node(Node::Blank(b.into_string())),
            oxrdf::Term::Literal(l) => Term::Literal(from_ox_literal(&l)),
            #[allow(unreachable_patterns)]
            _ => continue,
        };
        graph.insert(Triple::new(subject, triple.predicate.into_string(), object));
    }

    for (prefix, iri) in parser.prefixes() {
        graph.add_namespace(prefix, iri);
    }
    Ok(graph)
}

/// Serialize the statements of `subjects` as Turtle.
///
/// The statements are canonicalized first: blank nodes get labels derived
/// from their content, statements of the first subject come first and the
/// rest are sorted, and blank nodes are then renamed b0, b1, ... in order
/// of first use. Parsing the same content twice yields the same text
/// whatever labels the parser picked.
pub fn serialize(graph: &Graph, subjects: &[Node]) -> Result<String> {
    let mut closure = oxrdf::Graph::new();
    for subject in subjects {
        for triple in graph.triples_of(subject) {
            closure.insert(&to_ox_triple(&triple)?);
        }
    }
    closure.canonicalize(CanonicalizationAlgorithm::Unstable);

    let root = match subjects.first() {
        Some(Node::Iri(iri)) => Some(named_node(iri)?),
        _ => None,
    };
    let mut triples: Vec<oxrdf::Triple> = closure.iter().map(|t| t.into_owned()).collect();
    triples.sort_by_cached_key(|t| {
        let is_root = matches!((&t.subject, &root), (oxrdf::Subject::NamedNode(s), Some(r)) if s == r);
        (
            !is_root,
            t.subject.to_string(),
            t.predicate.as_str().to_string(),
            t.object.to_string(),
        )
    });

    let mut serializer = TurtleSerializer::new();
    for (prefix, iri) in graph.namespaces() {
        serializer = serializer
            .with_prefix(prefix.as_str(), iri.as_str())
            .map_err(|_| CatalogError::InvalidIri(iri.clone()))?;
    }
    let mut writer = serializer.for_writer(Vec::new());
    let mut blanks = BlankLabels::default();
    for triple in triples {
        let relabelled = oxrdf::Triple::new(
            blanks.subject(triple.subject)?,
            triple.predicate,
            blanks.term(triple.object)?,
        );
        writer.serialize_triple(&relabelled)?;
    }

    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(CatalogError::malformed)
}

/// Blank node labels b0, b1, ... in order of first use
#[derive(Default)]
struct BlankLabels {
    labels: HashMap<String, String>,
}

impl BlankLabels {
    fn label(&mut self, original: &BlankNode) -> Result<BlankNode> {
        let next = self.labels.len();
        let label = self
            .labels
            .entry(original.as_str().to_string())
            .or_insert_with(|| format!("b{}", next));
        BlankNode::new(label.as_str()).map_err(CatalogError::malformed)
    }

    fn subject(&mut self, subject: oxrdf::Subject) -> Result<oxrdf::Subject> {
        Ok(match subject {
            oxrdf::Subject::BlankNode(b) => self.label(&b)?.into(),
            other => other,
        })
    }

    fn term(&mut self, term: oxrdf::Term) -> Result<oxrdf::Term> {
        Ok(match term {
            oxrdf::Term::BlankNode(b) => self.label(&b)?.into(),
            other => other,
        })
    }
}

fn to_ox_triple(triple: &Triple) -> Result<oxrdf::Triple> {
    let subject: oxrdf::Subject = match &triple.subject {
        Node::Iri(iri) => named_node(iri)?.into(),
        Node::Blank(label) => blank_node(label)?.into(),
    };
    let object: oxrdf::Term = match &triple.object {
        Term::Node(Node::Iri(iri)) => named_node(iri)?.into(),
        Term::Node(Node::Blank(label)) => blank_node(label)?.into(),
        Term::Literal(literal) => to_ox_literal(literal)?.into(),
    };
    Ok(oxrdf::Triple::new(
        subject,
        named_node(&triple.predicate)?,
        object,
    ))
}

fn blank_node(label: &str) -> Result<BlankNode> {
    BlankNode::new(label).map_err(CatalogError::malformed)
}

fn named_node(iri: &str) -> Result<NamedNode> {
    NamedNode::new(iri).map_err(|_| CatalogError::InvalidIri(iri.to_string()))
}

fn to_ox_literal(literal: &Literal) -> Result<oxrdf::Literal> {
    match (literal.language(), literal.datatype()) {
        (Some(lang), _) => oxrdf::Literal::new_language_tagged_literal(literal.value(), lang)
            .map_err(CatalogError::malformed),
        (None, Some(datatype)) => Ok(oxrdf::Literal::new_typed_literal(
            literal.value(),
            named_node(datatype)?,
        )),
        (None, None) => Ok(oxrdf::Literal::new_simple_literal(literal.value())),
    }
}

fn from_ox_literal(literal: &oxrdf::Literal) -> Literal {
    if let Some(lang) = literal.language() {
        return Literal::lang(literal.value(), lang);
    }
    let datatype = literal.datatype().as_str();
    if datatype == XSD_STRING || datatype == RDF_LANG_STRING {
        Literal::simple(literal.value())
    } else {
        Literal::typed(literal.value(), datatype)
    }
}
