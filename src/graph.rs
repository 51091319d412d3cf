//! In-memory triple graph
//!
//! A mutable set of (subject, predicate, object) statements together with
//! the namespace prefixes that were declared in, or bound to, the document
//! the graph came from. Subjects are kept in first-insertion order so that
//! entities extracted from a fetched document follow fetch order.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::vocab::DEFAULT_NAMESPACES;

/// Subject or object node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    /// IRI node, stored as the full IRI
    Iri(String),
    /// Blank node, stored as its label without the `_:` prefix
    Blank(String),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Node::Iri(iri.into())
    }

    /// The IRI of this node, if it is not blank
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            Node::Blank(_) => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{}>", iri),
            Node::Blank(label) => write!(f, "_:{}", label),
        }
    }
}

/// Literal value with an optional language tag or datatype
///
/// Language tags are stored lower-cased. A literal never carries both a
/// language tag and a datatype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    value: String,
    language: Option<String>,
    datatype: Option<String>,
}

impl Literal {
    pub fn simple(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn lang(value: impl Into<String>, language: &str) -> Self {
        Self {
            value: value.into(),
            language: Some(language.to_ascii_lowercase()),
            datatype: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }
}

/// Object position of a triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Node(Node),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Node(Node::Iri(iri.into()))
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Term::Node(node) => Some(node),
            Term::Literal(_) => None,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        self.as_node().and_then(Node::as_iri)
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(literal) => Some(literal),
            Term::Node(_) => None,
        }
    }
}

impl From<Node> for Term {
    fn from(node: Node) -> Self {
        Term::Node(node)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Node,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Node, predicate: impl Into<String>, object: impl Into<Term>) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Statements of one subject: predicate -> objects in insertion order
type Statements = BTreeMap<String, Vec<Term>>;

#[derive(Debug, Clone, Default)]
pub struct Graph {
    statements: HashMap<Node, Statements>,
    subject_order: Vec<Node>,
    namespaces: BTreeMap<String, String>,
    len: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty graph with the standard prefix bindings
    pub fn with_default_namespaces() -> Self {
        let mut graph = Self::new();
        for (prefix, iri) in DEFAULT_NAMESPACES {
            graph.add_namespace(prefix, iri);
        }
        graph
    }

    pub fn add_namespace(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.namespaces.insert(prefix.into(), iri.into());
    }

    /// Prefix -> namespace IRI
    pub fn namespaces(&self) -> &BTreeMap<String, String> {
        &self.namespaces
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add a triple. Returns false when the graph already contained it.
    pub fn insert(&mut self, triple: Triple) -> bool {
        let Triple {
            subject,
            predicate,
            object,
        } = triple;

        if !self.statements.contains_key(&subject) {
            self.subject_order.push(subject.clone());
        }
        let objects = self
            .statements
            .entry(subject)
            .or_default()
            .entry(predicate)
            .or_default();
        if objects.contains(&object) {
            return false;
        }
        objects.push(object);
        self.len += 1;
        true
    }

    /// Remove a triple. Returns false when the graph did not contain it.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        let Some(by_predicate) = self.statements.get_mut(&triple.subject) else {
            return false;
        };
        let Some(objects) = by_predicate.get_mut(&triple.predicate) else {
            return false;
        };
        let Some(pos) = objects.iter().position(|o| o == &triple.object) else {
            return false;
        };
        objects.remove(pos);
        self.len -= 1;
        if objects.is_empty() {
            by_predicate.remove(&triple.predicate);
        }
        if by_predicate.is_empty() {
            self.forget_subject(&triple.subject);
        }
        true
    }

    /// Remove every triple with the given subject and predicate
    pub fn remove_all(&mut self, subject: &Node, predicate: &str) -> usize {
        let Some(by_predicate) = self.statements.get_mut(subject) else {
            return 0;
        };
        let removed = by_predicate.remove(predicate).map(|o| o.len()).unwrap_or(0);
        self.len -= removed;
        if by_predicate.is_empty() {
            self.forget_subject(subject);
        }
        removed
    }

    /// Remove every triple with the given subject
    pub fn remove_subject(&mut self, subject: &Node) -> usize {
        let removed = self
            .statements
            .get(subject)
            .map(|s| s.values().map(Vec::len).sum())
            .unwrap_or(0);
        self.len -= removed;
        self.forget_subject(subject);
        removed
    }

    fn forget_subject(&mut self, subject: &Node) {
        self.statements.remove(subject);
        self.subject_order.retain(|s| s != subject);
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.objects(&triple.subject, &triple.predicate)
            .contains(&triple.object)
    }

    pub fn has_subject(&self, subject: &Node) -> bool {
        self.statements.contains_key(subject)
    }

    /// Objects of (subject, predicate) in insertion order
    pub fn objects(&self, subject: &Node, predicate: &str) -> &[Term] {
        self.statements
            .get(subject)
            .and_then(|s| s.get(predicate))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn triples_with_subject_predicate<'a>(
        &'a self,
        subject: &'a Node,
        predicate: &'a str,
    ) -> impl Iterator<Item = Triple> + 'a {
        self.objects(subject, predicate)
            .iter()
            .map(move |object| Triple::new(subject.clone(), predicate, object.clone()))
    }

    pub fn triples_with_predicate_object<'a>(
        &'a self,
        predicate: &'a str,
        object: &'a Term,
    ) -> impl Iterator<Item = Triple> + 'a {
        self.subjects_with(predicate, object)
            .map(move |subject| Triple::new(subject.clone(), predicate, object.clone()))
    }

    /// Subjects having (predicate, object), in subject insertion order
    pub fn subjects_with<'a>(
        &'a self,
        predicate: &'a str,
        object: &'a Term,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.subject_order
            .iter()
            .filter(move |s| self.objects(s, predicate).contains(object))
    }

    /// Whether any triple has `object` in object position
    pub fn is_referenced(&self, object: &Node) -> bool {
        let term = Term::Node(object.clone());
        self.statements
            .values()
            .any(|by_predicate| by_predicate.values().any(|objects| objects.contains(&term)))
    }

    /// Subjects in first-insertion order
    pub fn subjects(&self) -> impl Iterator<Item = &Node> {
        self.subject_order.iter()
    }

    /// All triples of one subject, sorted by predicate then object
    pub fn triples_of(&self, subject: &Node) -> Vec<Triple> {
        let mut triples: Vec<Triple> = self
            .statements
            .get(subject)
            .into_iter()
            .flat_map(|by_predicate| by_predicate.iter())
            .flat_map(|(predicate, objects)| {
                objects
                    .iter()
                    .map(move |o| Triple::new(subject.clone(), predicate.as_str(), o.clone()))
            })
            .collect();
        triples.sort();
        triples
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds() -> Node {
        Node::iri("https://example.org/ds/1")
    }

    #[test]
    fn test_insert_is_deduplicated() {
        let mut graph = Graph::new();
        let t = Triple::new(ds(), "p", Literal::simple("a"));
        assert!(graph.insert(t.clone()));
        assert!(!graph.insert(t.clone()));
        assert_eq!(graph.len(), 1);
        assert!(graph.contains(&t));
    }

    #[test]
    fn test_objects_keep_insertion_order() {
        let mut graph = Graph::new();
        graph.insert(Triple::new(ds(), "p", Literal::simple("b")));
        graph.insert(Triple::new(ds(), "p", Literal::simple("a")));
        let values: Vec<_> = graph
            .objects(&ds(), "p")
            .iter()
            .filter_map(|t| t.as_literal().map(Literal::value))
            .collect();
        assert_eq!(values, vec!["b", "a"]);
    }

    #[test]
    fn test_missing_lookup_is_empty() {
        let graph = Graph::new();
        assert!(graph.objects(&ds(), "p").is_empty());
        assert_eq!(graph.triples_with_subject_predicate(&ds(), "p").count(), 0);
        let object = Term::iri("x");
        assert_eq!(graph.triples_with_predicate_object("p", &object).count(), 0);
    }

    #[test]
    fn test_remove_forgets_empty_subject() {
        let mut graph = Graph::new();
        let t = Triple::new(ds(), "p", Term::iri("https://example.org/o"));
        graph.insert(t.clone());
        assert!(graph.remove(&t));
        assert!(!graph.remove(&t));
        assert!(graph.is_empty());
        assert!(!graph.has_subject(&ds()));
        assert_eq!(graph.subjects().count(), 0);
    }

    #[test]
    fn test_remove_all() {
        let mut graph = Graph::new();
        graph.insert(Triple::new(ds(), "p", Literal::simple("a")));
        graph.insert(Triple::new(ds(), "p", Literal::simple("b")));
        graph.insert(Triple::new(ds(), "q", Literal::simple("c")));
        assert_eq!(graph.remove_all(&ds(), "p"), 2);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.remove_subject(&ds()), 1);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_subjects_with_predicate_object() {
        let mut graph = Graph::new();
        let other = Node::iri("https://example.org/ds/2");
        let ty = Term::iri("T");
        graph.insert(Triple::new(other.clone(), "type", ty.clone()));
        graph.insert(Triple::new(ds(), "type", ty.clone()));
        let subjects: Vec<_> = graph.subjects_with("type", &ty).cloned().collect();
        assert_eq!(subjects, vec![other, ds()]);
        assert!(graph.is_referenced(&Node::iri("T")));
    }

    #[test]
    fn test_language_tag_is_lowercased() {
        assert_eq!(Literal::lang("x", "SK").language(), Some("sk"));
    }
}
