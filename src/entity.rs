//! Generic RDF entity handle
//!
//! An [`RdfEntity`] is a (graph, subject) pair. Several handles may share
//! one graph, e.g. a dataset and its contact point; the graph lives as
//! long as any handle onto it. Typed DCAT views in [`crate::dcat`] are
//! thin wrappers around this handle.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;

use crate::document;
use crate::error::Result;
use crate::graph::{Graph, Literal, Node, Term, Triple};
use crate::id::{local_name, mint_sub_resource_uri};
use crate::vocab::{is_independent_type, RDF_TYPE, XSD_BOOLEAN, XSD_DATE, XSD_DECIMAL};

/// Graph shared between every entity parsed from, or created in, one document
pub type SharedGraph = Arc<RwLock<Graph>>;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct RdfEntity {
    graph: SharedGraph,
    node: Node,
}

impl RdfEntity {
    pub fn new(graph: SharedGraph, node: Node) -> Self {
        Self { graph, node }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Canonical URI of the entity; `None` for blank nodes
    pub fn uri(&self) -> Option<&str> {
        self.node.as_iri()
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Graph> {
        self.graph.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Graph> {
        self.graph.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Another handle onto a node of the same graph
    pub fn sibling(&self, node: Node) -> RdfEntity {
        RdfEntity::new(Arc::clone(&self.graph), node)
    }

    pub fn types(&self) -> Vec<String> {
        self.get_uris(RDF_TYPE)
    }

    pub fn has_type(&self, type_iri: &str) -> bool {
        self.read()
            .objects(&self.node, RDF_TYPE)
            .iter()
            .any(|t| t.as_iri() == Some(type_iri))
    }

    // ---- URI properties ----

    /// Latest URI value of `name`
    pub fn get_uri(&self, name: &str) -> Option<String> {
        self.read()
            .objects(&self.node, name)
            .iter()
            .rev()
            .find_map(|t| t.as_iri().map(str::to_string))
    }

    /// All URI values of `name`
    pub fn get_uris(&self, name: &str) -> Vec<String> {
        self.read()
            .objects(&self.node, name)
            .iter()
            .filter_map(|t| t.as_iri().map(str::to_string))
            .collect()
    }

    pub fn set_uri(&self, name: &str, value: Option<&str>) {
        self.set_uris(name, value);
    }

    /// Replace every value of `name`; an empty iterator clears the property.
    ///
    /// Values are stored as given. One that is not an absolute IRI makes
    /// [`RdfEntity::serialize`] fail with `InvalidIri`, so nothing invalid
    /// ever reaches storage.
    pub fn set_uris<I, S>(&self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = self.write();
        graph.remove_all(&self.node, name);
        for value in values {
            let value = value.as_ref();
            if !value.is_empty() {
                graph.insert(Triple::new(self.node.clone(), name, Term::iri(value)));
            }
        }
    }

    // ---- plain literals ----

    /// First literal value of `name`, whatever its tag or datatype
    pub fn get_literal(&self, name: &str) -> Option<String> {
        self.read()
            .objects(&self.node, name)
            .iter()
            .find_map(|t| t.as_literal().map(|l| l.value().to_string()))
    }

    pub fn get_literals(&self, name: &str) -> Vec<String> {
        self.read()
            .objects(&self.node, name)
            .iter()
            .filter_map(|t| t.as_literal().map(|l| l.value().to_string()))
            .collect()
    }

    pub fn set_literal(&self, name: &str, value: Option<&str>) {
        self.replace_literals(name, value.map(Literal::simple));
    }

    fn replace_literals(&self, name: &str, literals: impl IntoIterator<Item = Literal>) {
        let mut graph = self.write();
        graph.remove_all(&self.node, name);
        for literal in literals {
            graph.insert(Triple::new(self.node.clone(), name, literal));
        }
    }

    // ---- language-tagged text ----

    /// First value of `name` tagged with `language` (case-insensitive)
    pub fn get_text(&self, name: &str, language: &str) -> Option<String> {
        self.read()
            .objects(&self.node, name)
            .iter()
            .filter_map(Term::as_literal)
            .find(|l| {
                l.language()
                    .is_some_and(|tag| tag.eq_ignore_ascii_case(language))
            })
            .map(|l| l.value().to_string())
    }

    /// All tagged values of `name` grouped by lower-cased language tag
    pub fn get_texts(&self, name: &str) -> BTreeMap<String, Vec<String>> {
        let mut texts: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for literal in self.read().objects(&self.node, name).iter().filter_map(Term::as_literal) {
            if let Some(tag) = literal.language() {
                texts
                    .entry(tag.to_ascii_lowercase())
                    .or_default()
                    .push(literal.value().to_string());
            }
        }
        texts
    }

    /// Replace `name` with one literal per language; empty values are skipped
    pub fn set_texts<I, L, V>(&self, name: &str, values: I)
    where
        I: IntoIterator<Item = (L, V)>,
        L: AsRef<str>,
        V: AsRef<str>,
    {
        let literals: Vec<Literal> = values
            .into_iter()
            .filter(|(_, v)| !v.as_ref().is_empty())
            .map(|(lang, v)| Literal::lang(v.as_ref(), lang.as_ref()))
            .collect();
        self.replace_literals(name, literals);
    }

    /// Replace `name` with several literals per language (keywords)
    pub fn set_text_lists(&self, name: &str, values: &BTreeMap<String, Vec<String>>) {
        let literals: Vec<Literal> = values
            .iter()
            .flat_map(|(lang, list)| {
                list.iter()
                    .filter(|v| !v.is_empty())
                    .map(move |v| Literal::lang(v.as_str(), lang))
            })
            .collect();
        self.replace_literals(name, literals);
    }

    // ---- typed scalars ----
    //
    // Unparsable harvested values read as absent instead of failing.

    pub fn get_date(&self, name: &str) -> Option<NaiveDate> {
        let value = self.get_literal(name)?;
        NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
    }

    pub fn set_date(&self, name: &str, value: Option<NaiveDate>) {
        self.replace_literals(
            name,
            value.map(|d| Literal::typed(d.format(DATE_FORMAT).to_string(), XSD_DATE)),
        );
    }

    pub fn get_decimal(&self, name: &str) -> Option<f64> {
        let value = self.get_literal(name)?;
        value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn set_decimal(&self, name: &str, value: Option<f64>) {
        self.replace_literals(
            name,
            value
                .filter(|v| v.is_finite())
                .map(|v| Literal::typed(format_decimal(v), XSD_DECIMAL)),
        );
    }

    pub fn get_boolean(&self, name: &str) -> Option<bool> {
        match self.get_literal(name)?.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn set_boolean(&self, name: &str, value: Option<bool>) {
        self.replace_literals(
            name,
            value.map(|v| Literal::typed(v.to_string(), XSD_BOOLEAN)),
        );
    }

    // ---- sub-resources ----

    /// Handle onto the latest node value of `name`, if it has statements
    pub fn get_sub_resource(&self, name: &str) -> Option<RdfEntity> {
        let graph = self.read();
        let node = graph
            .objects(&self.node, name)
            .iter()
            .rev()
            .filter_map(Term::as_node)
            .find(|n| graph.has_subject(n))?
            .clone();
        drop(graph);
        Some(self.sibling(node))
    }

    /// Mint a new typed subject linked from this entity through `name`.
    ///
    /// Any previous value of `name` is unlinked; sub-resources that are no
    /// longer referenced from anywhere are removed from the graph.
    pub fn create_sub_resource(&self, name: &str, type_iri: &str) -> RdfEntity {
        self.remove_sub_resource(name);
        let uri = mint_sub_resource_uri(self.uri(), local_name(name));
        let node = Node::Iri(uri);
        {
            let mut graph = self.write();
            graph.insert(Triple::new(node.clone(), RDF_TYPE, Term::iri(type_iri)));
            graph.insert(Triple::new(self.node.clone(), name, node.clone()));
        }
        self.sibling(node)
    }

    /// Unlink every node value of `name` and drop the unreferenced ones
    pub fn remove_sub_resource(&self, name: &str) {
        let mut graph = self.write();
        let previous: Vec<Node> = graph
            .objects(&self.node, name)
            .iter()
            .filter_map(Term::as_node)
            .cloned()
            .collect();
        graph.remove_all(&self.node, name);
        for node in previous {
            drop_unreferenced(&mut graph, node);
        }
    }

    // ---- serialization ----

    /// This subject plus every owned sub-resource reachable from it.
    ///
    /// The walk does not descend into subjects typed as independently
    /// stored entities, so a catalog never pulls in its datasets.
    pub fn root_objects(&self) -> Vec<Node> {
        let graph = self.read();
        let mut roots = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([self.node.clone()]);

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node.clone()) {
                continue;
            }
            for triple in graph.triples_of(&node) {
                if triple.predicate == RDF_TYPE {
                    continue;
                }
                if let Term::Node(child) = triple.object {
                    if !visited.contains(&child)
                        && graph.has_subject(&child)
                        && !is_independent(&graph, &child)
                    {
                        queue.push_back(child);
                    }
                }
            }
            roots.push(node);
        }
        roots
    }

    /// Turtle text of this entity and its owned sub-resources
    pub fn serialize(&self) -> Result<String> {
        let roots = self.root_objects();
        let graph = self.read();
        document::serialize(&graph, &roots)
    }
}

fn is_independent(graph: &Graph, node: &Node) -> bool {
    graph
        .objects(node, RDF_TYPE)
        .iter()
        .filter_map(Term::as_iri)
        .any(is_independent_type)
}

/// Remove `node` and, transitively, its own sub-resources once nothing
/// points at them any more
fn drop_unreferenced(graph: &mut Graph, node: Node) {
    let mut queue = VecDeque::from([node]);
    let mut visited = HashSet::new();
    while let Some(node) = queue.pop_front() {
        if !visited.insert(node.clone())
            || graph.is_referenced(&node)
            || !graph.has_subject(&node)
            || is_independent(graph, &node)
        {
            continue;
        }
        let children: Vec<Node> = graph
            .triples_of(&node)
            .into_iter()
            .filter(|t| t.predicate != RDF_TYPE)
            .filter_map(|t| match t.object {
                Term::Node(child) => Some(child),
                Term::Literal(_) => None,
            })
            .collect();
        graph.remove_subject(&node);
        queue.extend(children);
    }
}

/// Invariant-culture decimal text that reads back as the same value
fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::vocab::{
        DCAT_CONTACT_POINT, DCAT_DATASET, DCAT_DISTRIBUTION, DCAT_DISTRIBUTION_PROP,
        DCAT_SPATIAL_RESOLUTION, DCT_ISSUED, DCT_TITLE, EXT_IS_HVD, VCARD_FN, VCARD_INDIVIDUAL,
    };

    fn entity() -> RdfEntity {
        document::create("https://example.org/ds/1", DCAT_DATASET).unwrap()
    }

    #[test]
    fn test_uri_properties() {
        let e = entity();
        assert_eq!(e.get_uri("http://p"), None);
        e.set_uris("http://p", ["https://a", "https://b"]);
        assert_eq!(e.get_uris("http://p"), vec!["https://a", "https://b"]);
        assert_eq!(e.get_uri("http://p").as_deref(), Some("https://b"));
        e.set_uri("http://p", None);
        assert!(e.get_uris("http://p").is_empty());
    }

    #[test]
    fn test_invalid_iri_value_is_rejected_on_serialize() {
        let e = entity();
        e.set_uri("http://p", Some("relative/page"));
        assert!(matches!(e.serialize(), Err(CatalogError::InvalidIri(iri)) if iri == "relative/page"));
        e.set_uri("http://p", Some("https://example.org/page"));
        assert!(e.serialize().is_ok());
    }

    #[test]
    fn test_texts_grouped_by_language() {
        let e = entity();
        e.set_texts(DCT_TITLE, [("sk", "Názov"), ("EN", "Title"), ("de", "")]);
        assert_eq!(e.get_text(DCT_TITLE, "en").as_deref(), Some("Title"));
        assert_eq!(e.get_text(DCT_TITLE, "SK").as_deref(), Some("Názov"));
        assert_eq!(e.get_text(DCT_TITLE, "de"), None);
        let texts = e.get_texts(DCT_TITLE);
        assert_eq!(texts.len(), 2);
        assert_eq!(texts["en"], vec!["Title"]);

        e.set_texts(DCT_TITLE, [("en", "Other")]);
        assert_eq!(e.get_text(DCT_TITLE, "sk"), None);
    }

    #[test]
    fn test_typed_scalars() {
        let e = entity();
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        e.set_date(DCT_ISSUED, Some(date));
        assert_eq!(e.get_date(DCT_ISSUED), Some(date));

        e.set_decimal(DCAT_SPATIAL_RESOLUTION, Some(100.0));
        assert_eq!(e.get_decimal(DCAT_SPATIAL_RESOLUTION), Some(100.0));

        e.set_boolean(EXT_IS_HVD, Some(false));
        assert_eq!(e.get_boolean(EXT_IS_HVD), Some(false));
    }

    #[test]
    fn test_unparsable_scalars_read_as_absent() {
        let e = entity();
        e.set_literal(DCT_ISSUED, Some("29.2.2024"));
        assert_eq!(e.get_date(DCT_ISSUED), None);
        e.set_literal(DCAT_SPATIAL_RESOLUTION, Some("1,5"));
        assert_eq!(e.get_decimal(DCAT_SPATIAL_RESOLUTION), None);
        e.set_literal(EXT_IS_HVD, Some("yes"));
        assert_eq!(e.get_boolean(EXT_IS_HVD), None);
    }

    #[test]
    fn test_sub_resource_replacement_drops_old_node() {
        let e = entity();
        let first = e.create_sub_resource(DCAT_CONTACT_POINT, VCARD_INDIVIDUAL);
        first.set_texts(VCARD_FN, [("sk", "Prvý")]);
        let second = e.create_sub_resource(DCAT_CONTACT_POINT, VCARD_INDIVIDUAL);
        assert_ne!(first.node(), second.node());
        assert!(!e.read().has_subject(first.node()));
        let current = e.get_sub_resource(DCAT_CONTACT_POINT).unwrap();
        assert_eq!(current.node(), second.node());
        assert!(current.has_type(VCARD_INDIVIDUAL));
    }

    #[test]
    fn test_root_objects_stop_at_independent_entities() {
        let e = entity();
        let contact = e.create_sub_resource(DCAT_CONTACT_POINT, VCARD_INDIVIDUAL);
        let dist = e.sibling(Node::iri("https://example.org/dist/1"));
        {
            let mut graph = e.write();
            graph.insert(Triple::new(
                dist.node().clone(),
                RDF_TYPE,
                Term::iri(DCAT_DISTRIBUTION),
            ));
        }
        e.set_uris(DCAT_DISTRIBUTION_PROP, ["https://example.org/dist/1"]);

        let roots = e.root_objects();
        assert_eq!(roots.len(), 2);
        assert_eq!(&roots[0], e.node());
        assert!(roots.contains(contact.node()));
        assert!(!roots.contains(dist.node()));
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(100.0), "100.0");
        assert_eq!(format_decimal(0.25), "0.25");
    }
}
