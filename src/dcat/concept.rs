use std::collections::BTreeMap;

use crate::dcat::{first_texts, DcatEntity};
use crate::document;
use crate::entity::RdfEntity;
use crate::error::Result;
use crate::graph::{Node, Term, Triple};
use crate::metadata::FileType;
use crate::vocab::{RDF_TYPE, SKOS_CONCEPT, SKOS_CONCEPT_SCHEME, SKOS_IN_SCHEME, SKOS_PREF_LABEL};

/// Codelist (`skos:ConceptScheme`)
///
/// Concepts point at their scheme through `skos:inScheme`, so the stored
/// text of a scheme carries every concept of the graph that is in it.
#[derive(Debug, Clone)]
pub struct ConceptScheme(RdfEntity);

impl DcatEntity for ConceptScheme {
    const RDF_TYPE: &'static str = SKOS_CONCEPT_SCHEME;
    const FILE_TYPE: FileType = FileType::Codelist;

    fn from_entity(entity: RdfEntity) -> Self {
        Self(entity)
    }

    fn entity(&self) -> &RdfEntity {
        &self.0
    }

    fn display_name(&self) -> BTreeMap<String, String> {
        first_texts(&self.0, SKOS_PREF_LABEL)
    }

    fn to_text(&self) -> Result<String> {
        let mut subjects = self.0.root_objects();
        for concept in self.concepts() {
            for node in concept.0.root_objects() {
                if !subjects.contains(&node) {
                    subjects.push(node);
                }
            }
        }
        let graph = self.0.read();
        document::serialize(&graph, &subjects)
    }
}

impl ConceptScheme {
    pub fn label(&self, language: &str) -> Option<String> {
        self.0.get_text(SKOS_PREF_LABEL, language)
    }

    pub fn labels(&self) -> BTreeMap<String, Vec<String>> {
        self.0.get_texts(SKOS_PREF_LABEL)
    }

    pub fn set_labels<I, L, V>(&self, labels: I)
    where
        I: IntoIterator<Item = (L, V)>,
        L: AsRef<str>,
        V: AsRef<str>,
    {
        self.0.set_texts(SKOS_PREF_LABEL, labels);
    }

    /// Concepts declaring `skos:inScheme` this scheme, in document order
    pub fn concepts(&self) -> Vec<Concept> {
        let graph = self.0.read();
        let scheme = Term::Node(self.0.node().clone());
        let nodes: Vec<Node> = graph
            .subjects_with(SKOS_IN_SCHEME, &scheme)
            .cloned()
            .collect();
        drop(graph);
        nodes
            .into_iter()
            .map(|node| Concept(self.0.sibling(node)))
            .collect()
    }

    pub fn concept(&self, uri: &str) -> Option<Concept> {
        self.concepts()
            .into_iter()
            .find(|c| c.uri() == Some(uri))
    }

    /// Add a concept to this scheme's graph
    pub fn add_concept(&self, uri: &str) -> Result<Concept> {
        crate::id::validate_uri(uri)?;
        let node = Node::iri(uri);
        {
            let mut graph = self.0.write();
            graph.insert(Triple::new(node.clone(), RDF_TYPE, Term::iri(SKOS_CONCEPT)));
            graph.insert(Triple::new(
                node.clone(),
                SKOS_IN_SCHEME,
                self.0.node().clone(),
            ));
        }
        Ok(Concept(self.0.sibling(node)))
    }
}

/// Codelist entry (`skos:Concept`)
#[derive(Debug, Clone)]
pub struct Concept(RdfEntity);

impl Concept {
    pub fn from_entity(entity: RdfEntity) -> Self {
        Self(entity)
    }

    pub fn entity(&self) -> &RdfEntity {
        &self.0
    }

    pub fn uri(&self) -> Option<&str> {
        self.0.uri()
    }

    pub fn label(&self, language: &str) -> Option<String> {
        self.0.get_text(SKOS_PREF_LABEL, language)
    }

    pub fn labels(&self) -> BTreeMap<String, Vec<String>> {
        self.0.get_texts(SKOS_PREF_LABEL)
    }

    pub fn set_labels<I, L, V>(&self, labels: I)
    where
        I: IntoIterator<Item = (L, V)>,
        L: AsRef<str>,
        V: AsRef<str>,
    {
        self.0.set_texts(SKOS_PREF_LABEL, labels);
    }
}
