//! Typed DCAT-AP views over [`RdfEntity`]
//!
//! Each view is a thin newtype around an entity handle that maps named
//! properties onto fixed predicate IRIs. Views are built on demand and
//! carry no state of their own.

use std::collections::BTreeMap;

use crate::document::{self, entities_of, Document};
use crate::entity::RdfEntity;
use crate::error::Result;
use crate::metadata::{derive_record, DeriveContext, FileType, MetadataRecord, TAG_URI};
use crate::vocab::DCT_TITLE;

mod agent;
mod catalog;
mod concept;
mod dataset;
mod distribution;
mod resources;

pub use agent::Agent;
pub use catalog::Catalog;
pub use concept::{Concept, ConceptScheme};
pub use dataset::Dataset;
pub use distribution::Distribution;
pub use resources::{LegalTerms, TemporalPeriod, VCard};

/// Behaviour shared by every stored DCAT entity type
pub trait DcatEntity: Sized + Clone + Send + Sync {
    /// `rdf:type` identifying subjects of this view
    const RDF_TYPE: &'static str;
    /// Record type used when the entity is stored
    const FILE_TYPE: FileType;

    fn from_entity(entity: RdfEntity) -> Self;

    fn entity(&self) -> &RdfEntity;

    fn uri(&self) -> Option<&str> {
        self.entity().uri()
    }

    /// New document holding only this entity's type statement
    fn create(uri: &str) -> Result<Self> {
        document::create(uri, Self::RDF_TYPE).map(Self::from_entity)
    }

    /// First entity of this type in `text`, if any
    fn parse(text: &str) -> Result<Option<Self>> {
        let doc = Document::parse(text)?;
        Ok(entities_of::<Self>(doc.graph()).into_iter().next())
    }

    fn to_text(&self) -> Result<String> {
        self.entity().serialize()
    }

    /// Record display name keyed by language
    fn display_name(&self) -> BTreeMap<String, String> {
        first_texts(self.entity(), DCT_TITLE)
    }

    /// Tags computed from the entity's own properties. Every key returned
    /// is rewritten on refresh, so keys with no value clear stale tags.
    fn content_tags(&self) -> BTreeMap<String, Vec<String>> {
        uri_tag(self.entity())
    }

    fn derive_metadata(
        &self,
        existing: Option<&MetadataRecord>,
        ctx: &DeriveContext,
    ) -> MetadataRecord {
        derive_record(
            Self::FILE_TYPE,
            self.display_name(),
            self.content_tags(),
            existing,
            ctx,
        )
    }
}

/// First value per language of a text property
pub(crate) fn first_texts(entity: &RdfEntity, name: &str) -> BTreeMap<String, String> {
    entity
        .get_texts(name)
        .into_iter()
        .filter_map(|(lang, values)| values.into_iter().next().map(|v| (lang, v)))
        .collect()
}

pub(crate) fn uri_tag(entity: &RdfEntity) -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([(
        TAG_URI.to_string(),
        entity.uri().map(str::to_string).into_iter().collect(),
    )])
}
