//! DCAT Catalog Mirror Library
//!
//! This library keeps a local, file-backed mirror of open-data catalogs
//! described in RDF/DCAT-AP, synchronized with metadata harvested from
//! remote SPARQL endpoints.
//!
//! # Overview
//!
//! - [`graph`] and [`entity`] give a small RDF model: a triple graph and
//!   (graph, subject) handles with typed property access.
//! - [`dcat`] maps DCAT-AP classes (catalog, dataset, distribution,
//!   agent, concept scheme) onto those handles.
//! - [`document`] parses and serializes Turtle canonically, so equal
//!   content always produces equal text.
//! - [`harvest`] reconciles fetched descriptions with stored records,
//!   keyed by canonical URI, and keeps dataset series links acyclic with
//!   the help of [`series`].
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use dcat_mirror::{FileStorage, HarvestConfig, Harvester, SparqlClient};
//!
//! let config = HarvestConfig::from_env();
//! let storage = Arc::new(FileStorage::open("./mirror").await?);
//! let source = Arc::new(SparqlClient::new(config.timeout)?);
//! Harvester::new(storage, source, config).run().await?;
//! ```

pub mod codelist;
pub mod dcat;
pub mod document;
pub mod entity;
pub mod error;
pub mod graph;
pub mod harvest;
pub mod id;
pub mod metadata;
pub mod series;
pub mod sparql;
pub mod storage;
pub mod vocab;

// Re-export main types for convenience
pub use crate::codelist::{CodelistCache, CodelistProvider, StorageCodelistProvider};
pub use crate::dcat::{
    Agent, Catalog, Concept, ConceptScheme, Dataset, DcatEntity, Distribution, LegalTerms,
    TemporalPeriod, VCard,
};
pub use crate::document::Document;
pub use crate::entity::RdfEntity;
pub use crate::error::{CatalogError, ErrorChain, Result};
pub use crate::harvest::{HarvestConfig, Harvester, Impersonator, Principal, PublisherPrincipal};
pub use crate::metadata::{DeriveContext, FileType, MetadataRecord, RecordBuilder};
pub use crate::series::{link_to_serie, SeriesValidator};
pub use crate::sparql::{HarvestSource, SparqlClient};
pub use crate::storage::{DocumentStorage, FileStorage, MemoryStorage, StorageQuery, StoredDocument};
