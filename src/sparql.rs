//! Remote DCAT descriptions fetched over SPARQL
//!
//! [`HarvestSource`] is what the harvester consumes; [`SparqlClient`] is
//! its HTTP implementation issuing `CONSTRUCT` queries and reading the
//! Turtle response back through the document parser.

use std::time::Duration;

use async_trait::async_trait;
use oxrdf::NamedNode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

use crate::dcat::{Catalog, Dataset, DcatEntity, Distribution};
use crate::document::{entities_of, Document};
use crate::error::{CatalogError, ErrorChain, Result};
use crate::vocab::{DCAT_NS, DCT_NS, LEG_NS};

const SPARQL_QUERY_CONTENT_TYPE: &str = "application/sparql-query";
const TURTLE_CONTENT_TYPE: &str = "text/turtle";

/// Remote side of a harvest
#[async_trait]
pub trait HarvestSource: Send + Sync {
    /// The remote description of a catalog; `None` when the endpoint no
    /// longer knows it
    async fn fetch_catalog(&self, endpoint: &str, catalog_uri: &str) -> Result<Option<Catalog>>;

    /// Datasets of a catalog, in response order
    async fn fetch_datasets(&self, endpoint: &str, catalog_uri: &str) -> Result<Vec<Dataset>>;

    /// Distributions of a dataset, in response order
    async fn fetch_distributions(&self, endpoint: &str, dataset_uri: &str)
        -> Result<Vec<Distribution>>;
}

/// HTTP SPARQL protocol client
#[derive(Debug, Clone)]
pub struct SparqlClient {
    client: Client,
}

impl SparqlClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Run a `CONSTRUCT` query and parse the resulting graph
    pub async fn construct(&self, endpoint: &str, query: &str) -> Result<Document> {
        debug!(endpoint = %endpoint, "SPARQL CONSTRUCT");
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, SPARQL_QUERY_CONTENT_TYPE)
            .header(ACCEPT, TURTLE_CONTENT_TYPE)
            .body(query.to_string())
            .send()
            .await
            .map_err(|e| fetch_error(endpoint, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Fetch {
                endpoint: endpoint.to_string(),
                reason: format!("endpoint returned {}: {}", status, body.trim()),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| fetch_error(endpoint, &e))?;
        Document::parse(&text)
    }
}

fn fetch_error(endpoint: &str, error: &reqwest::Error) -> CatalogError {
    CatalogError::Fetch {
        endpoint: endpoint.to_string(),
        reason: ErrorChain(error).to_string(),
    }
}

/// `<iri>` for embedding in a query; rejects anything that is not an IRI
fn iri_ref(uri: &str) -> Result<String> {
    NamedNode::new(uri)
        .map(|n| n.to_string())
        .map_err(|_| CatalogError::InvalidIri(uri.to_string()))
}

fn prologue() -> String {
    format!(
        "PREFIX dcat: <{}>\nPREFIX dct: <{}>\nPREFIX leg: <{}>\n",
        DCAT_NS, DCT_NS, LEG_NS
    )
}

pub(crate) fn catalog_query(catalog_uri: &str) -> Result<String> {
    let catalog = iri_ref(catalog_uri)?;
    Ok(format!(
        "{prologue}CONSTRUCT {{ {c} ?p ?o . ?n ?np ?no }} WHERE {{\n  \
         {{ {c} a dcat:Catalog ; ?p ?o }}\n  \
         UNION {{ {c} a dcat:Catalog ; dcat:contactPoint ?n . ?n ?np ?no }}\n}}",
        prologue = prologue(),
        c = catalog
    ))
}

pub(crate) fn datasets_query(catalog_uri: &str) -> Result<String> {
    let catalog = iri_ref(catalog_uri)?;
    Ok(format!(
        "{prologue}CONSTRUCT {{ ?s ?p ?o . ?n ?np ?no }} WHERE {{\n  \
         {{ {c} dcat:dataset ?s . ?s a dcat:Dataset ; ?p ?o }}\n  \
         UNION {{ {c} dcat:dataset ?s . ?s a dcat:Dataset ; dcat:contactPoint|dct:temporal ?n . ?n ?np ?no }}\n}}",
        prologue = prologue(),
        c = catalog
    ))
}

pub(crate) fn distributions_query(dataset_uri: &str) -> Result<String> {
    let dataset = iri_ref(dataset_uri)?;
    Ok(format!(
        "{prologue}CONSTRUCT {{ ?s ?p ?o . ?n ?np ?no }} WHERE {{\n  \
         {{ {d} dcat:distribution ?s . ?s a dcat:Distribution ; ?p ?o }}\n  \
         UNION {{ {d} dcat:distribution ?s . ?s a dcat:Distribution ; leg:termsOfUse ?n . ?n ?np ?no }}\n}}",
        prologue = prologue(),
        d = dataset
    ))
}

#[async_trait]
impl HarvestSource for SparqlClient {
    async fn fetch_catalog(&self, endpoint: &str, catalog_uri: &str) -> Result<Option<Catalog>> {
        let doc = self.construct(endpoint, &catalog_query(catalog_uri)?).await?;
        Ok(entities_of::<Catalog>(doc.graph())
            .into_iter()
            .find(|c| c.uri() == Some(catalog_uri)))
    }

    async fn fetch_datasets(&self, endpoint: &str, catalog_uri: &str) -> Result<Vec<Dataset>> {
        let doc = self.construct(endpoint, &datasets_query(catalog_uri)?).await?;
        Ok(doc.datasets)
    }

    async fn fetch_distributions(
        &self,
        endpoint: &str,
        dataset_uri: &str,
    ) -> Result<Vec<Distribution>> {
        let doc = self
            .construct(endpoint, &distributions_query(dataset_uri)?)
            .await?;
        Ok(doc.distributions)
    }
}
