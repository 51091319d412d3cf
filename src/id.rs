//! Identifier handling for mirrored entities
//!
//! Two kinds of identifiers meet here: canonical URIs (RDF subjects,
//! the join key between harvested and stored descriptions) and local
//! record ids (opaque, minted by this crate).

use ulid::Ulid;
use url::Url;

use crate::error::{CatalogError, Result};
use crate::vocab::EUROVOC_PREFIX;

/// Classification of an RDF node identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdKind {
    /// Blank node label: "_:b0"
    Blank,
    /// Dereferenceable URI: "https://...", "http://..."
    Web,
    /// Other absolute URI: "urn:...", "mailto:...", "tel:..."
    Absolute,
    /// Anything that does not parse as an absolute URI
    Relative,
}

/// Classify a node identifier
pub fn classify_id(id: &str) -> IdKind {
    if id.starts_with("_:") {
        return IdKind::Blank;
    }
    match Url::parse(id) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => IdKind::Web,
        Ok(_) => IdKind::Absolute,
        Err(_) => IdKind::Relative,
    }
}

/// Check that `uri` is an absolute URI usable as a canonical identity
pub fn validate_uri(uri: &str) -> Result<()> {
    match classify_id(uri) {
        IdKind::Web | IdKind::Absolute => Ok(()),
        IdKind::Blank | IdKind::Relative => Err(CatalogError::InvalidIri(uri.to_string())),
    }
}

/// Mint a new local record id
pub fn mint_local_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

/// Mint a URI for a sub-resource owned by `base`
///
/// "https://example.org/dataset/1" + "contactPoint"
///     -> "https://example.org/dataset/1/contactPoint/01h..."
///
/// Bases that are not web URIs get a `urn:ulid:` identifier instead.
pub fn mint_sub_resource_uri(base: Option<&str>, segment: &str) -> String {
    let ulid = Ulid::new().to_string().to_lowercase();
    match base {
        Some(base) if classify_id(base) == IdKind::Web => {
            let base = base.trim_end_matches(['/', '#']);
            format!("{}/{}/{}", base, segment, ulid)
        }
        _ => format!("urn:ulid:{}", ulid),
    }
}

/// Last path segment or fragment of a predicate IRI
///
/// "http://www.w3.org/ns/dcat#contactPoint" -> "contactPoint"
/// "http://purl.org/dc/terms/temporal" -> "temporal"
pub fn local_name(iri: &str) -> &str {
    let trimmed = iri.trim_end_matches(['/', '#']);
    match trimmed.rfind(['/', '#']) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// Whether a theme URI belongs to the EuroVoc thesaurus
pub fn is_eurovoc(uri: &str) -> bool {
    uri.starts_with(EUROVOC_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_id() {
        assert_eq!(classify_id("_:b0"), IdKind::Blank);
        assert_eq!(classify_id("https://data.gov.sk/id/dataset/1"), IdKind::Web);
        assert_eq!(classify_id("http://example.org"), IdKind::Web);
        assert_eq!(classify_id("urn:ulid:01h"), IdKind::Absolute);
        assert_eq!(classify_id("mailto:someone@example.org"), IdKind::Absolute);
        assert_eq!(classify_id("dataset/1"), IdKind::Relative);
        assert_eq!(classify_id(""), IdKind::Relative);
    }

    #[test]
    fn test_validate_uri() {
        assert!(validate_uri("https://example.org/ds").is_ok());
        assert!(validate_uri("urn:x:1").is_ok());
        assert!(matches!(
            validate_uri("./ds"),
            Err(CatalogError::InvalidIri(_))
        ));
        assert!(validate_uri("_:b1").is_err());
    }

    #[test]
    fn test_mint_local_id_unique() {
        let a = mint_local_id();
        let b = mint_local_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 26);
    }

    #[test]
    fn test_mint_sub_resource_uri() {
        let uri = mint_sub_resource_uri(Some("https://example.org/ds/1/"), "contactPoint");
        assert!(uri.starts_with("https://example.org/ds/1/contactPoint/"));

        let uri = mint_sub_resource_uri(Some("_:b0"), "temporal");
        assert!(uri.starts_with("urn:ulid:"));

        let uri = mint_sub_resource_uri(None, "temporal");
        assert!(uri.starts_with("urn:ulid:"));
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("http://www.w3.org/ns/dcat#contactPoint"), "contactPoint");
        assert_eq!(local_name("http://purl.org/dc/terms/temporal"), "temporal");
        assert_eq!(local_name("plain"), "plain");
    }

    #[test]
    fn test_is_eurovoc() {
        assert!(is_eurovoc("http://eurovoc.europa.eu/100141"));
        assert!(!is_eurovoc("http://publications.europa.eu/resource/authority/data-theme/ECON"));
    }
}
