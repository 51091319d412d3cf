//! Vocabulary definitions for DCAT-AP catalog mirroring
//!
//! Namespace bindings written into every serialized document and the
//! predicate/type IRIs the typed entity views are mapped to.

pub const DCT_NS: &str = "http://purl.org/dc/terms/";
pub const DCAT_NS: &str = "http://www.w3.org/ns/dcat#";
pub const FOAF_NS: &str = "http://xmlns.com/foaf/0.1/";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const SCHEMA_NS: &str = "http://schema.org/";
pub const SKOS_NS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const VCARD_NS: &str = "http://www.w3.org/2006/vcard/ns#";
pub const LEG_NS: &str = "https://data.gov.sk/def/ontology/law/";

/// Extension namespace for mirror-specific properties
pub const EXT_NS: &str = "https://w3id.org/dcat-mirror/terms/";

/// EuroVoc thesaurus, used to split dataset themes
pub const EUROVOC_PREFIX: &str = "http://eurovoc.europa.eu/";

/// Prefix bindings written into every document created or serialized
pub const DEFAULT_NAMESPACES: [(&str, &str); 10] = [
    ("dct", DCT_NS),
    ("dcat", DCAT_NS),
    ("foaf", FOAF_NS),
    ("rdfs", RDFS_NS),
    ("schema", SCHEMA_NS),
    ("skos", SKOS_NS),
    ("xsd", XSD_NS),
    ("vcard", VCARD_NS),
    ("leg", LEG_NS),
    ("ext", EXT_NS),
];

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

// Types
pub const DCAT_CATALOG: &str = "http://www.w3.org/ns/dcat#Catalog";
pub const DCAT_DATASET: &str = "http://www.w3.org/ns/dcat#Dataset";
pub const DCAT_DISTRIBUTION: &str = "http://www.w3.org/ns/dcat#Distribution";
pub const FOAF_AGENT: &str = "http://xmlns.com/foaf/0.1/Agent";
pub const VCARD_INDIVIDUAL: &str = "http://www.w3.org/2006/vcard/ns#Individual";
pub const DCT_PERIOD_OF_TIME: &str = "http://purl.org/dc/terms/PeriodOfTime";
pub const LEG_TERMS_OF_USE: &str = "https://data.gov.sk/def/ontology/law/TermsOfUse";
pub const SKOS_CONCEPT_SCHEME: &str = "http://www.w3.org/2004/02/skos/core#ConceptScheme";
pub const SKOS_CONCEPT: &str = "http://www.w3.org/2004/02/skos/core#Concept";

/// Types that are stored as records of their own. The serialization
/// closure of an entity never descends into subjects of these types.
pub const INDEPENDENT_TYPES: [&str; 5] = [
    DCAT_CATALOG,
    DCAT_DATASET,
    DCAT_DISTRIBUTION,
    FOAF_AGENT,
    SKOS_CONCEPT_SCHEME,
];

// dct
pub const DCT_TITLE: &str = "http://purl.org/dc/terms/title";
pub const DCT_DESCRIPTION: &str = "http://purl.org/dc/terms/description";
pub const DCT_PUBLISHER: &str = "http://purl.org/dc/terms/publisher";
pub const DCT_TYPE: &str = "http://purl.org/dc/terms/type";
pub const DCT_ACCRUAL_PERIODICITY: &str = "http://purl.org/dc/terms/accrualPeriodicity";
pub const DCT_SPATIAL: &str = "http://purl.org/dc/terms/spatial";
pub const DCT_TEMPORAL: &str = "http://purl.org/dc/terms/temporal";
pub const DCT_RELATION: &str = "http://purl.org/dc/terms/relation";
pub const DCT_IS_PART_OF: &str = "http://purl.org/dc/terms/isPartOf";
pub const DCT_ISSUED: &str = "http://purl.org/dc/terms/issued";
pub const DCT_MODIFIED: &str = "http://purl.org/dc/terms/modified";
pub const DCT_FORMAT: &str = "http://purl.org/dc/terms/format";
pub const DCT_CONFORMS_TO: &str = "http://purl.org/dc/terms/conformsTo";

// dcat
pub const DCAT_DATASET_PROP: &str = "http://www.w3.org/ns/dcat#dataset";
pub const DCAT_DISTRIBUTION_PROP: &str = "http://www.w3.org/ns/dcat#distribution";
pub const DCAT_KEYWORD: &str = "http://www.w3.org/ns/dcat#keyword";
pub const DCAT_THEME: &str = "http://www.w3.org/ns/dcat#theme";
pub const DCAT_CONTACT_POINT: &str = "http://www.w3.org/ns/dcat#contactPoint";
pub const DCAT_LANDING_PAGE: &str = "http://www.w3.org/ns/dcat#landingPage";
pub const DCAT_SPATIAL_RESOLUTION: &str = "http://www.w3.org/ns/dcat#spatialResolutionInMeters";
pub const DCAT_TEMPORAL_RESOLUTION: &str = "http://www.w3.org/ns/dcat#temporalResolution";
pub const DCAT_ACCESS_URL: &str = "http://www.w3.org/ns/dcat#accessURL";
pub const DCAT_DOWNLOAD_URL: &str = "http://www.w3.org/ns/dcat#downloadURL";
pub const DCAT_MEDIA_TYPE: &str = "http://www.w3.org/ns/dcat#mediaType";
pub const DCAT_COMPRESS_FORMAT: &str = "http://www.w3.org/ns/dcat#compressFormat";
pub const DCAT_PACKAGE_FORMAT: &str = "http://www.w3.org/ns/dcat#packageFormat";
pub const DCAT_ACCESS_SERVICE: &str = "http://www.w3.org/ns/dcat#accessService";
pub const DCAT_ENDPOINT_URL: &str = "http://www.w3.org/ns/dcat#endpointURL";
pub const DCAT_START_DATE: &str = "http://www.w3.org/ns/dcat#startDate";
pub const DCAT_END_DATE: &str = "http://www.w3.org/ns/dcat#endDate";

// foaf
pub const FOAF_NAME: &str = "http://xmlns.com/foaf/0.1/name";
pub const FOAF_HOMEPAGE: &str = "http://xmlns.com/foaf/0.1/homepage";
pub const FOAF_MBOX: &str = "http://xmlns.com/foaf/0.1/mbox";
pub const FOAF_PAGE: &str = "http://xmlns.com/foaf/0.1/page";
pub const FOAF_PHONE: &str = "http://xmlns.com/foaf/0.1/phone";

// vcard
pub const VCARD_FN: &str = "http://www.w3.org/2006/vcard/ns#fn";
pub const VCARD_HAS_EMAIL: &str = "http://www.w3.org/2006/vcard/ns#hasEmail";

// skos
pub const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
pub const SKOS_IN_SCHEME: &str = "http://www.w3.org/2004/02/skos/core#inScheme";

// schema
pub const SCHEMA_EMAIL: &str = "http://schema.org/email";
pub const SCHEMA_PHONE: &str = "http://schema.org/telephone";

// leg
pub const LEG_TERMS_OF_USE_PROP: &str = "https://data.gov.sk/def/ontology/law/termsOfUse";
pub const LEG_AUTHORS_WORK_TYPE: &str = "https://data.gov.sk/def/ontology/law/authorsWorkType";
pub const LEG_ORIGINAL_DATABASE_TYPE: &str =
    "https://data.gov.sk/def/ontology/law/originalDatabaseType";
pub const LEG_DATABASE_PROTECTED_BY_SPECIAL_RIGHTS_TYPE: &str =
    "https://data.gov.sk/def/ontology/law/databaseProtectedBySpecialRightsType";
pub const LEG_PERSONAL_DATA_CONTAINMENT_TYPE: &str =
    "https://data.gov.sk/def/ontology/law/personalDataContainmentType";
pub const LEG_AUTHOR_NAME: &str = "https://data.gov.sk/def/ontology/law/authorName";
pub const LEG_ORIGINAL_DATABASE_AUTHOR_NAME: &str =
    "https://data.gov.sk/def/ontology/law/originalDatabaseAuthorName";

// ext
pub const EXT_IS_SERIE: &str = "https://w3id.org/dcat-mirror/terms/isSerie";
pub const EXT_IS_HVD: &str = "https://w3id.org/dcat-mirror/terms/isHvd";

// xsd datatypes
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// Whether `iri` names a subject type that is stored independently
pub fn is_independent_type(iri: &str) -> bool {
    INDEPENDENT_TYPES.contains(&iri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespaces_cover_type_iris() {
        for iri in INDEPENDENT_TYPES {
            assert!(
                DEFAULT_NAMESPACES.iter().any(|(_, ns)| iri.starts_with(ns)),
                "{iri} has no prefix binding"
            );
        }
    }

    #[test]
    fn test_sub_resource_types_are_not_independent() {
        assert!(is_independent_type(DCAT_DATASET));
        assert!(!is_independent_type(VCARD_INDIVIDUAL));
        assert!(!is_independent_type(DCT_PERIOD_OF_TIME));
        assert!(!is_independent_type(LEG_TERMS_OF_USE));
    }
}
