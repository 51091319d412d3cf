use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::dcat::{uri_tag, DcatEntity, VCard};
use crate::entity::RdfEntity;
use crate::metadata::{FileType, TAG_ENDPOINT};
use crate::vocab::{
    DCAT_CATALOG, DCAT_CONTACT_POINT, DCAT_DATASET_PROP, DCAT_ENDPOINT_URL, DCT_DESCRIPTION,
    DCT_ISSUED, DCT_MODIFIED, DCT_PUBLISHER, DCT_TITLE, FOAF_HOMEPAGE, VCARD_INDIVIDUAL,
};

/// Catalog (`dcat:Catalog`)
///
/// Stored catalogs are the local catalogs harvesting runs over; their
/// `dcat:endpointURL` names the SPARQL endpoint to harvest from.
#[derive(Debug, Clone)]
pub struct Catalog(RdfEntity);

impl DcatEntity for Catalog {
    const RDF_TYPE: &'static str = DCAT_CATALOG;
    const FILE_TYPE: FileType = FileType::LocalCatalog;

    fn from_entity(entity: RdfEntity) -> Self {
        Self(entity)
    }

    fn entity(&self) -> &RdfEntity {
        &self.0
    }

    fn content_tags(&self) -> BTreeMap<String, Vec<String>> {
        let mut tags = uri_tag(&self.0);
        tags.insert(
            TAG_ENDPOINT.to_string(),
            self.endpoint_url().into_iter().collect(),
        );
        tags
    }
}

impl Catalog {
    pub fn title(&self, language: &str) -> Option<String> {
        self.0.get_text(DCT_TITLE, language)
    }

    pub fn titles(&self) -> BTreeMap<String, Vec<String>> {
        self.0.get_texts(DCT_TITLE)
    }

    pub fn set_titles<I, L, V>(&self, titles: I)
    where
        I: IntoIterator<Item = (L, V)>,
        L: AsRef<str>,
        V: AsRef<str>,
    {
        self.0.set_texts(DCT_TITLE, titles);
    }

    pub fn descriptions(&self) -> BTreeMap<String, Vec<String>> {
        self.0.get_texts(DCT_DESCRIPTION)
    }

    pub fn set_descriptions<I, L, V>(&self, descriptions: I)
    where
        I: IntoIterator<Item = (L, V)>,
        L: AsRef<str>,
        V: AsRef<str>,
    {
        self.0.set_texts(DCT_DESCRIPTION, descriptions);
    }

    pub fn publisher(&self) -> Option<String> {
        self.0.get_uri(DCT_PUBLISHER)
    }

    pub fn set_publisher(&self, uri: Option<&str>) {
        self.0.set_uri(DCT_PUBLISHER, uri);
    }

    pub fn homepage(&self) -> Option<String> {
        self.0.get_uri(FOAF_HOMEPAGE)
    }

    pub fn set_homepage(&self, uri: Option<&str>) {
        self.0.set_uri(FOAF_HOMEPAGE, uri);
    }

    pub fn endpoint_url(&self) -> Option<String> {
        self.0.get_uri(DCAT_ENDPOINT_URL)
    }

    pub fn set_endpoint_url(&self, uri: Option<&str>) {
        self.0.set_uri(DCAT_ENDPOINT_URL, uri);
    }

    pub fn datasets(&self) -> Vec<String> {
        self.0.get_uris(DCAT_DATASET_PROP)
    }

    pub fn set_datasets<I, S>(&self, uris: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0.set_uris(DCAT_DATASET_PROP, uris);
    }

    pub fn contact_point(&self) -> Option<VCard> {
        self.0
            .get_sub_resource(DCAT_CONTACT_POINT)
            .map(VCard::from_entity)
    }

    /// Replace the contact point with a fresh, empty one
    pub fn create_contact_point(&self) -> VCard {
        VCard::from_entity(
            self.0
                .create_sub_resource(DCAT_CONTACT_POINT, VCARD_INDIVIDUAL),
        )
    }

    pub fn issued(&self) -> Option<NaiveDate> {
        self.0.get_date(DCT_ISSUED)
    }

    pub fn set_issued(&self, date: Option<NaiveDate>) {
        self.0.set_date(DCT_ISSUED, date);
    }

    pub fn modified(&self) -> Option<NaiveDate> {
        self.0.get_date(DCT_MODIFIED)
    }

    pub fn set_modified(&self, date: Option<NaiveDate>) {
        self.0.set_date(DCT_MODIFIED, date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{DeriveContext, TAG_URI};

    #[test]
    fn test_catalog_round_trip() {
        let catalog = Catalog::create("https://data.example/catalog").unwrap();
        catalog.set_titles([("sk", "Katalóg")]);
        catalog.set_descriptions([("en", "Open data of the ministry")]);
        catalog.set_publisher(Some("https://data.example/agent"));
        catalog.set_homepage(Some("https://data.example"));
        catalog.set_endpoint_url(Some("https://data.example/sparql"));
        catalog.set_datasets(["https://data.example/ds/1", "https://data.example/ds/2"]);
        catalog.set_issued(NaiveDate::from_ymd_opt(2020, 1, 31));
        let contact = catalog.create_contact_point();
        contact.set_names([("sk", "Oddelenie")]);
        contact.set_email(Some("data@data.example"));

        let parsed = Catalog::parse(&catalog.to_text().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(parsed.titles(), catalog.titles());
        assert_eq!(parsed.descriptions(), catalog.descriptions());
        assert_eq!(parsed.publisher(), catalog.publisher());
        assert_eq!(parsed.homepage(), catalog.homepage());
        assert_eq!(parsed.endpoint_url(), catalog.endpoint_url());
        assert_eq!(parsed.datasets().len(), 2);
        assert_eq!(parsed.issued(), catalog.issued());
        assert_eq!(parsed.modified(), None);
        let parsed_contact = parsed.contact_point().unwrap();
        assert_eq!(parsed_contact.name("sk").as_deref(), Some("Oddelenie"));
        assert_eq!(parsed_contact.email().as_deref(), Some("data@data.example"));
    }

    #[test]
    fn test_catalog_metadata() {
        let catalog = Catalog::create("https://data.example/catalog").unwrap();
        catalog.set_titles([("sk", "Katalóg")]);
        catalog.set_endpoint_url(Some("https://data.example/sparql"));
        let record = catalog.derive_metadata(None, &DeriveContext::default());
        assert_eq!(record.file_type(), FileType::LocalCatalog);
        assert_eq!(record.tag_value(TAG_URI), Some("https://data.example/catalog"));
        assert_eq!(
            record.tag_value(TAG_ENDPOINT),
            Some("https://data.example/sparql")
        );
        assert_eq!(record.name()["sk"], "Katalóg");
    }
}
