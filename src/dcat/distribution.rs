use std::collections::BTreeMap;

use crate::dcat::{uri_tag, DcatEntity, LegalTerms};
use crate::entity::RdfEntity;
use crate::metadata::{FileType, TAG_FORMATS};
use crate::vocab::{
    DCAT_ACCESS_SERVICE, DCAT_ACCESS_URL, DCAT_COMPRESS_FORMAT, DCAT_DISTRIBUTION,
    DCAT_DOWNLOAD_URL, DCAT_MEDIA_TYPE, DCAT_PACKAGE_FORMAT, DCT_CONFORMS_TO, DCT_FORMAT,
    DCT_TITLE, LEG_TERMS_OF_USE, LEG_TERMS_OF_USE_PROP,
};

/// Distribution (`dcat:Distribution`)
#[derive(Debug, Clone)]
pub struct Distribution(RdfEntity);

impl DcatEntity for Distribution {
    const RDF_TYPE: &'static str = DCAT_DISTRIBUTION;
    const FILE_TYPE: FileType = FileType::Distribution;

    fn from_entity(entity: RdfEntity) -> Self {
        Self(entity)
    }

    fn entity(&self) -> &RdfEntity {
        &self.0
    }

    fn content_tags(&self) -> BTreeMap<String, Vec<String>> {
        let mut tags = uri_tag(&self.0);
        tags.insert(TAG_FORMATS.to_string(), self.format().into_iter().collect());
        tags
    }
}

impl Distribution {
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

    pub fn access_url(&self) -> Option<String> {
        self.0.get_uri(DCAT_ACCESS_URL)
    }

    pub fn set_access_url(&self, uri: Option<&str>) {
        self.0.set_uri(DCAT_ACCESS_URL, uri);
    }

    pub fn download_url(&self) -> Option<String> {
        self.0.get_uri(DCAT_DOWNLOAD_URL)
    }

    pub fn set_download_url(&self, uri: Option<&str>) {
        self.0.set_uri(DCAT_DOWNLOAD_URL, uri);
    }

    /// File format concept (`dct:format`)
    pub fn format(&self) -> Option<String> {
        self.0.get_uri(DCT_FORMAT)
    }

    pub fn set_format(&self, uri: Option<&str>) {
        self.0.set_uri(DCT_FORMAT, uri);
    }

    pub fn media_type(&self) -> Option<String> {
        self.0.get_uri(DCAT_MEDIA_TYPE)
    }

    pub fn set_media_type(&self, uri: Option<&str>) {
        self.0.set_uri(DCAT_MEDIA_TYPE, uri);
    }

    pub fn compress_format(&self) -> Option<String> {
        self.0.get_uri(DCAT_COMPRESS_FORMAT)
    }

    pub fn set_compress_format(&self, uri: Option<&str>) {
        self.0.set_uri(DCAT_COMPRESS_FORMAT, uri);
    }

    pub fn package_format(&self) -> Option<String> {
        self.0.get_uri(DCAT_PACKAGE_FORMAT)
    }

    pub fn set_package_format(&self, uri: Option<&str>) {
        self.0.set_uri(DCAT_PACKAGE_FORMAT, uri);
    }

    pub fn conforms_to(&self) -> Option<String> {
        self.0.get_uri(DCT_CONFORMS_TO)
    }

    pub fn set_conforms_to(&self, uri: Option<&str>) {
        self.0.set_uri(DCT_CONFORMS_TO, uri);
    }

    pub fn access_service(&self) -> Option<String> {
        self.0.get_uri(DCAT_ACCESS_SERVICE)
    }

    pub fn set_access_service(&self, uri: Option<&str>) {
        self.0.set_uri(DCAT_ACCESS_SERVICE, uri);
    }

    pub fn terms_of_use(&self) -> Option<LegalTerms> {
        self.0
            .get_sub_resource(LEG_TERMS_OF_USE_PROP)
            .map(LegalTerms::from_entity)
    }

    /// Replace the terms of use with a fresh, empty set
    pub fn create_terms_of_use(&self) -> LegalTerms {
        LegalTerms::from_entity(
            self.0
                .create_sub_resource(LEG_TERMS_OF_USE_PROP, LEG_TERMS_OF_USE),
        )
    }
}
