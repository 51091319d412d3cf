use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::dcat::{uri_tag, DcatEntity, TemporalPeriod, VCard};
use crate::entity::RdfEntity;
use crate::id::is_eurovoc;
use crate::metadata::{FileType, TAG_EUROVOC_THEMES, TAG_KEYWORDS, TAG_THEMES};
use crate::vocab::{
    DCAT_CONTACT_POINT, DCAT_DATASET, DCAT_DISTRIBUTION_PROP, DCAT_KEYWORD, DCAT_LANDING_PAGE,
    DCAT_SPATIAL_RESOLUTION, DCAT_TEMPORAL_RESOLUTION, DCAT_THEME, DCT_ACCRUAL_PERIODICITY,
    DCT_CONFORMS_TO, DCT_DESCRIPTION, DCT_IS_PART_OF, DCT_ISSUED, DCT_MODIFIED, DCT_PERIOD_OF_TIME,
    DCT_PUBLISHER, DCT_RELATION, DCT_SPATIAL, DCT_TEMPORAL, DCT_TITLE, DCT_TYPE, EXT_IS_HVD,
    EXT_IS_SERIE, FOAF_PAGE, VCARD_INDIVIDUAL,
};

/// Dataset (`dcat:Dataset`)
#[derive(Debug, Clone)]
pub struct Dataset(RdfEntity);

impl DcatEntity for Dataset {
    const RDF_TYPE: &'static str = DCAT_DATASET;
    const FILE_TYPE: FileType = FileType::Dataset;

    fn from_entity(entity: RdfEntity) -> Self {
        Self(entity)
    }

    fn entity(&self) -> &RdfEntity {
        &self.0
    }

    fn content_tags(&self) -> BTreeMap<String, Vec<String>> {
        let (eurovoc, themes): (Vec<String>, Vec<String>) =
            self.themes().into_iter().partition(|t| is_eurovoc(t));
        let mut keywords: Vec<String> = self.keywords().into_values().flatten().collect();
        keywords.sort();
        keywords.dedup();

        let mut tags = uri_tag(&self.0);
        tags.insert(TAG_THEMES.to_string(), themes);
        tags.insert(TAG_EUROVOC_THEMES.to_string(), eurovoc);
        tags.insert(TAG_KEYWORDS.to_string(), keywords);
        tags
    }
}

impl Dataset {
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

    pub fn description(&self, language: &str) -> Option<String> {
        self.0.get_text(DCT_DESCRIPTION, language)
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

    pub fn keywords(&self) -> BTreeMap<String, Vec<String>> {
        self.0.get_texts(DCAT_KEYWORD)
    }

    pub fn set_keywords(&self, keywords: &BTreeMap<String, Vec<String>>) {
        self.0.set_text_lists(DCAT_KEYWORD, keywords);
    }

    /// Every `dcat:theme`, EuroVoc concepts included
    pub fn themes(&self) -> Vec<String> {
        self.0.get_uris(DCAT_THEME)
    }

    pub fn set_themes<I, S>(&self, uris: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0.set_uris(DCAT_THEME, uris);
    }

    pub fn eurovoc_themes(&self) -> Vec<String> {
        self.themes().into_iter().filter(|t| is_eurovoc(t)).collect()
    }

    pub fn types(&self) -> Vec<String> {
        self.0.get_uris(DCT_TYPE)
    }

    pub fn set_types<I, S>(&self, uris: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0.set_uris(DCT_TYPE, uris);
    }

    pub fn accrual_periodicity(&self) -> Option<String> {
        self.0.get_uri(DCT_ACCRUAL_PERIODICITY)
    }

    pub fn set_accrual_periodicity(&self, uri: Option<&str>) {
        self.0.set_uri(DCT_ACCRUAL_PERIODICITY, uri);
    }

    pub fn spatial(&self) -> Vec<String> {
        self.0.get_uris(DCT_SPATIAL)
    }

    pub fn set_spatial<I, S>(&self, uris: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0.set_uris(DCT_SPATIAL, uris);
    }

    pub fn temporal(&self) -> Option<TemporalPeriod> {
        self.0
            .get_sub_resource(DCT_TEMPORAL)
            .map(TemporalPeriod::from_entity)
    }

    /// Replace the temporal coverage with a new period
    pub fn set_temporal(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> TemporalPeriod {
        let period =
            TemporalPeriod::from_entity(self.0.create_sub_resource(DCT_TEMPORAL, DCT_PERIOD_OF_TIME));
        period.set_start(start);
        period.set_end(end);
        period
    }

    pub fn remove_temporal(&self) {
        self.0.remove_sub_resource(DCT_TEMPORAL);
    }

    /// `dcat:temporalResolution` as its xsd:duration text
    pub fn temporal_resolution(&self) -> Option<String> {
        self.0.get_literal(DCAT_TEMPORAL_RESOLUTION)
    }

    pub fn set_temporal_resolution(&self, duration: Option<&str>) {
        self.0.set_literal(DCAT_TEMPORAL_RESOLUTION, duration);
    }

    pub fn spatial_resolution_in_meters(&self) -> Option<f64> {
        self.0.get_decimal(DCAT_SPATIAL_RESOLUTION)
    }

    pub fn set_spatial_resolution_in_meters(&self, meters: Option<f64>) {
        self.0.set_decimal(DCAT_SPATIAL_RESOLUTION, meters);
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

    pub fn documentation(&self) -> Option<String> {
        self.0.get_uri(FOAF_PAGE)
    }

    pub fn set_documentation(&self, uri: Option<&str>) {
        self.0.set_uri(FOAF_PAGE, uri);
    }

    pub fn relations(&self) -> Vec<String> {
        self.0.get_uris(DCT_RELATION)
    }

    pub fn set_relations<I, S>(&self, uris: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0.set_uris(DCT_RELATION, uris);
    }

    pub fn landing_page(&self) -> Option<String> {
        self.0.get_uri(DCAT_LANDING_PAGE)
    }

    pub fn set_landing_page(&self, uri: Option<&str>) {
        self.0.set_uri(DCAT_LANDING_PAGE, uri);
    }

    pub fn specification(&self) -> Option<String> {
        self.0.get_uri(DCT_CONFORMS_TO)
    }

    pub fn set_specification(&self, uri: Option<&str>) {
        self.0.set_uri(DCT_CONFORMS_TO, uri);
    }

    pub fn publisher(&self) -> Option<String> {
        self.0.get_uri(DCT_PUBLISHER)
    }

    pub fn set_publisher(&self, uri: Option<&str>) {
        self.0.set_uri(DCT_PUBLISHER, uri);
    }

    pub fn distributions(&self) -> Vec<String> {
        self.0.get_uris(DCAT_DISTRIBUTION_PROP)
    }

    pub fn set_distributions<I, S>(&self, uris: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0.set_uris(DCAT_DISTRIBUTION_PROP, uris);
    }

    /// Canonical URI of the series this dataset belongs to
    pub fn is_part_of(&self) -> Option<String> {
        self.0.get_uri(DCT_IS_PART_OF)
    }

    pub fn set_is_part_of(&self, uri: Option<&str>) {
        self.0.set_uri(DCT_IS_PART_OF, uri);
    }

    pub fn is_serie(&self) -> bool {
        self.0.get_boolean(EXT_IS_SERIE).unwrap_or(false)
    }

    pub fn set_is_serie(&self, value: bool) {
        self.0.set_boolean(EXT_IS_SERIE, value.then_some(true));
    }

    /// High-value dataset flag
    pub fn is_hvd(&self) -> bool {
        self.0.get_boolean(EXT_IS_HVD).unwrap_or(false)
    }

    pub fn set_is_hvd(&self, value: bool) {
        self.0.set_boolean(EXT_IS_HVD, value.then_some(true));
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

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn sample() -> Dataset {
        let ds = Dataset::create("https://data.example/ds/1").unwrap();
        ds.set_titles([("sk", "Rozpočet"), ("en", "Budget")]);
        ds.set_descriptions([("sk", "Rozpočet mesta")]);
        ds.set_keywords(&BTreeMap::from([
            ("sk".to_string(), vec!["rozpočet".to_string(), "mesto".to_string()]),
            ("en".to_string(), vec!["budget".to_string()]),
        ]));
        ds.set_themes([
            "http://publications.europa.eu/resource/authority/data-theme/ECON",
            "http://eurovoc.europa.eu/100141",
        ]);
        ds.set_types(["https://data.gov.sk/set/codelist/dataset-type/1"]);
        ds.set_accrual_periodicity(Some(
            "http://publications.europa.eu/resource/authority/frequency/ANNUAL",
        ));
        ds.set_spatial(["http://publications.europa.eu/resource/authority/country/SVK"]);
        ds.set_temporal(date(2020, 1, 1), date(2020, 12, 31));
        ds.set_temporal_resolution(Some("P1D"));
        ds.set_spatial_resolution_in_meters(Some(12.5));
        ds.create_contact_point().set_email(Some("budget@data.example"));
        ds.set_documentation(Some("https://data.example/docs"));
        ds.set_relations(["https://data.example/ds/other"]);
        ds.set_landing_page(Some("https://data.example/budget"));
        ds.set_specification(Some("https://data.example/spec"));
        ds.set_publisher(Some("https://data.example/agent"));
        ds.set_distributions(["https://data.example/dist/1"]);
        ds.set_is_part_of(Some("https://data.example/series/1"));
        ds.set_is_hvd(true);
        ds.set_issued(date(2021, 3, 1));
        ds.set_modified(date(2021, 4, 2));
        ds
    }

    #[test]
    fn test_dataset_round_trip() {
        let ds = sample();
        let parsed = Dataset::parse(&ds.to_text().unwrap()).unwrap().unwrap();

        assert_eq!(parsed.uri(), ds.uri());
        assert_eq!(parsed.titles(), ds.titles());
        assert_eq!(parsed.descriptions(), ds.descriptions());
        assert_eq!(parsed.keywords()["sk"].len(), 2);
        assert_eq!(parsed.keywords()["en"], vec!["budget"]);
        assert_eq!(parsed.themes().len(), 2);
        assert_eq!(parsed.eurovoc_themes(), vec!["http://eurovoc.europa.eu/100141"]);
        assert_eq!(parsed.types(), ds.types());
        assert_eq!(parsed.accrual_periodicity(), ds.accrual_periodicity());
        assert_eq!(parsed.spatial(), ds.spatial());
        let temporal = parsed.temporal().unwrap();
        assert_eq!(temporal.start(), date(2020, 1, 1));
        assert_eq!(temporal.end(), date(2020, 12, 31));
        assert_eq!(parsed.temporal_resolution().as_deref(), Some("P1D"));
        assert_eq!(parsed.spatial_resolution_in_meters(), Some(12.5));
        assert_eq!(
            parsed.contact_point().unwrap().email().as_deref(),
            Some("budget@data.example")
        );
        assert_eq!(parsed.documentation(), ds.documentation());
        assert_eq!(parsed.relations(), ds.relations());
        assert_eq!(parsed.landing_page(), ds.landing_page());
        assert_eq!(parsed.specification(), ds.specification());
        assert_eq!(parsed.publisher(), ds.publisher());
        assert_eq!(parsed.distributions(), ds.distributions());
        assert_eq!(parsed.is_part_of(), ds.is_part_of());
        assert!(parsed.is_hvd());
        assert!(!parsed.is_serie());
        assert_eq!(parsed.issued(), ds.issued());
        assert_eq!(parsed.modified(), ds.modified());
    }

    #[test]
    fn test_single_literal_change_changes_text() {
        let ds = sample();
        let before = ds.to_text().unwrap();
        assert_eq!(before, ds.to_text().unwrap());

        ds.set_titles([("sk", "Rozpočet 2"), ("en", "Budget")]);
        assert_ne!(before, ds.to_text().unwrap());
    }

    #[test]
    fn test_dataset_metadata_tags() {
        let ds = sample();
        let record = ds.derive_metadata(None, &DeriveContext::default());
        assert_eq!(record.file_type(), FileType::Dataset);
        assert_eq!(record.tag_value(TAG_URI), Some("https://data.example/ds/1"));
        assert_eq!(
            record.tag(TAG_THEMES),
            ["http://publications.europa.eu/resource/authority/data-theme/ECON"]
        );
        assert_eq!(record.tag(TAG_EUROVOC_THEMES), ["http://eurovoc.europa.eu/100141"]);
        assert_eq!(record.tag(TAG_KEYWORDS), ["budget", "mesto", "rozpočet"]);
        assert_eq!(record.name()["en"], "Budget");
    }

    #[test]
    fn test_remove_temporal() {
        let ds = sample();
        ds.remove_temporal();
        assert!(ds.temporal().is_none());
        let parsed = Dataset::parse(&ds.to_text().unwrap()).unwrap().unwrap();
        assert!(parsed.temporal().is_none());
    }
}
