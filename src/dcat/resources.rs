//! Sub-resources owned by datasets and distributions

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::entity::RdfEntity;
use crate::vocab::{
    DCAT_END_DATE, DCAT_START_DATE, LEG_AUTHORS_WORK_TYPE, LEG_AUTHOR_NAME,
    LEG_DATABASE_PROTECTED_BY_SPECIAL_RIGHTS_TYPE, LEG_ORIGINAL_DATABASE_AUTHOR_NAME,
    LEG_ORIGINAL_DATABASE_TYPE, LEG_PERSONAL_DATA_CONTAINMENT_TYPE, VCARD_FN, VCARD_HAS_EMAIL,
};

/// Contact point (`vcard:Individual`)
#[derive(Debug, Clone)]
pub struct VCard(RdfEntity);

impl VCard {
    pub fn from_entity(entity: RdfEntity) -> Self {
        Self(entity)
    }

    pub fn entity(&self) -> &RdfEntity {
        &self.0
    }

    pub fn name(&self, language: &str) -> Option<String> {
        self.0.get_text(VCARD_FN, language)
    }

    pub fn names(&self) -> BTreeMap<String, Vec<String>> {
        self.0.get_texts(VCARD_FN)
    }

    pub fn set_names<I, L, V>(&self, names: I)
    where
        I: IntoIterator<Item = (L, V)>,
        L: AsRef<str>,
        V: AsRef<str>,
    {
        self.0.set_texts(VCARD_FN, names);
    }

    /// E-mail without the `mailto:` scheme
    pub fn email(&self) -> Option<String> {
        self.0
            .get_uri(VCARD_HAS_EMAIL)
            .map(|uri| uri.trim_start_matches("mailto:").to_string())
            .or_else(|| self.0.get_literal(VCARD_HAS_EMAIL))
    }

    /// Stored as a `mailto:` IRI; an address that does not form a valid
    /// IRI is rejected when the entity is serialized
    pub fn set_email(&self, email: Option<&str>) {
        let uri = email.map(|e| format!("mailto:{}", e.trim_start_matches("mailto:")));
        self.0.set_uri(VCARD_HAS_EMAIL, uri.as_deref());
    }
}

/// Temporal coverage (`dct:PeriodOfTime`)
#[derive(Debug, Clone)]
pub struct TemporalPeriod(RdfEntity);

impl TemporalPeriod {
    pub fn from_entity(entity: RdfEntity) -> Self {
        Self(entity)
    }

    pub fn entity(&self) -> &RdfEntity {
        &self.0
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.0.get_date(DCAT_START_DATE)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.0.get_date(DCAT_END_DATE)
    }

    pub fn set_start(&self, date: Option<NaiveDate>) {
        self.0.set_date(DCAT_START_DATE, date);
    }

    pub fn set_end(&self, date: Option<NaiveDate>) {
        self.0.set_date(DCAT_END_DATE, date);
    }
}

/// Terms of use of a distribution (`leg:TermsOfUse`)
///
/// The four type properties point at codelist concepts describing the
/// copyright position of the published data.
#[derive(Debug, Clone)]
pub struct LegalTerms(RdfEntity);

impl LegalTerms {
    pub fn from_entity(entity: RdfEntity) -> Self {
        Self(entity)
    }

    pub fn entity(&self) -> &RdfEntity {
        &self.0
    }

    pub fn authors_work_type(&self) -> Option<String> {
        self.0.get_uri(LEG_AUTHORS_WORK_TYPE)
    }

    pub fn set_authors_work_type(&self, uri: Option<&str>) {
        self.0.set_uri(LEG_AUTHORS_WORK_TYPE, uri);
    }

    pub fn original_database_type(&self) -> Option<String> {
        self.0.get_uri(LEG_ORIGINAL_DATABASE_TYPE)
    }

    pub fn set_original_database_type(&self, uri: Option<&str>) {
        self.0.set_uri(LEG_ORIGINAL_DATABASE_TYPE, uri);
    }

    pub fn database_protected_by_special_rights_type(&self) -> Option<String> {
        self.0.get_uri(LEG_DATABASE_PROTECTED_BY_SPECIAL_RIGHTS_TYPE)
    }

    pub fn set_database_protected_by_special_rights_type(&self, uri: Option<&str>) {
        self.0
            .set_uri(LEG_DATABASE_PROTECTED_BY_SPECIAL_RIGHTS_TYPE, uri);
    }

    pub fn personal_data_containment_type(&self) -> Option<String> {
        self.0.get_uri(LEG_PERSONAL_DATA_CONTAINMENT_TYPE)
    }

    pub fn set_personal_data_containment_type(&self, uri: Option<&str>) {
        self.0.set_uri(LEG_PERSONAL_DATA_CONTAINMENT_TYPE, uri);
    }

    pub fn author_name(&self) -> Option<String> {
        self.0.get_literal(LEG_AUTHOR_NAME)
    }

    pub fn set_author_name(&self, name: Option<&str>) {
        self.0.set_literal(LEG_AUTHOR_NAME, name);
    }

    pub fn original_database_author_name(&self) -> Option<String> {
        self.0.get_literal(LEG_ORIGINAL_DATABASE_AUTHOR_NAME)
    }

    pub fn set_original_database_author_name(&self, name: Option<&str>) {
        self.0.set_literal(LEG_ORIGINAL_DATABASE_AUTHOR_NAME, name);
    }
}
