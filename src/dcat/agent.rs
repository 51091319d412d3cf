use std::collections::BTreeMap;

use crate::dcat::{first_texts, DcatEntity};
use crate::entity::RdfEntity;
use crate::metadata::FileType;
use crate::vocab::{
    DCT_TYPE, FOAF_AGENT, FOAF_HOMEPAGE, FOAF_MBOX, FOAF_NAME, FOAF_PHONE, SCHEMA_EMAIL,
    SCHEMA_PHONE,
};

/// Publisher (`foaf:Agent`)
#[derive(Debug, Clone)]
pub struct Agent(RdfEntity);

impl DcatEntity for Agent {
    const RDF_TYPE: &'static str = FOAF_AGENT;
    const FILE_TYPE: FileType = FileType::Publisher;

    fn from_entity(entity: RdfEntity) -> Self {
        Self(entity)
    }

    fn entity(&self) -> &RdfEntity {
        &self.0
    }

    fn display_name(&self) -> BTreeMap<String, String> {
        first_texts(&self.0, FOAF_NAME)
    }
}

impl Agent {
    pub fn name(&self, language: &str) -> Option<String> {
        self.0.get_text(FOAF_NAME, language)
    }

    pub fn names(&self) -> BTreeMap<String, Vec<String>> {
        self.0.get_texts(FOAF_NAME)
    }

    pub fn set_names<I, L, V>(&self, names: I)
    where
        I: IntoIterator<Item = (L, V)>,
        L: AsRef<str>,
        V: AsRef<str>,
    {
        self.0.set_texts(FOAF_NAME, names);
    }

    pub fn homepage(&self) -> Option<String> {
        self.0.get_uri(FOAF_HOMEPAGE)
    }

    pub fn set_homepage(&self, uri: Option<&str>) {
        self.0.set_uri(FOAF_HOMEPAGE, uri);
    }

    /// E-mail from `foaf:mbox` or `schema:email`
    pub fn email(&self) -> Option<String> {
        self.0
            .get_uri(FOAF_MBOX)
            .map(|uri| uri.trim_start_matches("mailto:").to_string())
            .or_else(|| self.0.get_literal(SCHEMA_EMAIL))
    }

    pub fn set_email(&self, email: Option<&str>) {
        self.0.set_uri(FOAF_MBOX, None);
        self.0.set_literal(SCHEMA_EMAIL, email);
    }

    pub fn phone(&self) -> Option<String> {
        self.0
            .get_literal(SCHEMA_PHONE)
            .or_else(|| self.0.get_literal(FOAF_PHONE))
    }

    pub fn set_phone(&self, phone: Option<&str>) {
        self.0.set_literal(FOAF_PHONE, None);
        self.0.set_literal(SCHEMA_PHONE, phone);
    }

    /// Publisher type concept
    pub fn agent_type(&self) -> Option<String> {
        self.0.get_uri(DCT_TYPE)
    }

    pub fn set_agent_type(&self, uri: Option<&str>) {
        self.0.set_uri(DCT_TYPE, uri);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_round_trip() {
        let agent = Agent::create("https://data.gov.sk/id/legal-subject/42").unwrap();
        agent.set_names([("sk", "Ministerstvo"), ("en", "Ministry")]);
        agent.set_homepage(Some("https://ministry.example"));
        agent.set_email(Some("info@ministry.example"));
        agent.set_phone(Some("+421 2 1234"));
        agent.set_agent_type(Some("http://purl.org/adms/publishertype/NationalAuthority"));

        let parsed = Agent::parse(&agent.to_text().unwrap()).unwrap().unwrap();
        assert_eq!(parsed.names(), agent.names());
        assert_eq!(parsed.homepage(), agent.homepage());
        assert_eq!(parsed.email().as_deref(), Some("info@ministry.example"));
        assert_eq!(parsed.phone().as_deref(), Some("+421 2 1234"));
        assert_eq!(parsed.agent_type(), agent.agent_type());
        assert_eq!(parsed.display_name()["en"], "Ministry");
    }

    #[test]
    fn test_mbox_email_is_unwrapped() {
        let agent = Agent::create("https://example.org/agent").unwrap();
        agent.entity().set_uri(FOAF_MBOX, Some("mailto:a@example.org"));
        assert_eq!(agent.email().as_deref(), Some("a@example.org"));
    }
}
