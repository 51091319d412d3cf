//! Storage-side metadata records
//!
//! Every stored entity has one [`MetadataRecord`]: local identity,
//! provenance and a free-form tag map. Records are immutable values;
//! changes go through [`RecordBuilder`], which has no setter for the
//! identity fields (`id`, `file_type`, `created`), so a refresh can never
//! rewrite them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::mint_local_id;

/// Marks records whose lifecycle belongs to the harvester
pub const TAG_HARVESTED: &str = "Harvested";
/// URI of the local catalog a harvested dataset was found in
pub const TAG_LOCAL_CATALOG: &str = "localCatalog";
/// Set to "1" on datasets confirmed to have at least one part
pub const TAG_SERIE: &str = "serie";
/// Canonical URI of the stored entity
pub const TAG_URI: &str = "uri";
pub const TAG_THEMES: &str = "themes";
pub const TAG_EUROVOC_THEMES: &str = "eurovocThemes";
pub const TAG_KEYWORDS: &str = "keywords";
pub const TAG_FORMATS: &str = "formats";
pub const TAG_DISTRIBUTION_COUNT: &str = "distributionCount";
pub const TAG_ENDPOINT: &str = "endpoint";

pub const TRUE_VALUE: &str = "true";
pub const SERIE_VALUE: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileType {
    LocalCatalog,
    Dataset,
    Distribution,
    Publisher,
    Codelist,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    id: String,
    name: BTreeMap<String, String>,
    file_type: FileType,
    parent_id: Option<String>,
    publisher: Option<String>,
    is_public: bool,
    original_file_name: Option<String>,
    created: DateTime<Utc>,
    last_modified: DateTime<Utc>,
    #[serde(default)]
    tags: BTreeMap<String, Vec<String>>,
}

impl MetadataRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name keyed by language
    pub fn name(&self) -> &BTreeMap<String, String> {
        &self.name
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn original_file_name(&self) -> Option<&str> {
        self.original_file_name.as_deref()
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn tags(&self) -> &BTreeMap<String, Vec<String>> {
        &self.tags
    }

    pub fn tag(&self, key: &str) -> &[String] {
        self.tags.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tag(key).first().map(String::as_str)
    }

    pub fn is_harvested(&self) -> bool {
        self.tag_value(TAG_HARVESTED) == Some(TRUE_VALUE)
    }

    pub fn uri(&self) -> Option<&str> {
        self.tag_value(TAG_URI)
    }

    pub fn is_serie(&self) -> bool {
        self.tag_value(TAG_SERIE) == Some(SERIE_VALUE)
    }

    /// Start a modified copy of this record
    pub fn to_builder(&self) -> RecordBuilder {
        RecordBuilder {
            record: self.clone(),
            fresh: false,
        }
    }
}

/// Builds new records and modified copies of existing ones
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: MetadataRecord,
    /// Never stored yet; `build` keeps `last_modified == created`
    fresh: bool,
}

impl RecordBuilder {
    /// A record with a freshly minted local id
    pub fn new(file_type: FileType) -> Self {
        let now = Utc::now();
        Self {
            record: MetadataRecord {
                id: mint_local_id(),
                name: BTreeMap::new(),
                file_type,
                parent_id: None,
                publisher: None,
                is_public: false,
                original_file_name: None,
                created: now,
                last_modified: now,
                tags: BTreeMap::new(),
            },
            fresh: true,
        }
    }

    pub fn name(mut self, name: BTreeMap<String, String>) -> Self {
        self.record.name = name;
        self
    }

    pub fn parent_id(mut self, parent_id: Option<String>) -> Self {
        self.record.parent_id = parent_id;
        self
    }

    pub fn publisher(mut self, publisher: Option<String>) -> Self {
        self.record.publisher = publisher;
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.record.is_public = is_public;
        self
    }

    pub fn original_file_name(mut self, name: Option<String>) -> Self {
        self.record.original_file_name = name;
        self
    }

    /// Replace the values of one tag; an empty list removes the tag
    pub fn tag<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.record.tags.remove(key);
        } else {
            self.record.tags.insert(key.to_string(), values);
        }
        self
    }

    /// Replace each listed tag; tags not listed are left alone
    pub fn tags(mut self, tags: BTreeMap<String, Vec<String>>) -> Self {
        for (key, values) in tags {
            self = self.tag(&key, values);
        }
        self
    }

    /// Finish, stamping `last_modified` with the current time. A new
    /// record is stamped with its creation time instead.
    pub fn build(self) -> MetadataRecord {
        let now = if self.fresh {
            self.record.created
        } else {
            Utc::now()
        };
        self.build_at(now)
    }

    pub fn build_at(mut self, now: DateTime<Utc>) -> MetadataRecord {
        self.record.last_modified = now;
        self.record
    }
}

/// Caller-supplied context for deriving a record from an entity
#[derive(Debug, Clone, Default)]
pub struct DeriveContext {
    pub publisher: Option<String>,
    pub is_public: bool,
    /// Parent record; on refresh `None` keeps the existing parent
    pub parent_id: Option<String>,
    pub original_file_name: Option<String>,
    /// Extra tags to set (e.g. `Harvested`, `localCatalog`)
    pub tags: BTreeMap<String, Vec<String>>,
}

impl DeriveContext {
    pub fn with_tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.tags.insert(key.to_string(), vec![value.into()]);
        self
    }
}

/// Create or refresh a record from content-derived values.
///
/// Without `existing` a new record is allocated. With `existing` only the
/// content-derived fields are refreshed: name, publisher, visibility,
/// parent (when the context names one), the given tags and
/// `last_modified`.
pub fn derive_record(
    file_type: FileType,
    name: BTreeMap<String, String>,
    content_tags: BTreeMap<String, Vec<String>>,
    existing: Option<&MetadataRecord>,
    ctx: &DeriveContext,
) -> MetadataRecord {
    let builder = match existing {
        None => RecordBuilder::new(file_type)
            .parent_id(ctx.parent_id.clone())
            .original_file_name(ctx.original_file_name.clone()),
        Some(existing) => match &ctx.parent_id {
            Some(parent) => existing.to_builder().parent_id(Some(parent.clone())),
            None => existing.to_builder(),
        },
    };
    builder
        .name(name)
        .publisher(ctx.publisher.clone())
        .public(ctx.is_public)
        .tags(content_tags)
        .tags(ctx.tags.clone())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("sk".to_string(), value.to_string())])
    }

    #[test]
    fn test_new_record_from_context() {
        let ctx = DeriveContext {
            publisher: Some("pub-1".into()),
            is_public: true,
            parent_id: Some("parent".into()),
            ..Default::default()
        }
        .with_tag(TAG_HARVESTED, TRUE_VALUE);

        let record = derive_record(
            FileType::Distribution,
            names("CSV"),
            BTreeMap::from([(TAG_URI.to_string(), vec!["https://x".to_string()])]),
            None,
            &ctx,
        );
        assert_eq!(record.file_type(), FileType::Distribution);
        assert_eq!(record.parent_id(), Some("parent"));
        assert_eq!(record.publisher(), Some("pub-1"));
        assert!(record.is_public());
        assert!(record.is_harvested());
        assert_eq!(record.uri(), Some("https://x"));
        assert_eq!(record.created(), record.last_modified());
    }

    #[test]
    fn test_refresh_keeps_identity_and_unrelated_tags() {
        let original = RecordBuilder::new(FileType::Dataset)
            .name(names("Starý"))
            .parent_id(Some("serie-parent".into()))
            .tag("custom", ["kept"])
            .tag(TAG_KEYWORDS, ["old"])
            .build();

        let ctx = DeriveContext {
            publisher: Some("pub-2".into()),
            ..Default::default()
        };
        let refreshed = derive_record(
            FileType::Dataset,
            names("Nový"),
            BTreeMap::from([(TAG_KEYWORDS.to_string(), vec![])]),
            Some(&original),
            &ctx,
        );

        assert_eq!(refreshed.id(), original.id());
        assert_eq!(refreshed.created(), original.created());
        assert_eq!(refreshed.parent_id(), Some("serie-parent"));
        assert_eq!(refreshed.tag_value("custom"), Some("kept"));
        assert!(refreshed.tag(TAG_KEYWORDS).is_empty());
        assert_eq!(refreshed.name()["sk"], "Nový");
        assert_eq!(refreshed.publisher(), Some("pub-2"));
        assert!(refreshed.last_modified() >= original.last_modified());
    }

    #[test]
    fn test_modified_copy_is_restamped() {
        let record = RecordBuilder::new(FileType::Dataset).build();
        assert_eq!(record.created(), record.last_modified());

        let later = record.created() + chrono::Duration::seconds(5);
        let copy = record.to_builder().tag(TAG_SERIE, [SERIE_VALUE]).build_at(later);
        assert_eq!(copy.created(), record.created());
        assert_eq!(copy.last_modified(), later);
        assert!(record.to_builder().build().last_modified() >= record.created());
    }

    #[test]
    fn test_record_json_shape() {
        let record = RecordBuilder::new(FileType::Publisher)
            .tag(TAG_URI, ["https://agent"])
            .build();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fileType"], "Publisher");
        assert_eq!(json["tags"]["uri"][0], "https://agent");
        let back: MetadataRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
