//! Dataset series (`dct:isPartOf`) acyclicity checks

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::metadata::{SERIE_VALUE, TAG_SERIE};
use crate::storage::DocumentStorage;

/// Answers whether a part-of edge may be added without creating a cycle
pub struct SeriesValidator<'a> {
    storage: &'a dyn DocumentStorage,
}

impl<'a> SeriesValidator<'a> {
    pub fn new(storage: &'a dyn DocumentStorage) -> Self {
        Self { storage }
    }

    /// Walk upward from `parent_id` through the series chain. Fails when the
    /// chain reaches `part_id` (the part is already an ancestor, or is the
    /// parent itself) or revisits an id.
    pub async fn can_be_added_to_serie(&self, parent_id: &str, part_id: &str) -> Result<bool> {
        let mut visited = HashSet::new();
        let mut current = Some(parent_id.to_string());

        while let Some(id) = current {
            if id == part_id {
                debug!(parent = %parent_id, part = %part_id, "Part is an ancestor of the parent");
                return Ok(false);
            }
            if !visited.insert(id.clone()) {
                debug!(parent = %parent_id, local_id = %id, "Existing series cycle");
                return Ok(false);
            }
            current = self.storage.get_parent_dataset(&id).await?;
        }
        Ok(true)
    }
}

/// Make `part_id` a part of `parent_id` after validating the edge.
///
/// Only the stored records change: the part's parent id and the parent's
/// `serie` tag.
pub async fn link_to_serie(storage: &dyn DocumentStorage, parent_id: &str, part_id: &str) -> Result<()> {
    if !SeriesValidator::new(storage)
        .can_be_added_to_serie(parent_id, part_id)
        .await?
    {
        return Err(CatalogError::SeriesCycle {
            parent: parent_id.to_string(),
            part: part_id.to_string(),
        });
    }

    let parent = storage
        .get(parent_id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(parent_id.to_string()))?;
    let part = storage
        .get(part_id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(part_id.to_string()))?;

    if !parent.metadata.is_serie() {
        let updated = parent.metadata.to_builder().tag(TAG_SERIE, [SERIE_VALUE]).build();
        storage
            .insert_or_update(&updated, parent.content.as_deref())
            .await?;
    }
    if part.metadata.parent_id() != Some(parent_id) {
        let updated = part
            .metadata
            .to_builder()
            .parent_id(Some(parent_id.to_string()))
            .build();
        storage
            .insert_or_update(&updated, part.content.as_deref())
            .await?;
    }

    info!(parent = %parent_id, part = %part_id, "Dataset linked to series");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FileType, MetadataRecord, RecordBuilder};
    use crate::storage::MemoryStorage;

    async fn dataset(storage: &MemoryStorage, parent: Option<&MetadataRecord>) -> MetadataRecord {
        let record = RecordBuilder::new(FileType::Dataset)
            .parent_id(parent.map(|p| p.id().to_string()))
            .build();
        storage.insert_or_update(&record, None).await.unwrap();
        record
    }

    #[tokio::test]
    async fn test_chain_without_part_is_valid() {
        let storage = MemoryStorage::new();
        let root = dataset(&storage, None).await;
        let child = dataset(&storage, Some(&root)).await;
        let other = dataset(&storage, None).await;

        let validator = SeriesValidator::new(&storage);
        assert!(validator.can_be_added_to_serie(child.id(), other.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_ancestor_cannot_become_part() {
        let storage = MemoryStorage::new();
        let root = dataset(&storage, None).await;
        let child = dataset(&storage, Some(&root)).await;
        let grandchild = dataset(&storage, Some(&child)).await;

        let validator = SeriesValidator::new(&storage);
        assert!(!validator.can_be_added_to_serie(grandchild.id(), root.id()).await.unwrap());
        assert!(!validator.can_be_added_to_serie(root.id(), root.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_cycle_blocks() {
        let storage = MemoryStorage::new();
        let a = RecordBuilder::new(FileType::Dataset).build();
        let b = RecordBuilder::new(FileType::Dataset)
            .parent_id(Some(a.id().to_string()))
            .build();
        let a = a.to_builder().parent_id(Some(b.id().to_string())).build();
        storage.insert_or_update(&a, None).await.unwrap();
        storage.insert_or_update(&b, None).await.unwrap();
        let outsider = dataset(&storage, None).await;

        let validator = SeriesValidator::new(&storage);
        assert!(!validator.can_be_added_to_serie(a.id(), outsider.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_link_to_serie() {
        let storage = MemoryStorage::new();
        let parent = dataset(&storage, None).await;
        let part = dataset(&storage, None).await;

        link_to_serie(&storage, parent.id(), part.id()).await.unwrap();
        let stored_parent = storage.get(parent.id()).await.unwrap().unwrap();
        let stored_part = storage.get(part.id()).await.unwrap().unwrap();
        assert!(stored_parent.metadata.is_serie());
        assert_eq!(stored_part.metadata.parent_id(), Some(parent.id()));

        let writes = storage.write_count();
        link_to_serie(&storage, parent.id(), part.id()).await.unwrap();
        assert_eq!(storage.write_count(), writes);

        let err = link_to_serie(&storage, part.id(), parent.id()).await.unwrap_err();
        assert!(matches!(err, CatalogError::SeriesCycle { .. }));
    }
}
