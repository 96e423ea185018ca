use crate::dataset::LinkChain;
use crate::ids::{DatasetFieldId, DatasetId, DatasetSchemaId};
use std::collections::HashMap;

/// Id mapping produced when a dataset schema is replaced by a newer import.
///
/// Hops on a mapped schema must have their field (and pinned record, if any)
/// mapped too, otherwise the whole link is dropped. Hops on other schemas are
/// left untouched.
#[derive(Debug, Clone, Default)]
pub struct DatasetMigration {
    schemas: HashMap<DatasetSchemaId, DatasetSchemaId>,
    fields: HashMap<DatasetFieldId, DatasetFieldId>,
    datasets: HashMap<DatasetId, DatasetId>,
}

/// What happened to one link chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMigration {
    Unchanged,
    Rewritten,
    Dropped,
}

impl DatasetMigration {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_schema(mut self, from: DatasetSchemaId, to: DatasetSchemaId) -> Self {
        self.schemas.insert(from, to);
        self
    }

    #[must_use]
    pub fn with_field(mut self, from: DatasetFieldId, to: DatasetFieldId) -> Self {
        self.fields.insert(from, to);
        self
    }

    #[must_use]
    pub fn with_dataset(mut self, from: DatasetId, to: DatasetId) -> Self {
        self.datasets.insert(from, to);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Rewrite the chain in place. A `Dropped` chain is left unmodified and
    /// must be detached by the caller.
    pub fn migrate(&self, chain: &mut LinkChain) -> ChainMigration {
        let mut rewritten = Vec::with_capacity(chain.len());
        let mut changed = false;
        for hop in chain.links() {
            let Some(schema) = self.schemas.get(&hop.dataset_schema) else {
                rewritten.push(hop.clone());
                continue;
            };
            let Some(field) = self.fields.get(&hop.field) else {
                return ChainMigration::Dropped;
            };
            let dataset = match &hop.dataset {
                Some(old) => match self.datasets.get(old) {
                    Some(new) => Some(new.clone()),
                    None => return ChainMigration::Dropped,
                },
                None => None,
            };
            let mut hop = hop.clone();
            hop.dataset_schema = schema.clone();
            hop.field = field.clone();
            hop.dataset = dataset;
            rewritten.push(hop);
            changed = true;
        }
        if !changed {
            return ChainMigration::Unchanged;
        }
        *chain.links_mut() = rewritten;
        ChainMigration::Rewritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Link;

    #[test]
    fn test_rewrites_mapped_hops() {
        let (old_schema, new_schema) = (DatasetSchemaId::new(), DatasetSchemaId::new());
        let (old_field, new_field) = (DatasetFieldId::new(), DatasetFieldId::new());
        let (old_row, new_row) = (DatasetId::new(), DatasetId::new());
        let migration = DatasetMigration::new()
            .with_schema(old_schema.clone(), new_schema.clone())
            .with_field(old_field.clone(), new_field.clone())
            .with_dataset(old_row.clone(), new_row.clone());

        let mut chain = LinkChain::single(Link::new(old_schema, Some(old_row), old_field));
        assert_eq!(migration.migrate(&mut chain), ChainMigration::Rewritten);
        assert_eq!(chain.first(), &Link::new(new_schema, Some(new_row), new_field));
    }

    #[test]
    fn test_unmapped_field_drops_chain() {
        let schema = DatasetSchemaId::new();
        let migration = DatasetMigration::new().with_schema(schema.clone(), DatasetSchemaId::new());
        let mut chain = LinkChain::single(Link::unqualified(schema, DatasetFieldId::new()));
        assert_eq!(migration.migrate(&mut chain), ChainMigration::Dropped);
    }

    #[test]
    fn test_other_schemas_untouched() {
        let migration = DatasetMigration::new().with_schema(DatasetSchemaId::new(), DatasetSchemaId::new());
        let mut chain = LinkChain::single(Link::unqualified(DatasetSchemaId::new(), DatasetFieldId::new()));
        let before = chain.clone();
        assert_eq!(migration.migrate(&mut chain), ChainMigration::Unchanged);
        assert_eq!(chain, before);
    }
}
