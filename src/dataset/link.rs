use crate::error::{PropertyError, PropertyResult};
use crate::ids::{DatasetFieldId, DatasetId, DatasetSchemaId};
use serde::{Deserialize, Serialize};

/// One hop of a link chain: a column of a dataset schema, optionally pinned
/// to a specific record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub dataset_schema: DatasetSchemaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<DatasetId>,
    pub field: DatasetFieldId,
}

impl Link {
    #[must_use]
    pub fn new(
        dataset_schema: DatasetSchemaId,
        dataset: Option<DatasetId>,
        field: DatasetFieldId,
    ) -> Self {
        Self {
            dataset_schema,
            dataset,
            field,
        }
    }

    /// A hop that is resolved against whichever record the caller supplies.
    #[must_use]
    pub fn unqualified(dataset_schema: DatasetSchemaId, field: DatasetFieldId) -> Self {
        Self::new(dataset_schema, None, field)
    }
}

/// Ordered reference path from a property field into dataset records.
///
/// Every hop but the last names a reference column whose target schema is the
/// schema of the next hop. A chain always has at least one hop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Link>", into = "Vec<Link>")]
pub struct LinkChain {
    links: Vec<Link>,
}

impl LinkChain {
    pub fn new(links: Vec<Link>) -> PropertyResult<Self> {
        if links.is_empty() {
            return Err(PropertyError::invalid_link_chain("a link chain needs at least one hop"));
        }
        Ok(Self { links })
    }

    /// Chain of a single hop.
    #[must_use]
    pub fn single(link: Link) -> Self {
        Self { links: vec![link] }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn first(&self) -> &Link {
        &self.links[0]
    }

    pub fn last(&self) -> &Link {
        &self.links[self.links.len() - 1]
    }

    /// True when the first hop names its starting record.
    pub fn is_qualified(&self) -> bool {
        self.first().dataset.is_some()
    }

    pub fn references_schema(&self, id: &DatasetSchemaId) -> bool {
        self.links.iter().any(|l| &l.dataset_schema == id)
    }

    pub fn references_dataset(&self, id: &DatasetId) -> bool {
        self.links.iter().any(|l| l.dataset.as_ref() == Some(id))
    }

    pub fn dataset_ids(&self) -> impl Iterator<Item = &DatasetId> {
        self.links.iter().filter_map(|l| l.dataset.as_ref())
    }

    pub(crate) fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }
}

impl TryFrom<Vec<Link>> for LinkChain {
    type Error = PropertyError;

    fn try_from(links: Vec<Link>) -> Result<Self, Self::Error> {
        Self::new(links)
    }
}

impl From<LinkChain> for Vec<Link> {
    fn from(chain: LinkChain) -> Self {
        chain.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_rejected() {
        assert!(matches!(
            LinkChain::new(vec![]),
            Err(PropertyError::InvalidLinkChain { .. })
        ));
        assert!(serde_json::from_str::<LinkChain>("[]").is_err());
    }

    #[test]
    fn test_chain_accessors() {
        let schema = DatasetSchemaId::new();
        let dataset = DatasetId::new();
        let chain = LinkChain::new(vec![
            Link::new(schema.clone(), Some(dataset.clone()), DatasetFieldId::new()),
            Link::unqualified(DatasetSchemaId::new(), DatasetFieldId::new()),
        ])
        .unwrap();

        assert!(chain.is_qualified());
        assert!(chain.references_schema(&schema));
        assert!(chain.references_dataset(&dataset));
        assert_eq!(chain.dataset_ids().count(), 1);
        assert_eq!(chain.len(), 2);
    }
}
