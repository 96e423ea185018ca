use super::group::Group;
use crate::ids::{ItemId, SchemaGroupId};
use serde::{Deserialize, Serialize};

/// Ordered, repeatable groups of one list schema group.
///
/// Position carries meaning for merging; `Group::id` is the stable identity
/// used for addressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupList {
    pub id: ItemId,
    pub schema_group: SchemaGroupId,
    #[serde(default)]
    groups: Vec<Group>,
}

/// Map a requested position onto `0..=len`; negative or past-the-end means append.
fn clamp_insert(index: Option<i64>, len: usize) -> usize {
    match index {
        Some(i) if i >= 0 && (i as usize) < len => i as usize,
        _ => len,
    }
}

impl GroupList {
    #[must_use]
    pub fn new(schema_group: SchemaGroupId) -> Self {
        Self {
            id: ItemId::new(),
            schema_group,
            groups: Vec::new(),
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub(crate) fn groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, id: &ItemId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.id == id)
    }

    pub fn group_mut(&mut self, id: &ItemId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| &g.id == id)
    }

    pub fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.groups.iter().position(|g| &g.id == id)
    }

    /// Insert a group at `index`, appending when the index is absent,
    /// negative or out of range. Returns the final position.
    pub fn add(&mut self, group: Group, index: Option<i64>) -> usize {
        let at = clamp_insert(index, self.groups.len());
        self.groups.insert(at, group);
        at
    }

    /// Move a group to `index`, clamping to the last position.
    /// Returns the new position, or `None` if the group is not in the list.
    pub fn move_group(&mut self, id: &ItemId, index: i64) -> Option<usize> {
        let from = self.index_of(id)?;
        let group = self.groups.remove(from);
        let to = clamp_insert(Some(index), self.groups.len());
        self.groups.insert(to, group);
        Some(to)
    }

    /// Remove a group. Removing an absent group is a no-op returning false.
    pub fn remove(&mut self, id: &ItemId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.groups.remove(index);
                true
            }
            None => false,
        }
    }

    /// Prune the fields of every entry. Entries themselves are kept since
    /// they are addressable by id.
    pub fn prune(&mut self) -> bool {
        let mut changed = false;
        for group in &mut self.groups {
            changed |= group.prune();
        }
        changed
    }
}
