use super::group::Group;
use super::group_list::GroupList;
use crate::ids::{ItemId, SchemaGroupId};
use serde::{Deserialize, Serialize};

/// Top-level entry of a property: a singleton group or a list of groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Group(Group),
    List(GroupList),
}

impl Item {
    pub fn id(&self) -> &ItemId {
        match self {
            Self::Group(g) => &g.id,
            Self::List(l) => &l.id,
        }
    }

    pub fn schema_group(&self) -> &SchemaGroupId {
        match self {
            Self::Group(g) => &g.schema_group,
            Self::List(l) => &l.schema_group,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Self::Group(g) => Some(g),
            Self::List(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Self::Group(g) => Some(g),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&GroupList> {
        match self {
            Self::List(l) => Some(l),
            Self::Group(_) => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut GroupList> {
        match self {
            Self::List(l) => Some(l),
            Self::Group(_) => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// A group with no non-empty field, or a list with no entries.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Group(g) => g.is_empty(),
            Self::List(l) => l.is_empty(),
        }
    }

    pub fn prune(&mut self) -> bool {
        match self {
            Self::Group(g) => g.prune(),
            Self::List(l) => l.prune(),
        }
    }

    /// Every group held by the item.
    pub fn groups(&self) -> Vec<&Group> {
        match self {
            Self::Group(g) => vec![g],
            Self::List(l) => l.groups().iter().collect(),
        }
    }

    pub(crate) fn groups_mut(&mut self) -> Vec<&mut Group> {
        match self {
            Self::Group(g) => vec![g],
            Self::List(l) => l.groups_mut().iter_mut().collect(),
        }
    }
}
