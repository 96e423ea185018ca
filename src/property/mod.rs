//! Property store: the locator-addressed tree of groups, lists and fields
//! that holds one entity's configuration.

pub mod field;
pub mod group;
pub mod group_list;
pub mod item;
pub mod locator;
pub mod migration;
#[allow(clippy::module_inception)]
pub mod property;

pub use field::Field;
pub use group::Group;
pub use group_list::GroupList;
pub use item::Item;
pub use locator::{Locator, LocatorTuple};
pub use migration::{ChainMigration, DatasetMigration};
pub use property::{FieldLocation, ListPosition, Property};
