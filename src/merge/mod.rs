//! Merge engine: combines an original property with its parent into a
//! read-only view, resolving dataset links on the way.

pub mod merged;
pub mod merger;

pub use merged::{FieldSource, MergedField, MergedGroup, MergedItem, MergedList, MergedProperty};
pub use merger::{merge, Merger};
