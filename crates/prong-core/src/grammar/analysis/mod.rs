mod first_sets;
mod merge;

pub use first_sets::{FirstSet, FirstSetResolver, FirstSets, Label};
pub use merge::{merge, merge_all};
