pub mod types;

pub use types::{SelectionReloadPolicy, SelectionSet};
