//! Recipe descriptors and the store that loads them from component trees

pub mod recipe;
pub mod store;
pub mod version_info;
