pub mod json_store;
pub mod null_store;
pub mod persistence_trait;
