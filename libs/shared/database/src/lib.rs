pub mod store;

pub use store::{DocStoreClient, StoreError};
