pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpStore, OfflineStore, RemoteStore};
pub use error::StoreError;
pub use types::{ActionRecord, CounterValue, NewUser, OrderUpdate, SessionFields};
