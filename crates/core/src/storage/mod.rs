mod error;
mod http_mapping;
mod traits;
mod types;

pub use error::{RepositoryError, Result, StoreError, StoreResult};
pub use http_mapping::repository_error_to_status_code;
pub use traits::{MicropostRepository, TableClient, UserRepository};
pub use types::{
    AttributeValue, Condition, Item, Key, TransactOutcome, WriteOp, COUNTER_ATTR, VERSION_ATTR,
};
