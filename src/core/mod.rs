pub mod error;
pub mod naming;
pub mod value;

pub use error::{BoxError, DbError, Result};
pub use naming::to_db_name;
pub use value::Value;
