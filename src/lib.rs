//! Sluice compiles typed CRUD descriptions into parameterized SQL, runs them through a
//! middleware pipeline and maps the returned rows back into records.
//!
//! ```ignore
//! use sluice::{Database, MySql, Record, Selector, col};
//!
//! #[derive(Default, Record)]
//! struct TestModel {
//!     id: i64,
//!     name: String,
//!     age: i32,
//! }
//!
//! let db = Database::builder(session).dialect(MySql::new()).build();
//! let adults: Vec<TestModel> = Selector::new(&db)
//!     .where_(col("age").ge(18))
//!     .get_multi()
//!     .await?;
//! ```
pub use sluice_core::*;
pub use sluice_macros::*;
