mod accessor;
mod as_value;
mod builder;
mod cancel;
mod database;
mod dialect;
mod error;
mod expression;
mod middleware;
mod model;
mod query;
mod registry;
mod session;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context as ErrorContext;
pub use accessor::*;
pub use as_value::*;
pub use builder::*;
pub use cancel::*;
pub use database::*;
pub use dialect::*;
pub use error::*;
pub use expression::*;
pub use middleware::*;
pub use model::*;
pub use query::*;
pub use registry::*;
pub use session::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
