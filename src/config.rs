//! Settings: schema, loading from file and environment, validation.
//!
//! Every field has a default, so a missing or partial config file is
//! never an error.

mod load;
mod schema;

pub use load::{default_config_path, resolve_config_path};
pub use schema::*;
