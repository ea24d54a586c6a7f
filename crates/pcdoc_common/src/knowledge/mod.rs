//! Knowledge Repository
//!
//! Static knowledge is loaded once at startup and never changes. User
//! contributions are appended to a separate partition that grows while the
//! process runs. Readers always see STATIC followed by USER.

pub mod schema;
pub mod source;
pub mod store;
pub mod validation;

pub use schema::*;
pub use source::*;
pub use store::*;
pub use validation::*;
