pub mod table;
pub mod errors;
pub mod text;

pub use table::Table;
pub use errors::redact_secret;
