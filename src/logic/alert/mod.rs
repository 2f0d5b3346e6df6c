//! Alert Module - flattened alert records and tables
//!
//! Ingestion adapters (HTTP body, file) build an `AlertTable`;
//! every later stage reads fields through the typed accessors on `AlertRecord`.

pub mod record;
pub mod table;


pub use record::{AlertRecord, FieldValue};
pub use table::AlertTable;
