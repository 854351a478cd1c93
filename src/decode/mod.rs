//! Response decoder module
//!
//! Extracts records from JSON response bodies using a JSONPath expression.
//! Simple paths (`$`, `$[*]`, `$.orders`, `$.data.items[*]`) are resolved
//! directly; anything else goes through `jsonpath-rust`.

mod decoders;

pub use decoders::{extract_records, JsonDecoder, RecordDecoder, DEFAULT_RECORDS_PATH};
