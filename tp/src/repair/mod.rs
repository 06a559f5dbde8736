//! Structured-response repair
//!
//! Turns untrusted model text into validated values. The scanner and the
//! syntax fixes are pure functions over `&str`; [`StructuredGenerator`] adds
//! the backend round trips (initial request plus continuations).

mod error;
pub mod fixes;
mod pipeline;
mod schema;
pub mod scan;

pub use error::{EXCERPT_CHARS, GenerationError, Location, ParseFailure, SchemaError};
pub use pipeline::{CONTINUATION_TAIL_CHARS, FirstPass, PendingRepair, StructuredGenerator, first_pass, repair_reply};
pub use schema::Schema;
