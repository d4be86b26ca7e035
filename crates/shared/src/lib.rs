mod command;
mod date;

pub use command::*;
pub use date::*;

/// Generates a new opaque identifier for documents and local items.
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}
