//! Config repository implementations.
//!
//! - [`JsonFileConfigRepository`]: a JSON file, written atomically
//! - [`InMemoryConfigRepository`]: process-local, for tests and embedding

mod json_file;
mod memory;

pub use json_file::JsonFileConfigRepository;
pub use memory::InMemoryConfigRepository;
