pub mod memory;
pub mod ndjson;

pub use memory::MemorySink;
pub use ndjson::NdjsonSink;
