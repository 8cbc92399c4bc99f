pub mod batcher;
pub mod rows;
pub mod store;

pub use batcher::{SinkBatcher, DEFAULT_BATCH_SIZE};
pub use rows::{generate_session_id, QuoteRow, SessionRecord, SessionStatus, StatRow, TickRow};
pub use store::{LoggingStore, MemoryStore, SinkError, SinkStore};
