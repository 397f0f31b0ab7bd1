pub mod document;
pub mod memory;
pub mod supabase;

pub use document::{DocumentStore, MemoryDocumentStore, RedisDocumentStore};
pub use memory::MemoryTable;
pub use supabase::SupabaseClient;
