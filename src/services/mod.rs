// Service exports
pub mod cache;
pub mod postgres;
pub mod supabase;

pub use cache::{CacheManager, CacheKey, CacheError};
pub use postgres::{PostgresClient, PostgresError, PoolOptions, EventStats};
pub use supabase::{SupabaseClient, SupabaseTables, SupabaseError};
