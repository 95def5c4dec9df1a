pub mod clock;
pub mod entry;
pub mod response_cache;
pub mod sharded;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, CacheStats};
pub use response_cache::ResponseCache;
