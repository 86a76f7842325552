pub mod fee_limits;
pub mod redis_store;
pub mod store;

pub use fee_limits::FeeLimitsService;
pub use redis_store::RedisFeeStore;
pub use store::{FeeStore, InMemoryFeeStore, StoreError, UnwiredFeeStore};
