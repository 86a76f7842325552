pub mod fee_limits;
pub mod health;

pub use fee_limits::*;
pub use health::*;
