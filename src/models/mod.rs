pub mod account;
pub mod fees;
pub mod response;

pub use account::*;
pub use fees::*;
pub use response::*;
