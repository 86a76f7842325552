pub mod account;

pub use account::{account_from_headers, resolve_account, ACCOUNT_HEADER};
