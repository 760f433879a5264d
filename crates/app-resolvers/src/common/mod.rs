pub mod request;

pub use request::{Client, USER_AGENT};
