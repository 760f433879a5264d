pub mod common;
pub mod error;
pub mod fetchers;
pub mod helpers;
pub mod report;
pub mod resolvers;

pub use error::{FetchError, ResolverError};
pub use report::{NoopReporter, ProgressReporter};
pub use resolvers::{resolve, Resolution, ResolveRequest, Resolver, AVAILABLE_RESOLVERS};
