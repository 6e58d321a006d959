//! Transaction resolution pipeline.
//!
//! Given a set of hashes, the [`TxResolver`] resolves each one concurrently:
//! the cache is consulted first, the upstream node on a miss, and freshly
//! finalized records are written back through the [`CacheWriter`]. A batch
//! either resolves completely or fails as a whole.

mod error;
mod normalize;
mod request;
mod resolver;
mod writer;

pub use error::ResolveError;
pub use normalize::normalize;
pub use request::ResolutionRequest;
pub use resolver::TxResolver;
pub use writer::CacheWriter;
