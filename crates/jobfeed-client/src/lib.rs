pub mod fetcher;
pub mod sources;

pub use fetcher::ReqwestFetcher;
pub use sources::{Source, SourceKind, refresh_sources, registry};
