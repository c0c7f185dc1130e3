pub mod fs_store;
pub mod rss_fetcher;

pub use fs_store::FsArtifactStore;
pub use rss_fetcher::RssReviewFetcher;
