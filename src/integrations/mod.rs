pub mod realtyfeed;

pub use realtyfeed::RealtyFeedClient;
