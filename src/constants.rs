/// Application constants

// Renovation allowance margin: ARV adds the allowance plus this share of it
// as presumed value uplift.
pub const ARV_PROFIT_MARGIN: f64 = 0.30;

// Upstream feed timeouts
pub const FEED_CONNECT_TIMEOUT_SECS: u64 = 4;
pub const FEED_FETCH_TIMEOUT_SECS: u64 = 15;

// Coordinate literals are reformatted to at most this many decimal places
pub const COORDINATE_MAX_DECIMALS: usize = 6;

// Signing links
pub const SIGNING_TOKEN_BYTES: usize = 32;
pub const DEFAULT_SIGNING_TOKEN_TTL_DAYS: i64 = 7;

// API version
pub const API_VERSION: &str = "v1";
