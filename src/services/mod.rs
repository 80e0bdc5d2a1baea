// Pure domain logic, kept free of I/O so it can be unit tested exhaustively.
pub mod estimator;
pub mod filter_normalizer;
