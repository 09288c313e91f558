pub mod alpha_vantage;
pub mod etherscan;
pub mod rentcast;

pub use alpha_vantage::QuoteFetcher;
pub use etherscan::WalletFetcher;
pub use rentcast::{PropertyParams, ValuationFetcher, ValuationResponse};
