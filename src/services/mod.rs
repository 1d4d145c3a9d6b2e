pub mod filter;
pub mod ranking;

pub use filter::FilterPolicy;
pub use ranking::RankingService;
