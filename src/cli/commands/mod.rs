pub mod completions;
pub mod elements;
pub mod login;
pub mod logs;
pub mod restart;
pub mod start;
pub mod status;
pub mod stop;
pub mod units;
pub mod version;
