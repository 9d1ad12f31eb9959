pub mod compare;
pub mod scanner;

pub use compare::{diff, Comparison};
pub use scanner::DriveScanner;
