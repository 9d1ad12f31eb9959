pub mod disk;
pub mod monitor;

pub use disk::*;
pub use monitor::*;
