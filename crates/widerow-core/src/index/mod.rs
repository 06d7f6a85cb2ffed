pub mod wal;

pub use wal::{IndexOp, IndexWal, WalEntry};
