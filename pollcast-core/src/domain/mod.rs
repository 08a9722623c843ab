pub mod poll;
pub mod tally;
pub mod vote;

pub use poll::*;
pub use tally::*;
pub use vote::*;
