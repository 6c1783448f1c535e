mod basic;
mod lock;
mod mutex;
#[cfg(test)]
mod tests;

pub use basic::*;
pub use lock::*;
pub use mutex::*;
