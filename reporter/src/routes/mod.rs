mod invocation;

pub use invocation::{health, invoke};
