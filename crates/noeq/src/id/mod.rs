mod noeq;
mod worker;

pub use noeq::*;
pub use worker::*;
