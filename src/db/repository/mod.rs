pub mod processing;
pub mod source;
pub mod wine;

pub use processing::*;
pub use source::*;
pub use wine::*;
