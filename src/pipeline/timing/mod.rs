pub mod locator;
pub mod planner;

pub use locator::*;
pub use planner::*;
