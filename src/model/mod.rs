pub mod change;
pub mod common;
pub mod document;
pub mod report;
pub mod spec;

pub use change::*;
pub use common::*;
pub use document::*;
pub use report::*;
pub use spec::*;
