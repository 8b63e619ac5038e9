pub mod descriptor;
pub mod enrichment;

pub use descriptor::*;
pub use enrichment::*;
