pub mod analysis;
pub mod baseline;
pub mod compare;
pub mod ledger;

pub use analysis::*;
pub use baseline::*;
pub use compare::*;
pub use ledger::*;
