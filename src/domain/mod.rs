mod lend;
mod ledger;
mod money;
mod shop;
mod transaction;
mod user;

pub use lend::*;
pub use ledger::*;
pub use money::*;
pub use shop::*;
pub use transaction::*;
pub use user::*;
