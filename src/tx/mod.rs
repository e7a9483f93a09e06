//! Transaction construction and sequenced submission

mod factory;
pub mod payload;
mod sender;

pub use factory::{TransactionBuilder, TransactionFactory};
pub use sender::TransactionSender;
