use log::info;

pub mod conditions;
pub mod dispatch;
pub mod fib;
pub mod rules;
pub mod sweeper;

pub use conditions::*;
pub use dispatch::*;
pub use fib::*;
pub use rules::*;
pub use sweeper::*;

pub fn init() {
    info!("ndngate Engine initialized");
}
