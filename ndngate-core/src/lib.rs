use log::info;

pub mod attrs;
pub mod clock;
pub mod control;
pub mod name;
pub mod status;

pub use attrs::*;
pub use clock::*;
pub use control::*;
pub use name::*;
pub use status::*;

pub fn init() {
    info!("ndngate Core initialized");
}
