/*!
liblinphone: addresses, configurations, cores and calls.
*/

mod address;
mod call;
mod config;
mod core;
mod factory;
mod state;

pub use self::address::Address;
pub use self::call::Call;
pub use self::config::Config;
pub use self::core::{Core, CoreBuilder};
pub use self::factory::Factory;
pub use self::state::{CallState, Direction, GlobalState, RegistrationState, Transport};
