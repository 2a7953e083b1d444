/*!
mediastreamer2 filters.

A `FilterDescription` is a value describing a kind of filter. A `Factory`
holds the catalog of descriptions and creates `Filter`s from them.
*/

mod description;
mod factory;
mod filter;
mod kind;

pub use self::description::{FilterDescription, FilterInit};
pub use self::factory::Factory;
pub use self::filter::{Filter, Notification};
pub use self::kind::{Category, Interface};
