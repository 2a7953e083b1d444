/*!
bctoolbox containers as Rust values.
*/

mod list;

pub use self::list::{Iter, StringList};

pub(crate) use self::list::take_borrowed_strings;
