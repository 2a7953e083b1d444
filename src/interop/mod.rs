/*!
The ownership layer between native handles and Rust values.
*/

pub mod macros;
pub mod cow;
pub mod handle;
pub mod is_null;
pub mod status;
pub mod string;
pub mod thread_bound;
pub mod user_data;
