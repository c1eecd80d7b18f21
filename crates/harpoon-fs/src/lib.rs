//! Filesystem primitives for the harpoon host engine
//!
//! Every durable write goes through [`io::write_atomic`], which replaces the
//! whole file in one rename and restricts it to the owning user.

pub mod error;
pub mod io;

pub use error::{Error, Result};
pub use io::{OWNER_ONLY_MODE, read_bytes, read_optional, write_atomic};
