//! Pure control policy: how a sample becomes a command, and whether it
//! should become one at all.

pub mod filter;
pub mod mapping;
