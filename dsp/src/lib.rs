#![cfg_attr(not(test), no_std)]

mod tools;
pub use tools::*;
pub mod iir;

#[cfg(test)]
pub mod testing;
