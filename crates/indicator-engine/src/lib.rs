pub mod indicators;

#[cfg(test)]
mod indicator_tests;

pub use indicators::*;
