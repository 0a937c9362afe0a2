//! The `exctree` command line: argument parsing and the discover, build,
//! render pipeline behind it.

pub mod parser;
pub mod runner;
