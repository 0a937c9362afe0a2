extern crate serde;
extern crate serde_json;

extern crate clap;
extern crate itertools;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;
extern crate walkdir;

pub mod cmd;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod hierarchy;
pub mod logging;
pub mod tree_sitter_support;
