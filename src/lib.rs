#![doc = include_str!("../README.md")]

#[cfg(test)]
mod subgraph_test;

pub mod commands;
pub mod component;
pub mod components;
pub mod error;
pub mod host;
pub mod io;
pub mod network;
pub mod packet;
pub mod subgraph;
pub mod transport;

pub use commands::*;
pub use component::*;
pub use components::*;
pub use error::*;
pub use host::*;
pub use io::*;
pub use network::*;
pub use packet::*;
pub use subgraph::*;
pub use transport::*;
