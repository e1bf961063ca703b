//! Sales pipeline engine.
//!
//! Tasks move through the stages of a fixed registry. The module is split
//! the usual way: `domain` holds pure types, `ports` the gateway and
//! notifier contracts, `adapters` their implementations, `services` the
//! write paths, and `board` the interactive column view.

pub mod adapters;
pub mod board;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
