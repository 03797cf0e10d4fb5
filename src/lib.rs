#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod comparator;
pub mod configuration;
pub mod controller;
pub mod delta;
pub mod device;
pub mod parser;
pub mod renderer;
pub mod synthesizer;
pub mod verify;
