//! Integration tests for the generator loop, driven through mock sinks.

mod generator;
