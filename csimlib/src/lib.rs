//! # CsimLib
//!
//! CsimLib is a library for trace driven simulation of a set associative data cache
//!
//! Given a geometry (`s` set index bits, `E` lines per set, `b` block offset bits) and a trace of
//! loads, stores and modifies, it reproduces the hits, misses and evictions a real cache with a
//! least recently used replacement policy would see
//!
//! The simulator only counts. It models no data, write policy or timing, and instruction fetches
//! in the trace are skipped

/// Contains the line store, and the lookups used to decide hits, free lines and LRU victims
pub mod cache;

/// Contains the cache geometry, which can be parsed from JSON, and the address decomposition
pub mod config;

/// Contains the trace file reader
pub mod io;

/// Contains the simulator used to replay a trace against a cache
pub mod simulator;

/// Contains the trace record types and the trace line parser
pub mod trace;

#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
