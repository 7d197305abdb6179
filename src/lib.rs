//! MariaDB/MySQL metrics and inventory sampler for host monitoring agents.
//!
//! One invocation connects to the server, extracts status counters and
//! variables, turns counters into deltas and rates against the previous
//! sample, and prints a single JSON document for the agent to forward.

pub mod cache;
pub mod cli;
pub mod collectors;
pub mod connection;
pub mod error;
pub mod integration;
pub mod metrics;
