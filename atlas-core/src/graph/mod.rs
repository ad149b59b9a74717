//! Graph store seam: typed operations, sessions, backends, jobs, and the
//! cleanup builder.

pub mod cleanup;
pub mod job;
pub mod memory;
pub mod op;
pub mod session;
pub mod statement;
