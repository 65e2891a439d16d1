//! Core domain types
//!
//! This module contains the entities the console works with. Pipelines are
//! mirrored from the execution API into the local catalog; tasks are
//! read-only snapshots of server-side executions.

pub mod parameter;
pub mod pipeline;
pub mod task;
