//! Data Transfer Objects for the execution API
//!
//! Request and response bodies as they travel over HTTP. Domain types that
//! already match the wire format (Pipeline, Task) are sent as-is.

pub mod pipeline;
pub mod task;
