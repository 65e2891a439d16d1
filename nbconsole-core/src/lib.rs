//! nbconsole Core
//!
//! Core types and pure logic for the notebook pipeline console.
//!
//! This crate contains:
//! - Domain types: Pipeline, PipelineParameter, Task
//! - DTOs: request/response bodies exchanged with the execution API
//! - Validation: pipeline definition checks and parameter coercion
//! - Monitor: client-side filtering, sorting and pagination of tasks

pub mod domain;
pub mod dto;
pub mod monitor;
pub mod params;
pub mod validation;

mod timestamp;
