//! Integration test suite for meshflow.
//!
//! These tests drive the standard experiment graph end to end with a
//! recording step runner, so no solver, training or plotting tools are
//! needed.
//!
//! # Test Categories
//!
//! - `pipeline_e2e`: Target ordering and work-item fan-out
//! - `failures`: Fail-fast behaviour and configuration errors
//! - `profiling`: Repetition of the profiling closure
//! - `timing_log`: Append-only timing log across runs

mod fixtures;

mod failures;
mod profiling;
mod timing_log;
