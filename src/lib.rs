//! Two-stage tomato leaf diagnosis service.
//!
//! A gating classifier decides whether an upload is a usable tomato leaf
//! photo at all; only then does the disease classifier run and its label get
//! resolved to a treatment advisory. Everything outside
//! [`inference::pipeline`] is plumbing around that dispatch.

pub mod catalog;
pub mod config;
pub mod inference;
pub mod routes;
pub mod storage;
