// SPDX-License-Identifier: MIT

//! Workflow engine, settings and HTTP surface

pub mod config;
pub mod server;
pub mod workflow;
