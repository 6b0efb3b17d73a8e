// SPDX-License-Identifier: MIT

//! Collaborator kit: model clients, completion, embedding and retrieval
//! contracts, and the shared error hierarchy.

pub mod completion;
pub mod embedding;
pub mod error;
pub mod model;
pub mod retrieval;
