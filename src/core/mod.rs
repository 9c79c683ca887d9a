//! Core library components.
//!
//! This module contains the reusable logic for resolving KVDN secrets into
//! pillar data: the mapping document model, the resolver, and the stores,
//! matchers and templates it is wired to.

pub mod config;
pub mod constants;
pub mod location;
pub mod matcher;
pub mod pillar;
pub mod resolver;
pub mod store;
pub mod template;
pub mod types;
