//! Decision Genie - AI-assisted everyday decision wizard
//!
//! This crate walks a user from a dilemma through clarifying questions to a
//! grounded recommendation, and keeps a local history of saved decisions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
