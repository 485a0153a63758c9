//! Core pipeline orchestration and domain logic for the wishlist compiler.
//!
//! This crate ties together listing, ordering, aggregation, and writing into
//! the end-to-end [`pipeline::compile_wishlist`] workflow.

pub mod aggregate;
pub mod lister;
pub mod order;
pub mod pipeline;
pub mod writer;
