//! Resume Studio: edits a structured resume, renders it into a visual tree and
//! exports that tree as a paginated A4 PDF.

pub mod config;
pub mod dom;
pub mod errors;
pub mod export;
pub mod layout;
pub mod models;
pub mod state;
