//! # Phonebook Core
//!
//! Core types and traits for the phonebook service.
//!
//! This crate provides the foundational types used by the HTTP layer:
//!
//! - [`Contact`] - The phonebook record (`id`, `name`, `number`)
//! - [`ContactId`] - Store-assigned 12-byte identifier rendered as 24 hex digits
//! - [`ContactFields`] - Candidate fields for create and update
//! - [`ContactSchema`] - Store-enforced validation rules
//! - [`StoreError`] - Cast / validation / backend failures
//! - [`ContactRepository`] - Async repository contract with in-memory and
//!   JSON-file implementations

#![doc(html_root_url = "https://docs.rs/phonebook-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod contact;
mod error;
pub mod file;
mod id;
pub mod repository;
pub mod schema;

pub use contact::{Contact, ContactFields};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use file::FileRepository;
pub use id::ContactId;
pub use repository::{ContactRepository, MemoryRepository};
pub use schema::{ContactSchema, FieldViolation};
