//! Integration tests for the pnpm2npm binary.

pub(crate) mod common;

mod convert;
mod rush;
