//! Fixed reference tables.
//!
//! Values here are looked up and passed through to the derivation; nothing
//! in this module is computed from first principles.

pub mod fold_lock;
