//! End-to-end tests over a synthetic Unicode width table.
//!
//! The fixture feeds hand-picked East Asian Width and general category
//! ranges through the classifier so every encoding sees the same realistic
//! mix of long runs, isolated values and the fixed overrides.

mod exactness;
mod fixtures;
mod metadata;
