//! Shared utility modules used across Crease components.

pub mod varint;
