// src/lib.rs

pub mod bsp;
pub mod document;
pub mod error;
pub mod map;
pub mod utils;
