//! Core math modules.

pub mod polyfit;
pub mod roots;
pub mod stable;
