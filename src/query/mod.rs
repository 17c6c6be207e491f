//! Name-derived query model: clause readers, factor model, registries,
//! and the descriptor builder.

pub mod builder;
pub mod factor;
pub mod keywords;
pub mod projection;
pub mod reader;
