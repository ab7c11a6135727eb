//! Model combiner.
//!
//! [`Compiler`] drives one compilation: variables are declared and encoded
//! into pieces, objective terms and penalty blocks are lowered onto those
//! pieces, and every contribution is summed into a single
//! [`QuadraticModel`](crate::model::QuadraticModel). The frozen result,
//! [`Compiled`], keeps the encodings and blocks so solver answers can be
//! decoded and checked.

mod compiler;
mod config;

pub use compiler::{Calibration, Compiled, CompiledBlock, Compiler};
pub use config::CompileConfig;
