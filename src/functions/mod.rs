// Algebra engine internals, organized by concern
pub mod calculus;
pub mod domain;
pub mod interval;
pub mod polynomial;
pub mod range;
pub mod rewrite;
