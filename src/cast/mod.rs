//! Spell casting: scratch registers, handler dispatch and the batch executor.

pub mod dispatcher;
pub mod executor;
pub mod registers;
pub mod spells;

pub use dispatcher::{Dispatcher, Handler, SpellContext, SpellFn};
pub use executor::{CastContext, Executor};
pub use registers::Registers;
