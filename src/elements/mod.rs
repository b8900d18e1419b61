// src/elements/mod.rs

//! Built-in element types.

mod constant;
mod countdown;
mod print;
mod sum;

pub use constant::Constant;
pub use countdown::Countdown;
pub use print::Print;
pub use sum::Sum;

use crate::element::ElementProvider;

/// A provider that knows every built-in type.
pub fn builtin_provider() -> ElementProvider {
    ElementProvider::new()
        .with(Constant::TYPE_NAME, || Constant)
        .with(Sum::TYPE_NAME, || Sum)
        .with(Countdown::TYPE_NAME, || Countdown)
        .with(Print::TYPE_NAME, || Print)
}
