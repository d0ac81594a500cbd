//! ANSI painting of the view stack.

mod core;

pub use self::core::{AnsiRenderer, RendererSettings};
