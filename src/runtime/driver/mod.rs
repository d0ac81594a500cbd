//! Terminal drivers wrapping [`PaneRuntime`](super::PaneRuntime).

pub mod cli;
