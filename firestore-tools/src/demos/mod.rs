//! Terminal demo commands
//!
//! Small self-contained procedures showing off colors, paging, progress
//! bars, keystroke input and a `cat`-like copier.

pub mod color;
pub mod copy;
pub mod menu;
pub mod pager;
pub mod progress;
pub mod screen;
