//! A snake game drawn on a terminal character grid.
//!
//! `snake` holds the rules, `input` turns key presses into commands,
//! `term` is the drawing surface and `game` ties them together in the loop.

pub mod game;
pub mod input;
pub mod snake;
pub mod term;
