//! Record side effects to a text file, and replay them later.
//!
//! # Overview
//!
//! A [`recorder::Recorder`] sits in front of whatever does the real work. In
//! record mode it runs the work and appends `(command, output)` to a sink; in
//! replay mode it reads the next operation from an earlier recording, checks
//! the command matches and hands back the stored output; when disabled it
//! simply runs the work.
//!
//! The layers, leaves first:
//! 1. [`scanner`] – line reader with `name:line` positions
//! 2. [`operation`] – the `(command, output)` pair and its printed form
//! 3. [`grammar`] – state machine parsing operations back out
//! 4. [`recorder`] – the facade

pub mod grammar;
pub mod operation;
pub mod recorder;
pub mod scanner;

pub use grammar::{parse_recording, OperationParser, ParseState};
pub use operation::Operation;
pub use recorder::Recorder;
pub use scanner::LineScanner;
