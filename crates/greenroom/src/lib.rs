//! Greenroom: the interview booth application.
//!
//! The binary in `main.rs` handles sign-in, sign-out, and status; the booth
//! loop in [`booth_loop`] runs the recording session itself.

pub mod booth_loop;
