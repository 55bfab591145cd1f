//! Sink writers: Office Open XML packages written in one atomic commit.
//!
//! Both formats are zip containers of XML parts. [`package`] owns the shared
//! container and XML plumbing; [`xlsx`] and [`docx`] only describe parts.

pub mod docx;
pub mod package;
pub mod xlsx;
