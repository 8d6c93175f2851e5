//! Batch file adapters for the command-line tool.

pub mod csv;
