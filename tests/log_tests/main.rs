//! Test harness for the log layer
//!
//! Split by component, mirroring src/log/.

mod reader_tests;
