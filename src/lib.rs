//! Flags out-of-range manufacturing test measurements.
//!
//! A test-result table (product, test session, measurement name, response)
//! is loaded once, bound criteria are suggested from quartiles and edited by
//! the user, and every row of the selected products is labelled `NORMAL` or
//! `ABNORMAL`. Results roll up into summary counts, per-session and
//! per-measurement breakdowns, and can be exported as a highlighted workbook.

pub mod analysis;
pub mod constants;
pub mod data;
pub mod errors;
pub mod export;
pub mod state;
