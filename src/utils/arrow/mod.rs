//! Arrow data handling utilities
//!
//! Checked column access and column derivation helpers shared by the
//! transformation and feature stages.

pub mod array_utils;

pub use array_utils::{
    downcast_array, float64_column, get_column, int32_column, int64_column, select_columns,
    string_column, with_column,
};
