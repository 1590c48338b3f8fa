//! Schema registry for the input sources and text-to-type coercion.

pub mod coerce;
pub mod registry;

pub use coerce::{coerce_batch, coerce_column};
pub use registry::{
    ATTENDANCE, CAMPS, ColumnDef, ColumnType, PROFILES, SOCIAL_INDICATORS, SourceSchema,
    col,
};
