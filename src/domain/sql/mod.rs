//! SQL safety rules shared by the generator, the executor and admin paths

mod guard;

pub use guard::{
    detect_dangerous_intent, extract_sql, sanitize_generated_sql, validate_read_only, SqlRejection,
};
