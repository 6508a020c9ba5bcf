//! Query resolution: results, execution contract and pipeline outcomes

mod executor;
mod outcome;
mod prompt;
mod value;

pub use executor::{ExecutionError, QueryExecutor};
pub use outcome::{
    QueryError, QueryOutcome, SqlSource, NO_MATCH_SUGGESTION, OFF_TOPIC_SUGGESTIONS,
};
pub use prompt::normalize_prompt;
pub use value::{Interval, QueryResult, SqlValue};

#[cfg(test)]
pub use executor::MockQueryExecutor;
