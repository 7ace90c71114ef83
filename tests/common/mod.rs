pub mod nodes;

#[allow(unused_imports)]
pub use nodes::*;

use relaygraph::reducers::MergePolicy;
use relaygraph::state::StateSchema;

/// Transcript-plus-counter schema used by most integration tests.
pub fn chain_schema() -> StateSchema {
    StateSchema::builder()
        .accumulating("transcript")
        .scalar("calls", MergePolicy::Sum)
        .expect("sum is valid for scalars")
        .build()
}
