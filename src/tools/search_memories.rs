//! `search_memories` tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchMemoriesParams {
    #[schemars(
        description = "Information about the user that's relevant to the conversation."
    )]
    pub search_request: String,
}
