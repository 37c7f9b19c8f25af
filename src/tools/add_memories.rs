//! `add_memories` tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddMemoriesParams {
    /// Facts to remember, one statement each.
    #[schemars(description = "A list of memories to add for the user, one fact per entry.")]
    pub memories: Vec<String>,
}
