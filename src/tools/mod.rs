pub mod add_memories;
pub mod search_memories;

use add_memories::AddMemoriesParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use search_memories::SearchMemoriesParams;

use crate::memory::MemoryRepository;

/// The HiPAI MCP tool handler. Every call goes to the shared
/// [`MemoryRepository`], which opens its own store handle per call.
#[derive(Clone)]
pub struct HipaiTools {
    tool_router: ToolRouter<Self>,
    repository: MemoryRepository,
}

#[tool_router]
impl HipaiTools {
    pub fn new(repository: MemoryRepository) -> Self {
        Self {
            tool_router: Self::tool_router(),
            repository,
        }
    }

    /// Remember facts about the user.
    #[tool(description = "Add memories about the user. When you learn something about the user, store it here as short standalone facts.")]
    async fn add_memories(
        &self,
        Parameters(params): Parameters<AddMemoriesParams>,
    ) -> Result<String, String> {
        tracing::info!(count = params.memories.len(), "add_memories called");

        let repository = self.repository.clone();
        let stored = tokio::task::spawn_blocking(move || repository.add_memories(&params.memories))
            .await
            .map_err(|e| format!("add_memories task failed: {e}"))?
            .map_err(|e| e.to_string())?;

        Ok(serde_json::json!({ "stored": stored }).to_string())
    }

    /// Recall facts relevant to the conversation.
    #[tool(description = "Search for memories about the user. Returns the stored memories most relevant to the request, one per line.")]
    async fn search_memories(
        &self,
        Parameters(params): Parameters<SearchMemoriesParams>,
    ) -> Result<String, String> {
        tracing::info!(
            query = %params.search_request,
            mode = %self.repository.mode(),
            "search_memories called"
        );

        let repository = self.repository.clone();
        tokio::task::spawn_blocking(move || repository.search_memories(&params.search_request, None))
            .await
            .map_err(|e| format!("search_memories task failed: {e}"))?
            .map_err(|e| e.to_string())
    }

    #[tool(description = "Get the current date and time as YYYY-MM-DD HH:MM:SS in local time.")]
    async fn get_current_date_and_time(&self) -> Result<String, String> {
        Ok(crate::clock::current_timestamp())
    }
}

#[tool_handler]
impl ServerHandler for HipaiTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "HiPAI memory server. Use add_memories to store facts you learn about the user, \
                 search_memories to recall them, and get_current_date_and_time for the clock."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
