//! Semantic memory for a personal-assistant chatbot, served over MCP.
//!
//! HiPAI remembers short facts about the user in a vector collection and
//! recalls the most relevant ones on request. An agent reaches it through
//! three [MCP](https://modelcontextprotocol.io/) tools:
//!
//! | Tool | Input | Output |
//! |------|-------|--------|
//! | `add_memories` | `memories: [string]` | `{"stored": n}` |
//! | `search_memories` | `search_request: string` | matching memories, one per line |
//! | `get_current_date_and_time` | none | `YYYY-MM-DD HH:MM:SS` |
//!
//! Search runs in one of two modes. **Plain** returns every hit in rank
//! order. **Chunked** is for reference articles split into
//! `"<doc-id>:<chunk>"` records: only the best-ranked chunk of each document
//! is shown, under a `Relevant research articles:` header.
//!
//! # Modules
//!
//! - [`config`]: TOML + environment configuration
//! - [`embedding`]: text-to-vector providers (ONNX MiniLM, token hashing)
//! - [`store`]: named vector collections on SQLite + sqlite-vec
//! - [`memory`]: the repository behind the tools: ids, chunking, result shaping
//! - [`clock`]: local timestamp helper
//! - [`tools`]: the rmcp tool handler
//! - [`server`]: stdio and Streamable HTTP startup

pub mod clock;
pub mod config;
pub mod embedding;
pub mod memory;
pub mod server;
pub mod store;
pub mod tools;
