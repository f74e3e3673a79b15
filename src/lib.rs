//! Multi-transport MCP toolbox: expose named, schema-described tools over
//! JSON-RPC 2.0, and address one or many tool-hosting endpoints through a
//! uniform transport interface.
//!
//! Server side: [`rpc::RpcHandler`] dispatches `initialize`, `tools/list`
//! (paginated), `tools/call`, `exit`, and the reserved list methods;
//! [`server::StdioServer`] runs it over newline-delimited stdio, and
//! [`server::handle_http_body`] adapts it to any HTTP framework.
//!
//! Client side: [`client::McpClient`] aggregates tool catalogs from an
//! ordered list of [`transport::Transport`]s (HTTP or child-process stdio),
//! resolves name collisions first-wins, and routes each call to the
//! transport that registered the tool.

pub mod client;
pub mod config;
pub mod gateway;
pub mod protocol;
pub mod rpc;
pub mod schema;
pub mod server;
pub mod tool;
pub mod tools;
pub mod transport;
