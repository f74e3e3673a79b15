use std::sync::Arc;

use mcp_toolbus::config::ServerConfig;
use mcp_toolbus::rpc::RpcHandler;
use mcp_toolbus::server::StdioServer;
use mcp_toolbus::tool::Tool;
use mcp_toolbus::tools::{ClockTool, EchoTool};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = ServerConfig::from_env();

    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        // Stdout carries protocol data; logs go to stderr.
        .with_writer(std::io::stderr)
        .init();

    let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(ClockTool), Arc::new(EchoTool)];
    let server = StdioServer::new(RpcHandler::new(tools));
    if let Err(e) = server.run().await {
        eprintln!("mcp-toolbus: fatal error: {e}");
        std::process::exit(1);
    }
}
