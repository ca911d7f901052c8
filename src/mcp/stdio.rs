use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};

use super::McpServer;

/// Serves newline-delimited JSON-RPC frames until the reader hits EOF.
pub async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    info!("[MCP] {} listening on stdio", server.name());

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("[MCP] EOF reached, shutting down");
                break;
            }
            Err(err) => {
                error!("[MCP] error reading from stdin: {}", err);
                return Err(err);
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(response) = server.handle_message(trimmed).await {
            let mut frame = response.to_string();
            frame.push('\n');
            writer.write_all(frame.as_bytes()).await?;
            writer.flush().await?;
        }
    }
    Ok(())
}

pub async fn serve_stdio(server: &McpServer) -> std::io::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    serve(server, stdin, tokio::io::stdout()).await
}
