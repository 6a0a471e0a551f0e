//! TCP Listener
//!
//! Accepts client connections and runs the line protocol on each one in its
//! own task.

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::CommandParser;

/// First line sent to every client.
pub const GREETING: &str = "+OK MiniCache ready";

/// Runs the accept loop until `shutdown` resolves.
///
/// Connections already accepted keep running on their own tasks.
pub async fn serve<F>(listener: TcpListener, parser: Arc<CommandParser>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Accept loop stopped");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, addr)) => {
                        debug!(%addr, "Client connected");
                        let parser = Arc::clone(&parser);
                        tokio::spawn(async move {
                            match handle_connection(socket, parser).await {
                                Ok(()) => debug!(%addr, "Client disconnected"),
                                Err(e) => debug!(%addr, error = %e, "Client disconnected with error"),
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "Failed to accept connection"),
                }
            }
        }
    }
}

/// Serves one client until QUIT or end of stream.
async fn handle_connection(socket: TcpStream, parser: Arc<CommandParser>) -> io::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(format!("{GREETING}\r\n").as_bytes()).await?;

    while let Some(line) = lines.next_line().await? {
        let result = parser.handle(&line);
        writer
            .write_all(format!("{}\r\n", result.response).as_bytes())
            .await?;

        if result.should_close {
            break;
        }
    }

    writer.shutdown().await
}
