//! Scripted server end of a session.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::time::timeout;

/// The server side of one in-memory connection.
pub struct TestServer {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
}

impl TestServer {
    pub fn new(stream: DuplexStream) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    /// Send one line; CRLF is appended when missing.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with('\n') {
            self.writer.write_all(b"\r\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Send raw bytes as they are.
    #[allow(dead_code)]
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one line from the client, without its terminator.
    /// `None` once the client closed its side.
    pub async fn recv(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        let read = timeout(Duration::from_secs(5), self.reader.read_line(&mut line)).await??;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Receive one line and check it.
    pub async fn expect(&mut self, expected: &str) -> anyhow::Result<()> {
        match self.recv().await? {
            Some(line) if line == expected => Ok(()),
            Some(line) => anyhow::bail!("expected {:?}, got {:?}", expected, line),
            None => anyhow::bail!("expected {:?}, got end of stream", expected),
        }
    }

    /// Consume the registration burst and welcome `nick`.
    #[allow(dead_code)]
    pub async fn register(&mut self, nick: &str) -> anyhow::Result<()> {
        self.expect(&format!("NICK {}", nick)).await?;
        self.expect(&format!("USER {} 8 * {}", nick, nick)).await?;
        self.send(&format!(":irc.test 001 {} :Welcome to the test network", nick))
            .await
    }

    /// Close the server side.
    #[allow(dead_code)]
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
