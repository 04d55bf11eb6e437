//! Line-oriented binding layer.
//!
//! Turns text commands into `bump`/`reset` calls and prefetch intents, so a
//! terminal or a script can stand in for UI events.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::dispatch::RegionStore;
use crate::prefetch::{Anchor, Prefetcher};
use crate::sync::CounterSync;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Driver I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Bump,
    Reset,
    /// Pointer or focus on a link with the given `data-prefetch` value.
    Hover { href: String, data_prefetch: String },
    Show,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, UnknownCommand> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match (word.to_ascii_lowercase().as_str(), rest) {
            ("bump" | "+", "") => Command::Bump,
            ("reset" | "0", "") => Command::Reset,
            ("show", "") => Command::Show,
            ("quit" | "q", "") => Command::Quit,
            ("hover", args) => {
                let mut args = args.split_whitespace();
                match (args.next(), args.next(), args.next()) {
                    (Some(href), data_prefetch, None) => Command::Hover {
                        href: href.to_string(),
                        data_prefetch: data_prefetch.unwrap_or("1").to_string(),
                    },
                    _ => return Err(UnknownCommand(line.to_string())),
                }
            }
            _ => return Err(UnknownCommand(line.to_string())),
        };
        Ok(Some(command))
    }
}

pub struct DriverContext<'a> {
    pub sync: &'a CounterSync,
    pub prefetcher: Option<&'a Prefetcher>,
    pub regions: &'a RegionStore,
    pub target: &'a str,
}

impl DriverContext<'_> {
    fn status_line(&self) -> String {
        let server = self.regions.get(self.target);
        format!(
            "count={} pending={} server={}",
            self.sync.count(),
            self.sync.is_pending(),
            server.as_deref().unwrap_or("-")
        )
    }
}

/// Run commands from `input` until end of input or `quit`.
pub async fn run_driver<R, W>(
    input: R,
    mut output: W,
    ctx: &DriverContext<'_>,
) -> Result<(), DriverError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                output.write_all(format!("{}\n", err).as_bytes()).await?;
                continue;
            }
        };

        match command {
            Command::Bump => ctx.sync.bump(),
            Command::Reset => ctx.sync.reset(),
            Command::Show => {
                output
                    .write_all(format!("{}\n", ctx.status_line()).as_bytes())
                    .await?;
            }
            Command::Hover {
                href,
                data_prefetch,
            } => {
                let anchor =
                    Anchor::from_attrs(Some(href.as_str()), Some(data_prefetch.as_str()));
                let message = match ctx.prefetcher {
                    Some(prefetcher) if prefetcher.on_intent(&anchor) => None,
                    Some(_) => Some(format!("skipped {}\n", href)),
                    None => Some("prefetch disabled\n".to_string()),
                };
                if let Some(message) = message {
                    output.write_all(message.as_bytes()).await?;
                }
            }
            Command::Quit => break,
        }
        output.flush().await?;
    }

    output.flush().await?;
    Ok(())
}
