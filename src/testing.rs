//! In-memory participants for engine tests
//!
//! A scripted peer answers `WHO:` and `YT:` from canned replies over a
//! `tokio::io::duplex` pipe and records every line the server sent it.

use std::collections::VecDeque;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;

use crate::channel::Channel;

/// Reply that makes the peer close its pipe instead of answering
pub const HANG_UP: &str = "<hang up>";

/// Spawn a peer task and return the server-side channel to it
///
/// `names` answers successive `WHO:` prompts. `turns` answers successive
/// `YT:` prompts; once exhausted the peer replies `QUIT:`. The peer stops
/// after `KICK:`, after sending `QUIT:` or `HANG_UP`, or at end-of-file,
/// and the handle yields every line it received.
pub fn scripted_peer(names: &[&str], turns: &[&[&str]]) -> (Channel, JoinHandle<Vec<String>>) {
    let mut names: VecDeque<String> = names.iter().map(|s| s.to_string()).collect();
    let mut turns: VecDeque<Vec<String>> = turns
        .iter()
        .map(|t| t.iter().map(|s| s.to_string()).collect())
        .collect();

    let (ours, theirs) = tokio::io::duplex(4096);
    let (server_read, server_write) = tokio::io::split(ours);
    let channel = Channel::from_streams(server_read, server_write, "scripted peer");

    let handle = tokio::spawn(async move {
        let (read, mut write) = tokio::io::split(theirs);
        let mut lines = BufReader::new(read).lines();
        let mut received = Vec::new();

        'session: while let Ok(Some(line)) = lines.next_line().await {
            received.push(line.clone());
            let replies = match line.as_str() {
                "WHO:" => vec![names.pop_front().unwrap_or_else(|| HANG_UP.to_string())],
                "YT:" => turns.pop_front().unwrap_or_else(|| vec!["QUIT:".to_string()]),
                "KICK:" => break,
                _ => Vec::new(),
            };
            for reply in replies {
                if reply == HANG_UP {
                    break 'session;
                }
                if write.write_all(format!("{}\n", reply).as_bytes()).await.is_err() {
                    break 'session;
                }
                if reply == "QUIT:" {
                    break 'session;
                }
            }
        }
        received
    });

    (channel, handle)
}
