//! Scripted chat client - Entry Point
//!
//! Speaks the participant protocol on stdin/stdout, replaying a chat
//! script one turn at a time.

use std::path::Path;

use tracing::debug;

use chat_hub::config::load_lines;
use chat_hub::script::{ChatScript, BASE_NAME, USAGE};
use chat_hub::{logging, run_participant, Channel, ParticipantExit};

#[tokio::main]
async fn main() {
    logging::init();

    let exit = run().await;
    if let Some(message) = exit.message() {
        eprintln!("{}", message);
    }
    // Exit right away: the blocking stdin reader would otherwise hold the
    // runtime open until the server closes the pipe
    std::process::exit(exit.code());
}

async fn run() -> ParticipantExit {
    let args: Vec<String> = std::env::args().collect();
    let [_, path] = args.as_slice() else {
        eprintln!("{}", USAGE);
        return ParticipantExit::Usage;
    };

    let lines = match load_lines(Path::new(path)).await {
        Ok(lines) => lines,
        Err(e) => {
            debug!("{}", e);
            eprintln!("{}", USAGE);
            return ParticipantExit::Usage;
        }
    };

    let mut script = ChatScript::new(lines);
    let mut channel = Channel::from_streams(tokio::io::stdin(), tokio::io::stdout(), "server");
    run_participant(&mut script, BASE_NAME, &mut channel, tokio::io::stderr()).await
}
