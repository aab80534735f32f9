//! E2E tests for the `chat_server` binary.
//!
//! Each test writes a config file plus participant scripts into a temp
//! dir, runs the real server with real `chat_client` / `chat_bot`
//! children, and checks the announcements on stdout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use assert_cmd::Command;
use predicates::str::contains;

const TIMEOUT: Duration = Duration::from_secs(20);

const CLIENT: &str = env!("CARGO_BIN_EXE_chat_client");
const BOT: &str = env!("CARGO_BIN_EXE_chat_bot");

fn server_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chat_server"));
    cmd.timeout(TIMEOUT);
    cmd.env_remove("RUST_LOG");
    cmd.env("CHAT_HUB_SHUTDOWN_GRACE_MS", "200");
    cmd
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write test file");
    path
}

fn config_line(program: &str, argument: &Path) -> String {
    format!("{}:{}\n", program, argument.display())
}

// ─── Invocation ────────────────────────────────────────────────────

#[test]
fn missing_argument_prints_usage() {
    server_cmd()
        .assert()
        .code(1)
        .stderr(contains("Usage: chat_server configfile"));
}

#[test]
fn extra_argument_prints_usage() {
    server_cmd()
        .args(["a.conf", "b.conf"])
        .assert()
        .code(1)
        .stderr(contains("Usage: chat_server configfile"));
}

#[test]
fn unreadable_config_prints_usage() {
    server_cmd()
        .arg("/nonexistent/chat.conf")
        .assert()
        .code(1)
        .stderr(contains("Usage: chat_server configfile"));
}

#[test]
fn unstartable_participant_is_fatal() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let config = write_file(tmp.path(), "chat.conf", "/nonexistent/participant:arg\n");

    server_cmd().arg(&config).assert().code(1).stdout("");
}

#[test]
fn empty_config_exits_cleanly() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let config = write_file(tmp.path(), "chat.conf", "# nobody here\n");

    server_cmd().arg(&config).assert().success().stdout("");
}

// ─── Sessions ──────────────────────────────────────────────────────

#[test]
fn duplicate_names_and_chat() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let first = write_file(tmp.path(), "first.script", "CHAT:hello\nDONE:\nQUIT:\n");
    let second = write_file(tmp.path(), "second.script", "DONE:\nQUIT:\n");

    let mut conf = String::from("# two scripted clients\n");
    conf.push_str(&config_line(CLIENT, &first));
    conf.push_str("not a participant line\n");
    conf.push_str(&config_line(CLIENT, &second));
    let config = write_file(tmp.path(), "chat.conf", &conf);

    server_cmd().arg(&config).assert().success().stdout(
        "(client has entered the chat)\n\
         (client0 has entered the chat)\n\
         (client) hello\n\
         (client has left the chat)\n\
         (client0 has left the chat)\n",
    );
}

#[test]
fn bot_answers_and_gets_kicked() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let script = write_file(
        tmp.path(),
        "client.script",
        "CHAT:hello bot\nDONE:\nKICK:clientbot\nQUIT:\n",
    );
    let responses = write_file(
        tmp.path(),
        "bot.responses",
        "# stimulus:response\nHELLO:Hi human\nbye:Goodbye\n",
    );

    let mut conf = config_line(CLIENT, &script);
    conf.push_str(&config_line(BOT, &responses));
    let config = write_file(tmp.path(), "chat.conf", &conf);

    server_cmd().arg(&config).assert().success().stdout(
        "(client has entered the chat)\n\
         (clientbot has entered the chat)\n\
         (client) hello bot\n\
         (clientbot) Hi human\n\
         (client has left the chat)\n\
         (clientbot has left the chat)\n",
    );
}

#[cfg(unix)]
#[test]
fn malformed_reply_removes_only_that_participant() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    // Names itself, answers its first turn with a bare word, then idles
    let rogue = write_file(
        tmp.path(),
        "rogue.sh",
        "read line\necho NAME:rogue\nread line\necho FOO\nwhile read line; do :; done\n",
    );
    let script = write_file(tmp.path(), "client.script", "DONE:\nQUIT:\n");

    let mut conf = config_line("/bin/sh", &rogue);
    conf.push_str(&config_line(CLIENT, &script));
    let config = write_file(tmp.path(), "chat.conf", &conf);

    server_cmd().arg(&config).assert().success().stdout(
        "(rogue has entered the chat)\n\
         (client has entered the chat)\n\
         (rogue has left the chat)\n\
         (client has left the chat)\n",
    );
}

#[cfg(unix)]
#[test]
fn silent_participant_is_dropped_after_timeout() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    // Names itself, then never answers a turn
    let mute = write_file(
        tmp.path(),
        "mute.sh",
        "read line\necho NAME:mute\nwhile read line; do :; done\n",
    );
    let config = write_file(tmp.path(), "chat.conf", &config_line("/bin/sh", &mute));

    server_cmd()
        .env("CHAT_HUB_REPLY_TIMEOUT_MS", "1000")
        .arg(&config)
        .assert()
        .success()
        .stdout("(mute has entered the chat)\n(mute has left the chat)\n");
}

// ─── Participants on their own ─────────────────────────────────────

#[test]
fn client_without_script_prints_usage() {
    Command::new(CLIENT)
        .timeout(TIMEOUT)
        .assert()
        .code(1)
        .stderr(contains("Usage: chat_client chatscript"));
}

#[test]
fn bot_with_missing_file_prints_usage() {
    Command::new(BOT)
        .timeout(TIMEOUT)
        .arg("/nonexistent/responses")
        .assert()
        .code(1)
        .stderr(contains("Usage: chat_bot responsefile"));
}

#[test]
fn client_exits_with_comms_error_on_bad_line() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let script = write_file(tmp.path(), "client.script", "QUIT:\n");

    Command::new(CLIENT)
        .timeout(TIMEOUT)
        .arg(&script)
        .write_stdin("WHO:\nGARBAGE\n")
        .assert()
        .code(2)
        .stdout("NAME:client\n")
        .stderr(contains("Communications error"));
}

#[test]
fn kicked_client_exits_with_code_3() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let script = write_file(tmp.path(), "client.script", "QUIT:\n");

    Command::new(CLIENT)
        .timeout(TIMEOUT)
        .arg(&script)
        .write_stdin("WHO:\nNAME_TAKEN:\nWHO:\nMSG:bob:hi\nKICK:\n")
        .assert()
        .code(3)
        .stdout("NAME:client\nNAME:client0\n")
        .stderr(contains("(bob) hi"))
        .stderr(contains("Kicked"));
}
