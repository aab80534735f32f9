//! Pattern-response bot
//!
//! Watches the chat for known stimuli and answers them on its next turn.

use crate::codec;
use crate::handler::{Behavior, TurnPlan};
use crate::message::ClientMessage;

/// Usage message for the bot binary
pub const USAGE: &str = "Usage: chat_bot responsefile";

/// Base name used during negotiation
pub const BASE_NAME: &str = "clientbot";

/// Stimulus → reply table in response-file order
///
/// Duplicated stimuli are kept; the first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StimulusDictionary {
    entries: Vec<(String, String)>,
}

impl StimulusDictionary {
    /// Build from `stimulus:response` lines
    ///
    /// Comments, lines without exactly two fields and empty responses are
    /// ignored.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let entries = lines
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|line| !codec::is_comment(line))
            .filter_map(|line| match codec::decode(line).fields.as_slice() {
                [stimulus, response] if !response.is_empty() => {
                    Some((stimulus.clone(), response.clone()))
                }
                _ => None,
            })
            .collect();
        Self { entries }
    }

    /// Reply for the first stimulus contained in `message`
    ///
    /// Matching ignores ASCII case. An empty message matches nothing.
    pub fn lookup(&self, message: &str) -> Option<&str> {
        if message.is_empty() {
            return None;
        }
        let haystack = message.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(stimulus, _)| haystack.contains(&stimulus.to_ascii_lowercase()))
            .map(|(_, response)| response.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replies waiting for the bot's next turn
#[derive(Debug, Clone, Default)]
pub struct ReplyQueue {
    pending: Vec<String>,
}

impl ReplyQueue {
    pub fn push(&mut self, reply: impl Into<String>) {
        self.pending.push(reply.into());
    }

    /// Take every queued reply, leaving the queue empty
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Bot behavior: queue replies on chat, flush them on `YT:`
#[derive(Debug, Clone, Default)]
pub struct ResponderBot {
    dictionary: StimulusDictionary,
    queue: ReplyQueue,
}

impl ResponderBot {
    pub fn new(dictionary: StimulusDictionary) -> Self {
        Self {
            dictionary,
            queue: ReplyQueue::default(),
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Behavior for ResponderBot {
    fn on_turn(&mut self) -> TurnPlan {
        let mut lines: Vec<String> = self
            .queue
            .drain()
            .into_iter()
            .map(|content| ClientMessage::Chat { content }.to_line())
            .collect();
        lines.push(ClientMessage::Done.to_line());
        TurnPlan {
            lines,
            leave: false,
        }
    }

    /// Never answers itself
    fn on_message(&mut self, own_name: &str, from: &str, content: &str) {
        if from == own_name {
            return;
        }
        if let Some(reply) = self.dictionary.lookup(content) {
            self.queue.push(reply);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> StimulusDictionary {
        StimulusDictionary::from_lines(&[
            "# greetings",
            "hello:Hi there",
            "bye:See you",
            "HELLO:second hello",
            "empty:",
            "too:many:fields",
            "noseparator",
        ])
    }

    #[test]
    fn test_dictionary_parsing() {
        let dict = dictionary();
        assert_eq!(dict.len(), 3);
        assert!(!dict.is_empty());
    }

    #[test]
    fn test_lookup_first_match_case_insensitive() {
        let dict = dictionary();
        assert_eq!(dict.lookup("well HeLLo everyone"), Some("Hi there"));
        assert_eq!(dict.lookup("goodbye"), Some("See you"));
        assert_eq!(dict.lookup("nothing here"), None);
        assert_eq!(dict.lookup(""), None);
    }

    #[test]
    fn test_bot_queues_and_flushes() {
        let mut bot = ResponderBot::new(dictionary());
        bot.on_message("clientbot", "alice", "hello bot");
        bot.on_message("clientbot", "bob", "bye all");
        bot.on_message("clientbot", "carol", "unrelated");
        assert_eq!(bot.pending(), 2);

        let plan = bot.on_turn();
        assert_eq!(plan.lines, vec!["CHAT:Hi there", "CHAT:See you", "DONE:"]);
        assert!(!plan.leave);
        assert_eq!(bot.pending(), 0);

        assert_eq!(bot.on_turn().lines, vec!["DONE:"]);
    }

    #[test]
    fn test_bot_ignores_itself() {
        let mut bot = ResponderBot::new(dictionary());
        bot.on_message("clientbot0", "clientbot0", "hello");
        assert_eq!(bot.pending(), 0);
        bot.on_message("clientbot0", "clientbot", "hello");
        assert_eq!(bot.pending(), 1);
    }
}
