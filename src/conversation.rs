//! Append-only chat log with deferred assistant replies.
//!
//! Sending a message appends it immediately and schedules the reply for
//! `now + delay`. Replies are not timers of their own: the owner calls
//! [`Conversation::poll`] with the current instant and every due reply is
//! classified and appended, in deadline order and then send order. Pending
//! replies belong to the conversation, so [`Conversation::reset`] and drop
//! cancel them and nothing is ever appended to a conversation that is gone.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

use crate::classifier::Classifier;
use crate::payload::ChatResponse;

pub type MessageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
    pub text: String,
    pub response: Option<ChatResponse>,
    /// The user message an assistant reply answers.
    pub reply_to: Option<MessageId>,
}

impl ChatMessage {
    pub fn has_chart(&self) -> bool {
        self.response
            .as_ref()
            .is_some_and(|r| r.payload.is_visual())
    }
}

/// Identifies one scheduled reply so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyHandle {
    seq: u64,
    message: MessageId,
}

impl ReplyHandle {
    /// The user message this reply will answer.
    pub fn message(&self) -> MessageId {
        self.message
    }
}

#[derive(Debug)]
struct PendingReply {
    handle: ReplyHandle,
    due: Instant,
    query: String,
}

pub struct Conversation {
    classifier: Box<dyn Classifier>,
    delay: Duration,
    messages: Vec<ChatMessage>,
    pending: Vec<PendingReply>,
    next_id: MessageId,
    next_seq: u64,
}

impl Conversation {
    pub fn new(classifier: Box<dyn Classifier>, delay: Duration) -> Self {
        Self {
            classifier,
            delay,
            messages: Vec::new(),
            pending: Vec::new(),
            next_id: 1,
            next_seq: 0,
        }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Deadline of the next reply to fire.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }

    /// Most recent assistant message carrying something drawable.
    pub fn latest_chart(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.has_chart())
    }

    fn append(
        &mut self,
        sender: Sender,
        text: String,
        response: Option<ChatResponse>,
        reply_to: Option<MessageId>,
    ) -> MessageId {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            sender,
            timestamp: Local::now(),
            text,
            response,
            reply_to,
        });
        id
    }

    /// Append the welcome message listing `prompts` sample questions.
    pub fn greet(&mut self, prompts: usize, seed: u64) -> MessageId {
        let samples = self.classifier.random_prompts(prompts, seed);
        let mut text = String::from("Hi! I'm your HR assistant. Ask me about your workforce data.");
        if !samples.is_empty() {
            text.push_str("\nTry asking:");
            for p in samples {
                text.push_str("\n  • ");
                text.push_str(&p);
            }
        }
        self.append(Sender::Ai, text, None, None)
    }

    /// Append an assistant notice that answers no particular message.
    pub fn notify(&mut self, text: impl Into<String>) -> MessageId {
        self.append(Sender::Ai, text.into(), None, None)
    }

    /// Append a user message and schedule its reply. Blank input is ignored.
    pub fn send(&mut self, text: &str, now: Instant) -> Option<ReplyHandle> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let message = self.append(Sender::User, text.to_string(), None, None);
        let handle = ReplyHandle {
            seq: self.next_seq,
            message,
        };
        self.next_seq += 1;
        self.pending.push(PendingReply {
            handle,
            due: now + self.delay,
            query: text.to_string(),
        });
        tracing::debug!(message, delay_ms = self.delay.as_millis() as u64, "reply scheduled");
        Some(handle)
    }

    /// Append every reply due at `now`. Returns the ids of the new messages.
    pub fn poll(&mut self, now: Instant) -> Vec<MessageId> {
        if self.pending.iter().all(|p| p.due > now) {
            return Vec::new();
        }
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|p| p.due <= now);
        self.pending = waiting;
        due.sort_by_key(|p| (p.due, p.handle.seq));

        due.into_iter()
            .map(|p| {
                let reply = self.classifier.classify(&p.query);
                let (text, response) = match reply {
                    Some(resp) => {
                        tracing::info!(message = p.handle.message, kind = resp.payload.kind(), "reply ready");
                        (resp.text.clone(), Some(resp))
                    }
                    None => {
                        tracing::info!(message = p.handle.message, "no matching response");
                        (self.fallback_text(), None)
                    }
                };
                self.append(Sender::Ai, text, response, Some(p.handle.message))
            })
            .collect()
    }

    fn fallback_text(&self) -> String {
        let mut text = String::from("Sorry, I don't have an answer for that yet. Try one of these:");
        for p in self.classifier.prompts().iter().take(3) {
            text.push_str("\n  • ");
            text.push_str(p);
        }
        text
    }

    /// Drop a scheduled reply. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: ReplyHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        before != self.pending.len()
    }

    /// Clear the log and cancel every pending reply. Ids keep increasing.
    pub fn reset(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(cancelled = self.pending.len(), "pending replies cancelled");
        }
        self.pending.clear();
        self.messages.clear();
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(cancelled = self.pending.len(), "conversation dropped with pending replies");
        }
    }
}
