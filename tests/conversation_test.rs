use hrviz::classifier::KeywordClassifier;
use hrviz::conversation::{Conversation, Sender};
use hrviz::payload::ChartPayload;
use std::time::{Duration, Instant};

const CATALOG: &str = r#"[
    {
        "prompt": "Show headcount",
        "keywords": ["headcount"],
        "response": {
            "type": "chart",
            "title": "Headcount",
            "data": {"chartType": "bar", "data": [{"label": "Eng", "value": 10}]}
        }
    },
    {
        "prompt": "Summarize leave",
        "keywords": ["leave"],
        "response": {"type": "text", "text": "Leave is on track."}
    }
]"#;

fn conversation(delay_ms: u64) -> Conversation {
    let classifier = KeywordClassifier::from_json(CATALOG).expect("Failed to load catalog");
    Conversation::new(Box::new(classifier), Duration::from_millis(delay_ms))
}

#[test]
fn test_overlapping_sends_reply_to_their_own_messages() {
    let mut conv = conversation(1000);
    let t0 = Instant::now();
    let first = conv.send("headcount please", t0).unwrap();
    let second = conv
        .send("and leave", t0 + Duration::from_millis(200))
        .unwrap();

    // Nothing is due before the first deadline
    assert!(conv.poll(t0 + Duration::from_millis(999)).is_empty());

    let fired = conv.poll(t0 + Duration::from_millis(1000));
    assert_eq!(fired.len(), 1);
    let reply = conv.message(fired[0]).unwrap();
    assert_eq!(reply.reply_to, Some(first.message()));
    assert!(matches!(
        reply.response.as_ref().map(|r| &r.payload),
        Some(ChartPayload::Chart(_))
    ));

    let fired = conv.poll(t0 + Duration::from_millis(1200));
    let reply = conv.message(fired[0]).unwrap();
    assert_eq!(reply.reply_to, Some(second.message()));
    assert_eq!(reply.text, "Leave is on track.");

    let senders: Vec<Sender> = conv.messages().iter().map(|m| m.sender).collect();
    assert_eq!(
        senders,
        vec![Sender::User, Sender::User, Sender::Ai, Sender::Ai]
    );
}

#[test]
fn test_unmatched_query_gets_fallback_with_prompts() {
    let mut conv = conversation(0);
    let now = Instant::now();
    conv.send("what's for lunch", now).unwrap();
    let fired = conv.poll(now);
    let reply = conv.message(fired[0]).unwrap();
    assert!(reply.response.is_none());
    assert!(reply.text.contains("Show headcount"));
    assert!(!reply.has_chart());
}

#[test]
fn test_cancelled_reply_never_arrives() {
    let mut conv = conversation(500);
    let now = Instant::now();
    let handle = conv.send("headcount", now).unwrap();
    assert!(conv.cancel(handle));
    assert!(!conv.cancel(handle));
    assert!(conv.poll(now + Duration::from_secs(5)).is_empty());
    assert_eq!(conv.messages().len(), 1);
}

#[test]
fn test_reset_clears_log_and_pending() {
    let mut conv = conversation(500);
    let now = Instant::now();
    conv.send("headcount", now);
    conv.send("leave", now);
    assert_eq!(conv.pending_count(), 2);
    conv.reset();
    assert_eq!(conv.pending_count(), 0);
    assert!(conv.messages().is_empty());
    assert!(conv.poll(now + Duration::from_secs(5)).is_empty());
}

#[test]
fn test_latest_chart_skips_text_replies() {
    let mut conv = conversation(0);
    let now = Instant::now();
    conv.send("headcount", now);
    conv.poll(now);
    conv.send("leave", now);
    conv.poll(now);
    let latest = conv.latest_chart().unwrap();
    assert_eq!(
        latest.response.as_ref().and_then(|r| r.title.as_deref()),
        Some("Headcount")
    );
}

#[test]
fn test_greeting_lists_sample_prompts() {
    let mut conv = conversation(0);
    let id = conv.greet(2, 42);
    let greeting = conv.message(id).unwrap();
    assert_eq!(greeting.sender, Sender::Ai);
    assert!(greeting.text.contains("Show headcount"));
    assert!(greeting.text.contains("Summarize leave"));
}
