//! Integration tests for `MessageCollector` against a recording bot

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use tele_input_core::{BotError, ChatId, UserId};
use tele_input_runtime::{ClearOptions, MessageCollector};
use tele_input_testing::RecordingBot;
use tele_input_testing::fixtures::text_message;

const CHAT: ChatId = ChatId::new(77);

async fn dialog(bot: &RecordingBot, prompts: &[&str]) -> MessageCollector {
    let mut collector = MessageCollector::new();
    for prompt in prompts {
        collector.send(bot, CHAT, prompt).await.unwrap();
    }
    collector
}

#[tokio::test]
async fn send_collects_the_sent_message() {
    let bot = RecordingBot::new();
    let mut collector = MessageCollector::new();

    let sent = collector.send(&bot, CHAT, "What's your name?").await.unwrap();

    assert_eq!(sent.chat, CHAT);
    assert_eq!(sent.text, "What's your name?");
    assert_eq!(collector.messages(), std::slice::from_ref(&sent));
    assert_eq!(bot.sent(), vec![sent]);
}

#[tokio::test]
async fn clear_deletes_everything_and_empties() {
    let bot = RecordingBot::new();
    let mut collector = dialog(&bot, &["Name?", "Age?"]).await;
    let reply = text_message(UserId::new(77), "42");
    collector.collect(reply.clone());

    collector.clear(&bot, ClearOptions::default()).await.unwrap();

    let mut expected: Vec<i64> = bot.sent().iter().map(|m| m.id).collect();
    expected.push(reply.id);
    assert_eq!(bot.deleted_ids(), expected);
    assert!(collector.messages().is_empty());
}

#[tokio::test]
async fn clear_can_keep_the_last_message() {
    let bot = RecordingBot::new();
    let mut collector = dialog(&bot, &["Name?", "Age?", "Thanks, all done"]).await;
    let sent = bot.sent();

    collector
        .clear(&bot, ClearOptions::default().exclude_last())
        .await
        .unwrap();

    assert_eq!(bot.deleted_ids(), vec![sent[0].id, sent[1].id]);
    assert!(collector.messages().is_empty());
}

#[tokio::test]
async fn clear_stops_at_first_failure() {
    let bot = RecordingBot::new();
    let mut collector = dialog(&bot, &["one", "two", "three"]).await;
    let sent = bot.sent();
    bot.fail_delete_of(sent[1].id);

    let result = collector.clear(&bot, ClearOptions::default()).await;

    assert!(matches!(result, Err(BotError::Api { code: 400, .. })));
    assert_eq!(bot.deleted_ids(), vec![sent[0].id]);
    assert_eq!(collector.messages().len(), 3, "collector is left untouched");
}

#[tokio::test]
async fn clear_can_skip_failures() {
    let bot = RecordingBot::new();
    let mut collector = dialog(&bot, &["one", "two", "three"]).await;
    let sent = bot.sent();
    bot.fail_delete_of(sent[1].id);

    collector
        .clear(&bot, ClearOptions::default().ignore_errors())
        .await
        .unwrap();

    assert_eq!(bot.deleted_ids(), vec![sent[0].id, sent[2].id]);
    assert!(collector.messages().is_empty());
}

#[tokio::test]
async fn clearing_an_empty_collector_is_noop() {
    let bot = RecordingBot::new();
    let mut collector = MessageCollector::new();

    collector
        .clear(&bot, ClearOptions::default().exclude_last())
        .await
        .unwrap();

    assert!(bot.deleted_ids().is_empty());
}
