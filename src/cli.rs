//! Terminal chat loop.
//!
//! Thin display surface over the conversation controller: read a line,
//! submit it, print the reply. Ctrl-C while a request is in flight cancels
//! that request; the turn then completes with a diagnostic reply.

use anyhow::Result;
use std::io::Write as _;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::conversation::{Conversation, SubmitOutcome};

pub async fn run_chat_loop(mut conversation: Conversation) -> Result<()> {
    if let Some(welcome) = conversation.messages().first() {
        println!("{} > {}", welcome.sender, welcome.text);
    }
    println!("Type your message. Type quit or exit to leave.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(
            input.to_lowercase().as_str(),
            "quit" | "exit" | "/quit" | "/exit"
        ) {
            println!("Goodbye!");
            break;
        }

        // Per-turn cancellation: Ctrl-C aborts the in-flight request only.
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let outcome = conversation.submit(input, &cancel).await;
        watcher.abort();

        match outcome {
            SubmitOutcome::Replied => {
                if let Some(reply) = conversation.messages().last() {
                    println!("\n{} > {}\n", reply.sender, reply.text);
                }
            }
            SubmitOutcome::Busy => println!("[Still waiting on the previous reply]"),
            SubmitOutcome::Ignored => {}
        }
    }

    Ok(())
}
