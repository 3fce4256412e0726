//! One-off questions from the terminal

use std::io::Write;

use futures::StreamExt;

use crate::cli::output::print_info;
use crate::cli::output::print_warning;
use crate::config::AnswerMode;
use crate::rag::ChatPipeline;
use crate::rag::ConversationHistory;
use crate::AppConfig;
use crate::Result;

/// Pick the answer mode: explicit flags win over `chat.mode`
#[must_use]
pub fn resolve_mode(configured: AnswerMode, batch: bool, stream: bool) -> AnswerMode {
    if batch {
        AnswerMode::Batch
    } else if stream {
        AnswerMode::Stream
    } else {
        configured
    }
}

pub async fn handle_ask(
    config: &AppConfig,
    question: String,
    batch: bool,
    stream: bool,
    verbose: bool,
) -> Result<()> {
    config.validate()?;
    let pipeline = ChatPipeline::from_config(config)?;

    print_info(&format!("🤖 Question: \"{question}\""));
    println!();

    match resolve_mode(config.chat.mode, batch, stream) {
        AnswerMode::Batch => {
            let reply = pipeline
                .answer_batch(&question, ConversationHistory::default())
                .await?;

            println!("{}", reply.answer);
            println!();
            if reply.fallback {
                print_warning("No grounded answer found in the indexed document");
            }
            if verbose {
                print_info(&format!("Sources used: {}", reply.sources_count));
            }
        }
        AnswerMode::Stream => {
            let response = pipeline
                .answer_stream(&question, ConversationHistory::default())
                .await?;

            let fragments = response.fragments();
            futures::pin_mut!(fragments);
            let mut stdout = std::io::stdout();
            while let Some(fragment) = fragments.next().await {
                write!(stdout, "{}", fragment?)?;
                stdout.flush()?;
            }
            println!();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_mode() {
        assert_eq!(resolve_mode(AnswerMode::Stream, true, false), AnswerMode::Batch);
        assert_eq!(resolve_mode(AnswerMode::Batch, false, true), AnswerMode::Stream);
        assert_eq!(resolve_mode(AnswerMode::Batch, false, false), AnswerMode::Batch);
    }
}
