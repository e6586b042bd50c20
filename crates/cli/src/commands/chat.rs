//! `docportal chat`: Interactive or single-message questions over documents.
//!
//! Interactive mode runs inside an [`InteractiveSession`], so its history
//! lives and dies with the REPL. Single-message mode has no interactive
//! context and uses the process-wide fallback registry.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use docportal_analysis::{ConversationalRag, KeywordRetriever};
use docportal_config::AppConfig;
use docportal_core::SessionId;
use docportal_memory::{InteractiveSession, SessionMemoryStore, SessionRegistry};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::loader::load_document;

pub async fn run(
    config: AppConfig,
    files: &[PathBuf],
    message: Option<String>,
    session: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (provider, model) = super::default_provider(&config)?;

    let documents = files
        .iter()
        .map(|path| load_document(path))
        .collect::<Result<Vec<_>, _>>()?;
    let retriever = KeywordRetriever::from_documents(&documents, config.retrieval.chunk_chars);
    let chunk_count = retriever.len();

    let session_id = session.map(SessionId::from).unwrap_or_default();
    let store = SessionMemoryStore::new(Arc::new(SessionRegistry::new()));
    let rag = ConversationalRag::new(
        session_id.clone(),
        provider,
        &model,
        Arc::new(retriever),
        store,
    )
    .with_temperature(config.default_temperature)
    .with_max_tokens(Some(config.default_max_tokens))
    .with_top_k(config.retrieval.top_k);

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let answer = rag.invoke(&msg).await?;
        eprint!("\r              \r");
        println!("{}", answer.answer);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       DocPortal Chat — Interactive Mode      ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", model);
    println!("  Documents: {} ({} chunks)", documents.len(), chunk_count);
    println!("  Session:   {}", session_id);
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let interactive = InteractiveSession::new();
    let result = interactive.scope(repl(&rag)).await;
    interactive.close();
    result?;

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}

async fn repl(rag: &ConversationalRag) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }
        if !line.is_empty() {
            eprint!("  ...");
            match rag.invoke(line).await {
                Ok(answer) => {
                    eprint!("\r     \r");
                    println!();
                    for text in answer.answer.lines() {
                        println!("  Assistant > {text}");
                    }
                    if !answer.sources.is_empty() {
                        let cited: Vec<String> = answer
                            .sources
                            .iter()
                            .take(3)
                            .map(|chunk| match chunk.page {
                                Some(page) => format!("{} p.{page}", chunk.source),
                                None => chunk.source.clone(),
                            })
                            .collect();
                        println!("  Sources   > {}", cited.join(", "));
                    }
                    println!();
                }
                Err(e) => {
                    eprint!("\r     \r");
                    eprintln!("  [Error] {e}");
                    println!();
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    Ok(())
}
