use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use chat_translator::config::Config;
use chat_translator::speech::LineDictation;
use chat_translator::terminal::{Command, TerminalView, HELP};
use chat_translator::{ApiClient, ChatController};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_translator=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    info!("Using backend {} (host: {})", config.api_base(), config.host);

    let api = ApiClient::from_config(&config)?;
    let (dictation, dictation_handle) = LineDictation::new();
    let (controller, mut speech_events) = ChatController::new(
        &config,
        api,
        Arc::new(TerminalView),
        Some(Box::new(dictation)),
    );

    controller.load().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(event) = speech_events.recv() => {
                controller.handle_speech_event(event).await;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                // While dictating, the line is the utterance
                if dictation_handle.deliver(&line) {
                    continue;
                }

                match Command::parse(&line) {
                    Command::Translate(text) => {
                        controller.set_input_text(&text).await;
                        let _ = controller.translate().await;
                    }
                    Command::Source(code) => {
                        if !controller.select_source(&code).await {
                            eprintln!("Unknown language code: {}", code);
                        }
                    }
                    Command::Target(code) => {
                        if !controller.select_target(&code).await {
                            eprintln!("Unknown language code: {}", code);
                        }
                    }
                    Command::Languages => {
                        let state = controller.snapshot().await;
                        for option in state.source.options() {
                            println!("  {:<8} {}", option.code, option.name);
                        }
                        println!(
                            "  source: {}  target: {}",
                            state.source.value(),
                            state.target.value()
                        );
                    }
                    Command::Detect(text) => {
                        controller.set_input_text(&text).await;
                        controller.detect_language(&text).await;
                    }
                    Command::Listen => {
                        if controller.start_listening().await.is_ok() {
                            println!("  🎤 listening, type what you would say");
                        }
                    }
                    Command::Speak => {
                        let _ = controller.speak_input().await;
                    }
                    Command::Help => println!("{}", HELP),
                    Command::Quit => break,
                    Command::Empty => {}
                    Command::Unknown(line) => eprintln!("Unknown command: {} (try /help)", line),
                }
            }
        }
    }

    info!("Bye");
    Ok(())
}
