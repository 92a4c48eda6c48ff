#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::{error, info, warn};

use chatpilot::config::{Configuration, Settings};
use chatpilot::errors::ChatpilotError;
use chatpilot::webdriver_manager::GLOBAL_WEBDRIVER_MANAGER;
use chatpilot::{
    ChatBot, ChatInteraction, ChatTurn, ChromeSession, ElementInteractor, OutputFormat, logging,
};

const EXIT_SUCCESS: i32 = 0;

#[tokio::main]
async fn main() {
    logging::init();

    let result = run().await;

    // Always clean up WebDriver processes before exiting
    GLOBAL_WEBDRIVER_MANAGER.stop_all();

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            let chatpilot_err: ChatpilotError = err.into();

            // Output JSON error to stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": chatpilot_err.to_string(),
                "exit_code": chatpilot_err.exit_code()
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            // Also log to stderr for human reading
            eprintln!("Error: {}", chatpilot_err);
            std::process::exit(chatpilot_err.exit_code());
        }
    }
}

fn print_header() {
    eprintln!(
        "{} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", env!("CARGO_PKG_DESCRIPTION"));
    eprintln!(
        "Author(s): {}",
        env!("CARGO_PKG_AUTHORS").replace(':', ", ")
    );
    eprintln!("{}", "=".repeat(80));
}

async fn run() -> Result<()> {
    let settings = Settings::parse();
    print_header();

    // Fail on a broken account bundle before touching the browser
    let config = settings.into_configuration()?;
    info!(
        "Loaded {} account(s), {} prompt(s)",
        config.accounts.len(),
        config.user_prompts.len()
    );

    let webdriver_url = match &config.webdriver_url {
        Some(url) => url.clone(),
        None => GLOBAL_WEBDRIVER_MANAGER
            .ensure_driver()
            .await
            .context("Failed to start chromedriver")?,
    };

    let session = ChromeSession::connect(&webdriver_url, config.headless, &config.url).await?;
    let interaction = ChatInteraction::new(ElementInteractor::new(session), config.accounts.clone())
        .with_retrieval(config.retrieval)
        .with_response_timeout(config.response_timeout);

    let outcome = converse(&interaction, &config).await;

    // The browser is closed on every path once it was opened
    if let Err(e) = interaction.into_session().quit().await {
        warn!("Failed to close the browser: {}", e);
    }

    let transcript = outcome?.unwrap_or_default();
    print_transcript(&transcript, config.format)
}

/// Log in if asked to, then run the conversation
///
/// `None` means the login failed and no prompt was sent.
async fn converse(
    interaction: &ChatInteraction<ChromeSession>,
    config: &Configuration,
) -> Result<Option<Vec<ChatTurn>>> {
    interaction
        .open(&config.url)
        .await
        .with_context(|| format!("Failed to open {}", config.url))?;

    if let Some(identity) = &config.account
        && !interaction.login(identity).await
    {
        error!("Login failed for {}, not sending any prompt", identity);
        return Ok(None);
    }

    if config.use_temporary_chat && !interaction.enable_temporary_chat().await {
        warn!("Could not enable temporary chat, continuing in a regular chat");
    }

    let transcript = ChatBot::new(interaction)
        .chat(&config.system_prompt, &config.user_prompts)
        .await;
    Ok(Some(transcript))
}

fn print_transcript(transcript: &[ChatTurn], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(transcript)?);
        }
        OutputFormat::Simple => {
            for turn in transcript {
                println!("> {}", turn.prompt);
                println!(
                    "{}",
                    turn.response.as_deref().unwrap_or("(no response)")
                );
                println!();
            }
        }
    }
    Ok(())
}
