pub mod agent;
pub mod models;
pub mod server;
pub mod llm;
pub mod cli;
pub mod history;
pub mod prompt;
pub mod recognizer;
pub mod speech;
pub mod vision;

use agent::TutorAgent;
use cli::Args;
use history::new_history_store;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Classifier Endpoint: {}", args.classifier_url);
    info!("Labels Path: {}", args.labels_path);
    info!("Max Image Edge: {}", args.max_image_edge);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("TTS Endpoint: {}", args.tts_base_url);
    info!("History Caps: {} turns / {} sessions", args.history_max_turns, args.history_max_sessions);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = Arc::new(TutorAgent::new(&args)?);
    let history = new_history_store(&args);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, history, args);
    server.run().await?;

    Ok(())
}
