//! TCP client session management.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use hiroma_shared::protocol::{MessageCodec, MessageKind};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{
    net::TcpStream,
    sync::{Mutex, mpsc},
};
use tokio_util::codec::Framed;

use crate::{
    command::Command,
    error::ClientError,
    formatter::MessageFormatter,
    ui::{PROMPT, redisplay_prompt},
};

/// Run one client session until logout, end of input or connection loss
pub async fn run_client_session(addr: &str) -> Result<(), ClientError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| ClientError::Connect {
            addr: addr.to_string(),
            source,
        })?;

    tracing::info!("Connected to chat server at {}", addr);
    println!(
        "\nCommands: /reg <login> <password>, /auth <login> <password>, /logout.\n\
         Anything else is sent as a public message. Press Ctrl+C to exit.\n"
    );

    let (mut write, mut read) = Framed::new(stream, MessageCodec::new()).split();

    // Set once AUTH_OK arrives
    let username: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    // Spawn a task to handle incoming frames
    let username_for_read = username.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            let message = match frame {
                Ok(Ok(message)) => message,
                Ok(Err(e)) => {
                    tracing::warn!("Ignoring malformed frame from server: {}", e);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Read error: {}", e);
                    return Err(ClientError::ConnectionLost);
                }
            };

            let mut me = username_for_read.lock().await;
            if message.kind == MessageKind::AuthOk {
                *me = Some(message.body.clone());
            }
            print!("{}", MessageFormatter::format(&message, me.as_deref()));

            if message.kind == MessageKind::LogoutOk {
                return Ok(());
            }
            redisplay_prompt();
        }

        tracing::info!("Server closed the connection");
        Err(ClientError::ConnectionLost)
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to turn input lines into frames
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(e) => {
                    println!("\n! {}", e);
                    redisplay_prompt();
                    continue;
                }
            };

            let me = username.lock().await.clone();
            if let Err(e) = write.send(command.into_message(me.as_deref())).await {
                tracing::warn!("Failed to send message: {}", e);
                return Err(ClientError::ConnectionLost);
            }
        }

        Ok(())
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            read_result.unwrap_or(Err(ClientError::ConnectionLost))
        }
        write_result = &mut write_task => {
            read_task.abort();
            write_result.unwrap_or(Err(ClientError::ConnectionLost))
        }
    }
}
