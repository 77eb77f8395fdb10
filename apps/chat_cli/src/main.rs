use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{config::load_config, ChatApi, ChatClient, RoomView, ViewEvent};
use shared::domain::{ConversationId, GroupId, MessageId, RoomId, User};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
struct Args {
    /// TOML config file; `chat.toml` is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    socket_url: Option<String>,
    #[arg(long, env = "CHAT_EMAIL")]
    email: String,
    #[arg(long, env = "CHAT_PASSWORD")]
    password: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists the conversations and groups of the signed-in user.
    List,
    Conversation { id: String },
    Group { id: String },
}

enum Input {
    Reply(MessageId),
    Edit(MessageId),
    Cancel,
    Retry,
    Quit,
    Text,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let (command, arg) = match line.split_once(' ') {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };
    match command {
        "/reply" if !arg.is_empty() => Input::Reply(MessageId::from(arg)),
        "/edit" if !arg.is_empty() => Input::Edit(MessageId::from(arg)),
        "/cancel" => Input::Cancel,
        "/retry" => Input::Retry,
        "/quit" => Input::Quit,
        _ => Input::Text,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }
    if let Some(socket_url) = args.socket_url {
        config.socket_url = socket_url;
    }

    let api = ChatApi::new(&config.api_url).context("invalid api url")?;
    api.login(&args.email, &args.password)
        .await
        .context("login failed")?;
    let user = api.profile().await.context("failed to fetch profile")?;
    info!(user = %user.id, "signed in as {}", user.username);

    let result = match args.command {
        Command::List => list(&config, &api, user).await,
        Command::Conversation { id } => {
            let client = ChatClient::connect(&config, api.clone(), user).await?;
            let conversation = client
                .find_conversation(&ConversationId::from(id.as_str()))
                .await?;
            let other = conversation.other_participant(&client.user().id);
            println!("== conversation with {} ==", other.username);
            run_room(&client, RoomId::Conversation(conversation.id)).await
        }
        Command::Group { id } => {
            let client = ChatClient::connect(&config, api.clone(), user).await?;
            let group = client.find_group(&GroupId::from(id.as_str())).await?;
            let title = group.name.clone().unwrap_or_else(|| group.id.to_string());
            println!("== {title} ({} members) ==", group.members.len());
            run_room(&client, RoomId::Group(group.id)).await
        }
    };

    if let Err(err) = api.logout().await {
        warn!("logout failed: {err}");
    }
    result
}

async fn list(config: &client_core::ClientConfig, api: &ChatApi, user: User) -> Result<()> {
    let conversations = api.conversations().await.context("failed to list conversations")?;
    let groups = api.groups().await.context("failed to list groups")?;
    info!(api = %config.api_url, "directory fetched");

    println!("conversations:");
    for conversation in &conversations {
        println!(
            "  {}  {}",
            conversation.id,
            conversation.other_participant(&user.id).username
        );
    }
    println!("groups:");
    for group in &groups {
        println!(
            "  {}  {}",
            group.id,
            group.name.as_deref().unwrap_or("(unnamed)")
        );
    }
    Ok(())
}

async fn run_room(client: &ChatClient, room: RoomId) -> Result<()> {
    let mut view = client.open_room(room);
    let mut updates = BroadcastStream::new(view.subscribe());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    redraw(&view, client.user()).await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_input(&line) {
                    Input::Quit => break,
                    Input::Reply(id) => match view.message(&id).await {
                        Some(message) => view.start_reply(message),
                        None => println!("no message #{id}"),
                    },
                    Input::Edit(id) => match view.message(&id).await {
                        Some(message) if message.author().id == client.user().id => {
                            view.start_edit(message)
                        }
                        Some(_) => println!("only your own messages can be edited"),
                        None => println!("no message #{id}"),
                    },
                    Input::Cancel => {
                        view.cancel_reply();
                        view.cancel_edit();
                    }
                    Input::Retry => {
                        if !view.retry_history().await {
                            println!("nothing to retry");
                        }
                    }
                    Input::Text => view.notify_typing(),
                }
                if let Some(line) = render::draft_line(view.draft()) {
                    println!("-- {line}");
                }
            }
            update = updates.next() => {
                match update {
                    Some(Ok(ViewEvent::Presence(change))) => info!(?change, "presence"),
                    Some(Ok(ViewEvent::HistoryFailed(reason))) => {
                        println!("failed to load messages: {reason} (type /retry)")
                    }
                    Some(Ok(ViewEvent::TypingChanged(users))) => {
                        if let Some(line) = render::typing_line(&users) {
                            println!("-- {line}");
                        }
                    }
                    Some(Ok(ViewEvent::HistoryLoaded | ViewEvent::MessagesChanged)) => {
                        redraw(&view, client.user()).await
                    }
                    Some(Err(err)) => warn!("view events lagged: {err}"),
                    None => break,
                }
            }
        }
    }

    view.unmount();
    Ok(())
}

async fn redraw(view: &RoomView, me: &User) {
    let snapshot = view.snapshot().await;
    for line in render::snapshot_lines(&snapshot, me) {
        println!("{line}");
    }
}
