//! Line-based chat UI: a login prompt, the conversation list, and one
//! open conversation at a time.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use courier_api::ApiClient;
use courier_common::models::DeliveryStatus;
use courier_common::{CourierError, SessionHandle};
use courier_config::CourierConfig;
use courier_realtime::{EventKind, RealtimeClient, ServerEvent};
use courier_session::{ChatSession, ChatTuning, RosterSession, TimelineEntry};

pub async fn run(
    api: ApiClient,
    realtime: RealtimeClient,
    session: SessionHandle,
    config: &CourierConfig,
) -> courier_common::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    login(&api, &mut lines).await?;
    realtime.connect();

    let roster = RosterSession::open(api.clone(), realtime.clone(), &session)
        .await?;
    print_roster(&roster);

    // Print messages for conversations that are not on screen.
    let printer = {
        let roster = roster.roster().clone();
        realtime.subscribe(EventKind::NewMessage, move |event| {
            if let ServerEvent::NewMessage { message } = event {
                let roster = roster.lock().unwrap();
                if roster.active() != Some(message.conversation_id.as_str()) {
                    let name = roster
                        .get(&message.conversation_id)
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| message.conversation_id.clone());
                    println!("  [{name}] {}", message.content.content);
                }
            }
        })
    };

    let tuning = ChatTuning {
        typing_quiet: Duration::from_millis(config.realtime.typing_quiet_ms),
        typing_throttle: Duration::from_millis(config.realtime.typing_throttle_ms),
    };

    let mut expired = session.expired();
    let mut chat: Option<ChatSession> = None;

    println!("Commands: /list, /open <n>, /close, /quit. Anything else sends a message.");
    loop {
        prompt(&chat).await;
        let line = tokio::select! {
            _ = expired.changed() => {
                if *expired.borrow_and_update() {
                    println!("Session expired, logging out.");
                    break;
                }
                continue;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => return Err(CourierError::Io(e)),
            },
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest.trim())) {
            ("/quit", _) => break,
            ("/list", _) => {
                if roster.needs_refresh() {
                    roster.refresh().await?;
                }
                print_roster(&roster);
            }
            ("/open", arg) => {
                let Ok(index) = arg.parse::<usize>() else {
                    println!("Usage: /open <number from /list>");
                    continue;
                };
                let picked = {
                    let roster = roster.roster().lock().unwrap();
                    roster.conversations().get(index.wrapping_sub(1)).map(|c| c.id.clone())
                };
                let Some(conversation_id) = picked else {
                    println!("No such conversation.");
                    continue;
                };
                let opened = ChatSession::open(
                    api.clone(),
                    realtime.clone(),
                    &session,
                    &conversation_id,
                    tuning,
                )
                .await?;
                roster.set_active(Some(conversation_id.as_str()));
                opened.mark_read();
                for entry in opened.entries() {
                    print_entry(&entry);
                }
                chat = Some(opened);
            }
            ("/close", _) => {
                roster.set_active(None);
                chat = None;
            }
            _ => match &chat {
                Some(chat) => {
                    chat.notify_typing();
                    chat.send_message(line).await;
                }
                None => println!("No conversation open; /open one first."),
            },
        }
    }

    realtime.unsubscribe(printer);
    realtime.disconnect();
    Ok(())
}

async fn login(
    api: &ApiClient,
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
) -> courier_common::Result<()> {
    loop {
        let identifier = ask(lines, "Email or phone: ").await?;
        let password = ask(lines, "Password: ").await?;
        match api.login(&identifier, &password).await {
            Ok(user) => {
                println!("Signed in as {}.", user.username.or(user.name).unwrap_or(user.id));
                return Ok(());
            }
            Err(e) => println!("Login failed: {e}"),
        }
    }
}

async fn ask(
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    prompt: &str,
) -> courier_common::Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    match lines.next_line().await? {
        Some(line) => Ok(line.trim().to_string()),
        None => Err(CourierError::Other("stdin closed".into())),
    }
}

async fn prompt(chat: &Option<ChatSession>) {
    if let Some(chat) = chat {
        if chat.peer_typing() {
            println!("  ...typing");
        }
    }
    let mut stdout = tokio::io::stdout();
    let _ = stdout.write_all(b"> ").await;
    let _ = stdout.flush().await;
}

fn print_roster(roster: &RosterSession) {
    let roster = roster.roster().lock().unwrap();
    println!("Conversations:");
    for (i, conversation) in roster.conversations().iter().enumerate() {
        let unread = roster.unread(&conversation.id);
        let unread = if unread > 0 { format!(" ({unread} unread)") } else { String::new() };
        let presence = conversation
            .status
            .map(|s| format!(" [{s:?}]").to_lowercase())
            .unwrap_or_default();
        println!(
            "  {}. {}{presence}{unread}: {}",
            i + 1,
            conversation.name,
            conversation.last_message
        );
    }
}

fn print_entry(entry: &TimelineEntry) {
    let marker = if entry.mine {
        match entry.status {
            DeliveryStatus::Sending => "me (sending)",
            DeliveryStatus::Sent => "me",
            DeliveryStatus::Read => "me (read)",
            DeliveryStatus::Failed => "me (failed)",
        }
        .to_string()
    } else {
        entry.message.sender_name.clone().unwrap_or_else(|| entry.message.sender_id.clone())
    };
    println!("  {marker}: {}", entry.message.content.content);
}
