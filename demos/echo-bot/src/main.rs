use roomlink::prelude::*;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

struct Settings {
    keys_path: String,
    nickname: String,
    password: String,
    room: String,
}

impl Settings {
    fn from_env() -> Result<Self, String> {
        let var = |name: &str| std::env::var(name).map_err(|_| format!("{name} is not set"));
        Ok(Self {
            keys_path: var("ROOMLINK_KEYS")?,
            nickname: var("ROOMLINK_NICKNAME")?,
            password: var("ROOMLINK_PASSWORD")?,
            room: std::env::var("ROOMLINK_ROOM").unwrap_or_else(|_| "1".into()),
        })
    }
}

// ---------------------------------------------------------------------------
// Bot logic
// ---------------------------------------------------------------------------

/// What the bot says back to a room line, if anything.
fn echo_for(own_nickname: &str, msg: &RoomMessage) -> Option<String> {
    let sender = msg.author.as_ref().map_or(msg.nickname.as_str(), |p| p.nickname.as_str());
    if sender.eq_ignore_ascii_case(own_nickname) || msg.content.trim().is_empty() {
        return None;
    }
    Some(msg.content.clone())
}

fn install_listeners(client: &mut Client, settings: &Settings) {
    let (nickname, password, room) = (
        settings.nickname.clone(),
        settings.password.clone(),
        settings.room.clone(),
    );
    client.on(EventKind::LoginReady, move |_, handle| {
        if let Err(e) = handle.login(&nickname, &password, &room) {
            tracing::error!(error = %e, "login not queued");
        }
    });

    client.on(EventKind::Logged, |event, _| {
        if let ClientEvent::Logged { nickname, pcode } = event {
            tracing::info!(%nickname, pcode, "logged in");
        }
    });

    let own = settings.nickname.clone();
    client.on(EventKind::RoomMessage, move |event, handle| {
        let ClientEvent::RoomMessage(msg) = event else { return };
        if let Some(text) = echo_for(&own, msg) {
            let _ = msg.reply(handle, &text);
        }
    });

    client.on(EventKind::Whisper, |event, handle| {
        if let ClientEvent::Whisper(whisper) = event {
            tracing::info!(author = %whisper.author, "whisper received");
            let _ = whisper.reply(handle, &whisper.content);
        }
    });

    client.on(EventKind::ChannelClosed, |event, handle| {
        if let ClientEvent::ChannelClosed {
            channel: ChannelKind::Main,
            reason,
            current: true,
        } = event
        {
            tracing::warn!(?reason, "main connection lost");
            let _ = handle.disconnect();
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    roomlink::init_tracing();

    let settings = Settings::from_env()?;
    let bootstrap = StaticBootstrap::from_json(&std::fs::read_to_string(&settings.keys_path)?)?;

    let mut client = Client::builder().build();
    install_listeners(&mut client, &settings);

    tracing::info!(nickname = %settings.nickname, room = %settings.room, "starting echo bot");
    client.start(&bootstrap, &settings.nickname, "").await?;
    client.run().await;
    Ok(())
}
