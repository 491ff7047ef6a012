// ABOUTME: Slack Socket Mode glue - bridges message events to the router and posts threaded replies
// ABOUTME: Callbacks are fn pointers; shared state travels through the listener user state

use std::sync::Arc;

use anyhow::{Context, Result};
use slack_morphism::prelude::*;

use crate::config::Config;
use crate::paths;
use crate::router::{route_event, CliRunner, InboundEvent, Reply};
use crate::store::{ModelAlias, ModelStore, SessionStore};

/// Reaction shown on a message while its prompt is being processed
const WORKING_REACTION: &str = "hourglass_flowing_sand";

/// State shared with Socket Mode callback functions via user state storage.
/// Callbacks are fn pointers (not closures), so they cannot capture
/// variables; this is registered via `with_user_state()` and retrieved
/// inside callbacks from the `SlackClientEventsUserState` RwLock.
#[derive(Clone)]
struct SlackBridgeState {
    client: Arc<SlackHyperClient>,
    bot_token: SlackApiToken,
    /// Bot's user ID (to skip self-messages)
    bot_user_id: String,
    sessions: Arc<SessionStore>,
    models: Arc<ModelStore>,
    runner: Arc<CliRunner>,
}

/// Start the Socket Mode listener and serve events until shutdown (blocking).
pub async fn start(config: Config) -> Result<()> {
    config.slack.ensure_tokens()?;

    let client = Arc::new(SlackClient::new(
        SlackClientHyperConnector::new().context("Failed to create Slack HTTP connector")?,
    ));
    let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack.bot_token.clone()));
    let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack.app_token.clone()));

    // Resolve the bot user id so its own messages can be skipped
    let session = client.open_session(&bot_token);
    let auth = session
        .auth_test()
        .await
        .context("Failed to call Slack auth.test — check bot_token")?;
    let bot_user_id = auth.user_id.to_string();

    tracing::info!(
        bot_user = %bot_user_id,
        team = %auth.team,
        "Slack bot authenticated"
    );

    let state = SlackBridgeState {
        client: Arc::clone(&client),
        bot_token,
        bot_user_id,
        sessions: Arc::new(SessionStore::new(paths::sessions_file())),
        models: Arc::new(ModelStore::new(paths::models_file())),
        runner: Arc::new(CliRunner::new(config.claude.clone())),
    };

    let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new()
        .with_push_events(handle_push_event)
        .with_command_events(handle_command_event);

    let listener_environment = Arc::new(
        SlackClientEventsListenerEnvironment::new(client)
            .with_error_handler(socket_mode_error_handler)
            .with_user_state(state),
    );

    let socket_mode_listener = SlackClientSocketModeListener::new(
        &SlackClientSocketModeConfig::new(),
        listener_environment,
        socket_mode_callbacks,
    );

    socket_mode_listener
        .listen_for(&app_token)
        .await
        .context("Failed to start Socket Mode listener")?;
    tracing::info!("Socket Mode connected, listening for messages");

    socket_mode_listener.serve().await;
    Ok(())
}

/// Handle push events (messages) from Socket Mode
async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bridge = {
        let guard = states.read().await;
        guard
            .get_user_state::<SlackBridgeState>()
            .cloned()
            .ok_or("SlackBridgeState not found in user state")?
    };

    if let SlackEventCallbackBody::Message(msg_event) = event.event {
        // One task per message so a slow claude run never blocks the listener
        tokio::spawn(handle_message_event(bridge, msg_event));
    }
    Ok(())
}

/// Process a Slack message event: route it and post the threaded reply
async fn handle_message_event(bridge: SlackBridgeState, msg_event: SlackMessageEvent) {
    // Edits, bot echoes, joins, and other subtyped events are not prompts
    if msg_event.subtype.is_some() {
        return;
    }

    let Some(sender_id) = msg_event.sender.user.as_ref().map(|u| u.to_string()) else {
        return; // system messages carry no user
    };
    if sender_id == bridge.bot_user_id {
        return;
    }

    let Some(channel) = msg_event.origin.channel.clone() else {
        return;
    };

    let text = msg_event
        .content
        .as_ref()
        .and_then(|c| c.text.as_ref())
        .map(|t| t.to_string())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return;
    }

    let ts = msg_event.origin.ts.clone();
    let event = InboundEvent {
        text,
        channel: channel.to_string(),
        ts: ts.to_string(),
        thread_ts: msg_event.origin.thread_ts.as_ref().map(|t| t.to_string()),
    };

    add_working_reaction(&bridge, &channel, &ts).await;

    match route_event(&event, &bridge.sessions, &bridge.models, bridge.runner.as_ref()).await {
        Ok(Some(reply)) => {
            if let Err(e) = send_threaded_reply(&bridge, &channel, &reply).await {
                tracing::error!(channel = %channel, error = %e, "Failed to send reply");
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(channel = %channel, error = %e, "Failed to route message");
        }
    }

    remove_working_reaction(&bridge, &channel, &ts).await;
}

/// Handle slash command events (/model) from Socket Mode
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    let bridge = {
        let guard = states.read().await;
        guard
            .get_user_state::<SlackBridgeState>()
            .cloned()
            .ok_or("SlackBridgeState not found in user state")?
    };

    let command = event.command.to_string();
    let reply = if command == "/model" {
        model_command_reply(
            &bridge.models,
            &event.channel_id.to_string(),
            event.text.as_deref().unwrap_or(""),
        )
    } else {
        format!("Unknown command: {}", command)
    };

    Ok(SlackCommandEventResponse::new(
        SlackMessageContent::new().with_text(reply),
    ))
}

/// Build the `/model` response, applying any preference change.
/// No argument reports the current preference; a valid alias persists it.
fn model_command_reply(models: &ModelStore, channel: &str, arg: &str) -> String {
    let arg = arg.trim().to_lowercase();

    if arg.is_empty() {
        let current = models
            .get(channel)
            .map(|m| m.to_string())
            .unwrap_or_else(|| "default (set by CLI)".to_string());
        return format!(
            "Current model: *{}*\nUsage: `/model [{}]`",
            current,
            ModelAlias::valid_list()
        );
    }

    match arg.parse::<ModelAlias>() {
        Ok(model) => match models.set(channel, model) {
            Ok(()) => format!("Model switched to *{}* for this channel.", model),
            Err(e) => {
                tracing::error!(channel = %channel, error = %e, "Failed to persist model preference");
                format!("Could not save model preference: {}", e)
            }
        },
        Err(_) => format!(
            "Unknown model `{}`. Valid options: {}",
            arg,
            ModelAlias::valid_list()
        ),
    }
}

/// Send a reply threaded under its thread ts via the Web API
async fn send_threaded_reply(
    bridge: &SlackBridgeState,
    channel: &SlackChannelId,
    reply: &Reply,
) -> Result<()> {
    let session = bridge.client.open_session(&bridge.bot_token);

    let req = SlackApiChatPostMessageRequest::new(
        channel.clone(),
        SlackMessageContent::new().with_text(reply.text.clone()),
    )
    .with_thread_ts(reply.thread_ts.clone().into());

    session
        .chat_post_message(&req)
        .await
        .context("Failed to send threaded Slack message")?;

    Ok(())
}

/// Best-effort processing indicator; failures are logged and non-fatal
async fn add_working_reaction(bridge: &SlackBridgeState, channel: &SlackChannelId, ts: &SlackTs) {
    let session = bridge.client.open_session(&bridge.bot_token);
    let req = SlackApiReactionsAddRequest::new(
        channel.clone(),
        SlackReactionName::new(WORKING_REACTION.into()),
        ts.clone(),
    );
    if let Err(e) = session.reactions_add(&req).await {
        tracing::debug!(channel = %channel, error = %e, "Could not add working reaction");
    }
}

async fn remove_working_reaction(
    bridge: &SlackBridgeState,
    channel: &SlackChannelId,
    ts: &SlackTs,
) {
    let session = bridge.client.open_session(&bridge.bot_token);
    let req = SlackApiReactionsRemoveRequest::new(SlackReactionName::new(WORKING_REACTION.into()))
        .with_channel(channel.clone())
        .with_timestamp(ts.clone());
    if let Err(e) = session.reactions_remove(&req).await {
        tracing::debug!(channel = %channel, error = %e, "Could not remove working reaction");
    }
}

/// Socket Mode error handler
fn socket_mode_error_handler(
    err: Box<dyn std::error::Error + Send + Sync>,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> HttpStatusCode {
    tracing::error!(error = %err, "Socket Mode error");
    HttpStatusCode::OK
}
