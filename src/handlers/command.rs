//! `whois` / `猜猜我是谁` / `猜宝可梦` commands: start, stop and status.
//!
//! Commands only make sense inside a group. An event without a group id is
//! dropped with a debug log and gets no reply, because replies are always
//! addressed to a group.

use super::Whois;
use crate::protocol::{HostEvent, IncomingMessage, Segment};
use crate::render::render_blocking;
use crate::sink::send_text;
use crate::state::GameError;
use crate::timer;
use crate::types::GameState;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Names the command answers to
pub const COMMAND_NAMES: &[&str] = &["whois", "猜猜我是谁", "猜宝可梦"];

pub const MSG_BUSY: &str = "游戏正在进行中，请等待当前游戏结束";
pub const MSG_START_FAILED: &str = "游戏开始失败，请稍后重试";
pub const MSG_NO_GAME: &str = "当前没有进行中的游戏";
pub const MSG_STOPPED: &str = "游戏已强制结束";
pub const MSG_STOP_DENIED: &str = "只有管理员可以强制结束游戏";
pub const MSG_GROUP_DISABLED: &str = "本群未启用猜猜我是谁";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Status,
}

impl Command {
    /// Parse `<prefix><name> [arg]`. Unknown arguments start a round.
    pub fn parse(text: &str, command_start: &str) -> Option<Self> {
        let body = text.trim().strip_prefix(command_start)?;

        let args = COMMAND_NAMES.iter().find_map(|name| {
            let rest = body.strip_prefix(name)?;
            (rest.is_empty() || rest.starts_with(char::is_whitespace)).then(|| rest.trim())
        })?;

        Some(match args {
            "stop" => Self::Stop,
            "list" | "status" => Self::Status,
            _ => Self::Start,
        })
    }
}

pub async fn handle_command(whois: &Arc<Whois>, event: &HostEvent, command: Command) {
    let Some(msg) = event.incoming() else {
        tracing::debug!("Ignoring {:?} outside of a group", command);
        return;
    };

    tracing::info!(
        "Command {:?} from {} in group {}",
        command,
        msg.user_id,
        msg.group_id
    );

    match command {
        Command::Start => start_round(whois, &msg).await,
        Command::Stop => handle_stop(whois, event, &msg).await,
        Command::Status => handle_status(whois, &msg).await,
    }
}

async fn handle_stop(whois: &Arc<Whois>, event: &HostEvent, msg: &IncomingMessage) {
    let sink = whois.sink.as_ref();

    if !whois.permission.can_force_stop(event).await {
        send_text(sink, &msg.group_id, MSG_STOP_DENIED).await;
        return;
    }

    if whois.games.end(&msg.group_id).await {
        send_text(sink, &msg.group_id, MSG_STOPPED).await;
    } else {
        send_text(sink, &msg.group_id, MSG_NO_GAME).await;
    }
}

async fn handle_status(whois: &Arc<Whois>, msg: &IncomingMessage) {
    let state = whois.games.get_or_create(&msg.group_id).await;
    let reply = status_text(&state, whois.config.timeout, Utc::now());
    send_text(whois.sink.as_ref(), &msg.group_id, reply).await;
}

/// Status reply for a group. Remaining time is floored at zero.
fn status_text(state: &GameState, timeout: Duration, now: DateTime<Utc>) -> String {
    match (state.is_playing, state.started_at) {
        (true, Some(started_at)) => {
            let elapsed = (now - started_at).num_seconds();
            let remaining = (timeout.as_secs() as i64 - elapsed).max(0);
            let status = if state.winner_user_id.is_some() {
                "已有人答对"
            } else {
                "等待答案中"
            };
            format!("游戏中...\n剩余时间: {}秒\n当前状态: {}", remaining, status)
        }
        _ => MSG_NO_GAME.to_string(),
    }
}

/// Open a round: draw an answer, render both images, post the puzzle and
/// start the timer. Any failure after the round is opened closes it again
/// before the failure is reported.
pub async fn start_round(whois: &Arc<Whois>, msg: &IncomingMessage) {
    let group_id = msg.group_id.as_str();
    let sink = whois.sink.as_ref();

    if !whois.config.group_enabled(group_id) {
        send_text(sink, group_id, MSG_GROUP_DISABLED).await;
        return;
    }

    if whois.games.is_playing(group_id).await {
        send_text(sink, group_id, MSG_BUSY).await;
        return;
    }

    let Some(answer) = whois.answer_key.pick_random() else {
        tracing::error!("Answer key is empty, cannot start a round");
        send_text(sink, group_id, MSG_START_FAILED).await;
        return;
    };

    let (name, alt_name) = (answer.name.clone(), answer.alt_name.clone());
    let answer_image =
        match render_blocking(&whois.renderer, move |r| r.answer(&name, &alt_name)).await {
            Ok(img) => img,
            Err(e) => {
                tracing::error!("Failed to render answer for {}: {}", answer.id, e);
                send_text(sink, group_id, MSG_START_FAILED).await;
                return;
            }
        };

    let round_id = match whois
        .games
        .start(group_id, answer.id, &answer.name, &answer.alt_name)
        .await
    {
        Ok(round_id) => round_id,
        Err(GameError::AlreadyActive) => {
            send_text(sink, group_id, MSG_BUSY).await;
            return;
        }
        Err(e) => {
            tracing::error!("Failed to start round in group {}: {}", group_id, e);
            send_text(sink, group_id, MSG_START_FAILED).await;
            return;
        }
    };

    if let Err(e) = whois.games.set_answer_image(group_id, answer_image).await {
        // Stopped while we were starting
        tracing::warn!("Round {} closed before it was posted: {}", round_id, e);
        return;
    }

    let name = answer.name.clone();
    let puzzle = match render_blocking(&whois.renderer, move |r| r.puzzle(&name)).await {
        Ok(img) => img,
        Err(e) => {
            tracing::error!("Failed to render puzzle for {}: {}", answer.id, e);
            whois.games.abort(group_id, &round_id).await;
            send_text(sink, group_id, MSG_START_FAILED).await;
            return;
        }
    };

    let segments = vec![
        Segment::text(format!(
            "猜猜我是谁？ ({}秒后公布答案)\n",
            whois.config.timeout.as_secs()
        )),
        Segment::Image(puzzle),
    ];

    if let Err(e) = sink.send(group_id, segments).await {
        tracing::error!("Failed to post puzzle to group {}: {}", group_id, e);
        whois.games.abort(group_id, &round_id).await;
        send_text(sink, group_id, MSG_START_FAILED).await;
        return;
    }

    timer::spawn_round_timer(Arc::clone(whois), group_id.to_string(), round_id);
}
