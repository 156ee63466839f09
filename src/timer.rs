use crate::handlers::Whois;
use crate::protocol::Segment;
use crate::sink::send_or_fallback;
use crate::types::{GroupId, RoundId};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Spawn the timer that reveals the answer if nobody guesses it in time.
///
/// The timer is never cancelled. When it wakes up after the round was won
/// or stopped it finds nothing to resolve and exits.
pub fn spawn_round_timer(
    whois: Arc<Whois>,
    group_id: GroupId,
    round_id: RoundId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(whois.config.timeout).await;
        expire_round(&whois, &group_id, &round_id).await;
    })
}

/// Resolve the round by timeout. Returns whether this call closed it.
pub async fn expire_round(whois: &Whois, group_id: &str, round_id: &str) -> bool {
    let resolution = match whois.games.resolve_timeout(group_id, round_id).await {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::debug!(
                "Timer for round {} in group {} has nothing to do: {}",
                round_id,
                group_id,
                e
            );
            return false;
        }
    };

    tracing::info!("Round {} in group {} timed out", round_id, group_id);

    let mut segments = vec![
        Segment::text(format!("时间到！正确答案是：{}\n", resolution.answer_name)),
        Segment::text("很遗憾，没有人答对~\n"),
    ];
    segments.extend(resolution.answer_image.map(Segment::Image));
    let fallback = format!("时间到！正确答案是：{}", resolution.answer_name);

    send_or_fallback(whois.sink.as_ref(), group_id, segments, fallback).await;
    true
}
