use super::Whois;
use crate::protocol::{IncomingMessage, Segment};
use crate::sink::send_or_fallback;
use crate::types::Resolution;
use std::sync::Arc;

/// Check a group message as a guess for the running round
pub async fn handle_answer(whois: &Arc<Whois>, msg: IncomingMessage) {
    let text = msg.text.trim();
    if text.is_empty() {
        return;
    }

    let Some(resolution) = whois
        .games
        .resolve_guess(&msg.group_id, &msg.user_id, text, &whois.answer_key)
        .await
    else {
        return;
    };

    announce_winner(whois, &msg, resolution).await;
}

async fn announce_winner(whois: &Whois, msg: &IncomingMessage, resolution: Resolution) {
    let congrats = format!("恭喜 {} 答对了！\n", msg.display_name);
    let answer = format!("正确答案是：{}\n", resolution.answer_name);
    let fallback = format!(
        "恭喜 {} 答对了！\n正确答案是：{}",
        msg.display_name, resolution.answer_name
    );

    let mut segments = vec![Segment::Text(congrats), Segment::Text(answer)];
    segments.extend(resolution.answer_image.map(Segment::Image));

    send_or_fallback(whois.sink.as_ref(), &msg.group_id, segments, fallback).await;
}
