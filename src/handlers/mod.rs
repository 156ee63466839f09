//! Event dispatch
//!
//! Commands are consumed by the command handler; every other group message
//! is checked as a guess while a round is running.

pub mod answer;
pub mod command;

use crate::answer_key::{AnswerKey, AnswerKeyError};
use crate::config::WhoisConfig;
use crate::permission::{PermissionCheck, RolePermission};
use crate::protocol::HostEvent;
use crate::render::{ImageRenderer, PokemonRenderer};
use crate::sink::MessageSink;
use crate::state::GameManager;
use std::sync::Arc;

pub use command::Command;

/// Everything the game needs, owned by the hosting service and shared
/// with handlers and round timers
pub struct Whois {
    pub games: GameManager,
    pub answer_key: AnswerKey,
    pub config: WhoisConfig,
    pub renderer: Arc<dyn ImageRenderer>,
    pub sink: Arc<dyn MessageSink>,
    pub permission: Arc<dyn PermissionCheck>,
}

impl Whois {
    pub fn new(
        config: WhoisConfig,
        answer_key: AnswerKey,
        renderer: Arc<dyn ImageRenderer>,
        sink: Arc<dyn MessageSink>,
        permission: Arc<dyn PermissionCheck>,
    ) -> Self {
        Self {
            games: GameManager::new(),
            answer_key,
            config,
            renderer,
            sink,
            permission,
        }
    }

    /// Build the default collaborators from config
    pub fn from_config(
        config: WhoisConfig,
        sink: Arc<dyn MessageSink>,
    ) -> Result<Self, AnswerKeyError> {
        let answer_key = AnswerKey::load(config.answer_key_path.as_deref())?;
        let renderer = Arc::new(PokemonRenderer::new(&config));
        let permission = Arc::new(RolePermission::new(config.superusers.clone()));

        Ok(Self::new(config, answer_key, renderer, sink, permission))
    }
}

/// Handle one event from the host framework
pub async fn handle_event(whois: &Arc<Whois>, event: HostEvent) {
    if let Some(command) = Command::parse(&event.text, &whois.config.command_start) {
        command::handle_command(whois, &event, command).await;
        return;
    }

    if let Some(msg) = event.incoming() {
        answer::handle_answer(whois, msg).await;
    }
}
