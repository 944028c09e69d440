//! Chat client that records every outbound call instead of talking to Telegram

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};
use teloxide::{ApiError, RequestError};
use ytgrab::telegram::keyboard::QualityButton;
use ytgrab::telegram::ChatClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Text { chat: ChatId, id: MessageId, text: String },
    Edit { message: MessageId, text: String },
    Menu { message: MessageId, text: String, buttons: Vec<QualityButton> },
    Audio { file_name: String, size: usize },
    Video { file_name: String, size: usize },
}

#[derive(Default)]
pub struct RecordingChat {
    events: Mutex<Vec<ChatEvent>>,
    next_id: AtomicI32,
    fail_uploads: AtomicBool,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upload fails with an API error
    pub fn failing_uploads() -> Self {
        let chat = Self::default();
        chat.fail_uploads.store(true, Ordering::SeqCst);
        chat
    }

    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ChatEvent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ChatEvent::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Status message id and buttons of the most recent quality menu
    pub fn last_menu(&self) -> Option<(MessageId, Vec<QualityButton>)> {
        self.events().into_iter().rev().find_map(|event| match event {
            ChatEvent::Menu { message, buttons, .. } => Some((message, buttons)),
            _ => None,
        })
    }

    pub fn uploads(&self) -> Vec<ChatEvent> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, ChatEvent::Audio { .. } | ChatEvent::Video { .. }))
            .collect()
    }

    fn push(&self, event: ChatEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn upload_error(&self) -> Option<RequestError> {
        self.fail_uploads
            .load(Ordering::SeqCst)
            .then(|| RequestError::Api(ApiError::Unknown("Request Entity Too Large".to_string())))
    }
}

#[async_trait]
impl ChatClient for RecordingChat {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, RequestError> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.push(ChatEvent::Text {
            chat,
            id,
            text: text.to_string(),
        });
        Ok(id)
    }

    async fn edit_text(&self, _chat: ChatId, message: MessageId, text: &str) -> Result<(), RequestError> {
        self.push(ChatEvent::Edit {
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn edit_text_with_keyboard(
        &self,
        _chat: ChatId,
        message: MessageId,
        text: &str,
        buttons: &[QualityButton],
    ) -> Result<(), RequestError> {
        self.push(ChatEvent::Menu {
            message,
            text: text.to_string(),
            buttons: buttons.to_vec(),
        });
        Ok(())
    }

    async fn send_audio(&self, _chat: ChatId, bytes: Vec<u8>, file_name: &str) -> Result<(), RequestError> {
        if let Some(e) = self.upload_error() {
            return Err(e);
        }
        self.push(ChatEvent::Audio {
            file_name: file_name.to_string(),
            size: bytes.len(),
        });
        Ok(())
    }

    async fn send_video(&self, _chat: ChatId, bytes: Vec<u8>, file_name: &str) -> Result<(), RequestError> {
        if let Some(e) = self.upload_error() {
            return Err(e);
        }
        self.push(ChatEvent::Video {
            file_name: file_name.to_string(),
            size: bytes.len(),
        });
        Ok(())
    }
}
