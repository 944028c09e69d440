//! Outbound chat operations used by the request flow.
//!
//! The flow in [`crate::download::pipeline`] only needs a handful of Bot API
//! calls. Putting them behind [`ChatClient`] keeps the flow free of teloxide
//! request builders and lets tests record what would have been sent.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};
use teloxide::RequestError;

use crate::telegram::keyboard::{to_markup, QualityButton};

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends a text message and returns its id so it can be edited later.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, RequestError>;

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), RequestError>;

    async fn edit_text_with_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        buttons: &[QualityButton],
    ) -> Result<(), RequestError>;

    async fn send_audio(&self, chat: ChatId, bytes: Vec<u8>, file_name: &str) -> Result<(), RequestError>;

    async fn send_video(&self, chat: ChatId, bytes: Vec<u8>, file_name: &str) -> Result<(), RequestError>;
}

#[async_trait]
impl ChatClient for Bot {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, RequestError> {
        let message = self.send_message(chat, text).await?;
        Ok(message.id)
    }

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), RequestError> {
        match self.edit_message_text(chat, message, text).await {
            Ok(_) => Ok(()),
            // Editing to identical text is not a failure worth reporting
            Err(RequestError::Api(teloxide::ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn edit_text_with_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        buttons: &[QualityButton],
    ) -> Result<(), RequestError> {
        self.edit_message_text(chat, message, text)
            .reply_markup(to_markup(buttons))
            .await?;
        Ok(())
    }

    async fn send_audio(&self, chat: ChatId, bytes: Vec<u8>, file_name: &str) -> Result<(), RequestError> {
        let input = InputFile::memory(bytes).file_name(file_name.to_string());
        <Bot as Requester>::send_audio(self, chat, input).await?;
        Ok(())
    }

    async fn send_video(&self, chat: ChatId, bytes: Vec<u8>, file_name: &str) -> Result<(), RequestError> {
        let input = InputFile::memory(bytes).file_name(file_name.to_string());
        <Bot as Requester>::send_video(self, chat, input).await?;
        Ok(())
    }
}
