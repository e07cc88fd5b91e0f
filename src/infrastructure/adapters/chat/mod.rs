//! Chat Adapter - 托管模型客户端实现

mod fake_chat_client;
mod gemini_chat_client;

pub use fake_chat_client::{FakeChatClient, FakeChatClientConfig};
pub use gemini_chat_client::*;
