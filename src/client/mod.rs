//! Client - 浏览器端语音会话驱动
//!
//! 纯逻辑、不做 I/O：把麦克风帧、服务端消息和播放事件翻译成 `ClientAction`，
//! 由宿主（浏览器/桌面端）执行。

mod session;

pub use session::{ClientAction, ClientConfig, ClientError, VoiceClient};
