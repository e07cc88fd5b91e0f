//! 回复语言检测
//!
//! 按文字书写系统判断回复语言，给客户端的语音合成选择发音人

/// 默认语言
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Unicode 区块 -> BCP-47 标签
const SCRIPT_RANGES: &[(char, char, &str)] = &[
    ('\u{0900}', '\u{097F}', "hi-IN"), // Devanagari
    ('\u{0980}', '\u{09FF}', "bn-IN"), // Bengali
    ('\u{0A00}', '\u{0A7F}', "pa-IN"), // Gurmukhi
    ('\u{0A80}', '\u{0AFF}', "gu-IN"), // Gujarati
    ('\u{0B80}', '\u{0BFF}', "ta-IN"), // Tamil
    ('\u{0C00}', '\u{0C7F}', "te-IN"), // Telugu
    ('\u{0C80}', '\u{0CFF}', "kn-IN"), // Kannada
    ('\u{0D00}', '\u{0D7F}', "ml-IN"), // Malayalam
];

/// 检测文本语言，取第一个命中的书写系统
pub fn detect_language(text: &str) -> &'static str {
    text.chars()
        .find_map(|c| {
            SCRIPT_RANGES
                .iter()
                .find(|(start, end, _)| (*start..=*end).contains(&c))
                .map(|(_, _, tag)| *tag)
        })
        .unwrap_or(DEFAULT_LANGUAGE)
}
