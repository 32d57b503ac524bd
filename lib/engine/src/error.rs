use thiserror::Error;

/// 引擎对外可能出现的解析错误。
///
/// 棋盘查询本身从不失败（越界返回 `None`/`false`），只有文本输入才会走到这里。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid square `{0}`")]
    InvalidSquare(String),
    #[error("invalid move `{0}`")]
    InvalidMove(String),
    #[error("invalid fen `{fen}`: {reason}")]
    InvalidFen { fen: String, reason: &'static str },
    #[error("difficulty must be 1..=3, got {0}")]
    InvalidDifficulty(u8),
    #[error("book line {line}: {reason}")]
    InvalidBookLine { line: usize, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, EngineError>;
