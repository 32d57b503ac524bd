/**
 * 象棋 / 揭棋引擎核心库入口
 *
 * - board, rules, concealment：棋盘状态、走法规则、暗子信息
 * - zobrist, evaluate, search：局面哈希、评估函数、alpha-beta 搜索
 * - book, config, engine：开局库、难度配置、对外的引擎接口
 * - ucci：文本协议会话
 */
pub mod board;
pub mod book;
pub mod concealment;
pub mod config;
pub mod constant;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod rules;
pub mod search;
pub mod ucci;
pub mod zobrist;

pub use board::{Board, Chess, ChessType, Move, MoveRecord, Player, Position};
pub use config::{Difficulty, EngineConfig};
pub use engine::{GameSnapshot, XiangqiEngine};
pub use error::{EngineError, Result};
pub use rules::Variant;
