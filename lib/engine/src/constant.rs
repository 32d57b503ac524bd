use crate::{board::*, zobrist::*};
use std::{collections::HashMap, sync::LazyLock};

pub const MIN: i32 = -100_000;
pub const MAX: i32 = 100_000;
// 被将死时的基础分，实际返回 -MATE + distance，越早杀棋分数越极端
pub const MATE: i32 = 90_000;
pub const MATE_THRESHOLD: i32 = MATE - 1_000;
pub const DRAW: i32 = 0;
pub const MAX_DEPTH: i32 = 64;
// 静态搜索从水平线往下最多再走多少步吃子
pub const QUIESCENCE_LIMIT: i32 = 16;
pub const DEFAULT_TT_BITS: u32 = 16;
// 置换表大小 2^bits 的允许范围
pub const MIN_TT_BITS: u32 = 8;
pub const MAX_TT_BITS: u32 = 28;

pub static FEN_MAP: LazyLock<HashMap<char, Chess>> = LazyLock::new(|| {
    HashMap::from([
        ('k', Chess::Black(ChessType::King)),
        ('a', Chess::Black(ChessType::Advisor)),
        ('b', Chess::Black(ChessType::Bishop)),
        ('n', Chess::Black(ChessType::Knight)),
        ('r', Chess::Black(ChessType::Rook)),
        ('c', Chess::Black(ChessType::Cannon)),
        ('p', Chess::Black(ChessType::Pawn)),
        ('K', Chess::Red(ChessType::King)),
        ('A', Chess::Red(ChessType::Advisor)),
        ('B', Chess::Red(ChessType::Bishop)),
        ('N', Chess::Red(ChessType::Knight)),
        ('R', Chess::Red(ChessType::Rook)),
        ('C', Chess::Red(ChessType::Cannon)),
        ('P', Chess::Red(ChessType::Pawn)),
    ])
});
pub static ZOBRIST_TABLE: LazyLock<Zobristable> = LazyLock::new(|| Zobristable::new(0x9E37_79B9_7F4A_7C15));
pub static ZOBRIST_TABLE_LOCK: LazyLock<Zobristable> = LazyLock::new(|| Zobristable::new(0xD1B5_4A32_D192_ED03));
