/*
 * 揭棋（暗子）状态
 *
 * - hidden：哪些格子上的棋子还没翻开
 * - masked：只在搜索树里走动过的暗子。真实对局里它还没翻开，搜索也不能知道它是什么
 * - slots：格子 -> 开局时该位置的棋种（决定暗子怎么走），随棋子移动，被吃时删除
 *
 * 暗子的真实身份保存在棋盘上。hidden 与 masked 的格子对走法生成和评估只呈现
 * "原始位置棋种 + 颜色"（Board::apparent_chess_at），直到 move_piece 真正翻开。
 */
use serde::{Deserialize, Serialize};

use crate::board::{Chess, ChessType, Player, Position, BOARD_HEIGHT, BOARD_WIDTH};

/// 每方参与洗牌的 15 个棋子（将帅固定为明子）
pub const JIEQI_POOL: [ChessType; 15] = [
    ChessType::Rook,
    ChessType::Rook,
    ChessType::Knight,
    ChessType::Knight,
    ChessType::Bishop,
    ChessType::Bishop,
    ChessType::Advisor,
    ChessType::Advisor,
    ChessType::Cannon,
    ChessType::Cannon,
    ChessType::Pawn,
    ChessType::Pawn,
    ChessType::Pawn,
    ChessType::Pawn,
    ChessType::Pawn,
];

type Grid<T> = [[T; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Concealment {
    hidden: Grid<bool>,
    slots: Grid<Option<ChessType>>,
    // 搜索结束时一定全部撤销，不进存档
    #[serde(skip)]
    masked: Grid<bool>,
}

impl Concealment {
    pub fn is_hidden(&self, pos: Position) -> bool {
        pos.in_board() && self.hidden[pos.row as usize][pos.col as usize]
    }

    pub fn is_masked(&self, pos: Position) -> bool {
        pos.in_board() && self.masked[pos.row as usize][pos.col as usize]
    }

    /// 真实身份对搜索不可见
    pub fn is_veiled(&self, pos: Position) -> bool {
        self.is_hidden(pos) || self.is_masked(pos)
    }

    pub fn slot_role(&self, pos: Position) -> Option<ChessType> {
        if pos.in_board() {
            self.slots[pos.row as usize][pos.col as usize]
        } else {
            None
        }
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.iter().flatten().filter(|h| **h).count()
    }

    pub fn hidden_positions(&self) -> impl Iterator<Item = Position> + '_ {
        Position::all().filter(|pos| self.is_hidden(*pos))
    }

    /// 开局格属于哪一方只看所在的半场
    pub fn infer_side(pos: Position) -> Player {
        if pos.row >= BOARD_HEIGHT / 2 {
            Player::Red
        } else {
            Player::Black
        }
    }

    pub(crate) fn set(&mut self, pos: Position, hidden: bool, slot: Option<ChessType>) {
        self.hidden[pos.row as usize][pos.col as usize] = hidden;
        self.masked[pos.row as usize][pos.col as usize] = false;
        self.slots[pos.row as usize][pos.col as usize] = slot;
    }

    pub(crate) fn set_masked(&mut self, pos: Position, slot: Option<ChessType>) {
        self.set(pos, false, slot);
        self.masked[pos.row as usize][pos.col as usize] = true;
    }

    pub(crate) fn clear(&mut self, pos: Position) {
        self.set(pos, false, None);
    }

    /// 开局时某个格子应有的棋种，非开局格子返回 None
    pub fn start_slot(pos: Position) -> Option<ChessType> {
        let back_rank = pos.row == 0 || pos.row == BOARD_HEIGHT - 1;
        match (pos.row, pos.col) {
            (_, 0) | (_, 8) if back_rank => Some(ChessType::Rook),
            (_, 1) | (_, 7) if back_rank => Some(ChessType::Knight),
            (_, 2) | (_, 6) if back_rank => Some(ChessType::Bishop),
            (_, 3) | (_, 5) if back_rank => Some(ChessType::Advisor),
            (_, 4) if back_rank => Some(ChessType::King),
            (2, 1) | (2, 7) | (7, 1) | (7, 7) => Some(ChessType::Cannon),
            (3, c) | (6, c) if c % 2 == 0 => Some(ChessType::Pawn),
            _ => None,
        }
    }

    /// 揭棋开局：双方各自把 15 个子洗牌后放到固定的开局格上，全部背面朝上
    pub fn deal(rng: &mut fastrand::Rng) -> (Grid<Chess>, Concealment) {
        let mut chesses = [[Chess::None; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];
        let mut concealment = Concealment::default();
        chesses[0][4] = Chess::Black(ChessType::King);
        chesses[9][4] = Chess::Red(ChessType::King);

        for player in [Player::Black, Player::Red] {
            let mut pool = JIEQI_POOL;
            rng.shuffle(&mut pool);
            let slots = Position::all()
                .filter(|pos| Concealment::infer_side(*pos) == player)
                .filter_map(|pos| Concealment::start_slot(pos).map(|slot| (pos, slot)))
                .filter(|(_, slot)| *slot != ChessType::King);
            for ((pos, slot), ct) in slots.zip(pool) {
                chesses[pos.row as usize][pos.col as usize] = Chess::new(player, ct);
                concealment.set(pos, true, Some(slot));
            }
        }
        (chesses, concealment)
    }
}
