/* 引擎核心：对接棋盘、搜索与开局库，提供给界面/宿主调用的全部操作 */
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::board::{Board, CapturedPiece, Chess, ChessType, Move, MoveRecord, Player, Position, BOARD_HEIGHT, BOARD_WIDTH};
use crate::book::OpeningBook;
use crate::config::{Difficulty, EngineConfig};
use crate::error::Result;
use crate::rules::Variant;
use crate::search::{SearchLimits, SearchState};

// 系统随机源不可用时的种子
const FALLBACK_SEED: u64 = 0x5EED_C0DE_2024_0001;

/// 存档用的完整对局状态：棋盘（含历史、被吃棋子、暗子信息）与难度
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: Board,
    pub difficulty: Difficulty,
}

pub struct XiangqiEngine {
    board: Board,
    config: EngineConfig,
    search: SearchState,
    book: OpeningBook,
    rng: fastrand::Rng,
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    if let Some(seed) = seed {
        return seed;
    }
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(err) => {
            warn!(%err, "system randomness unavailable, using fixed seed");
            FALLBACK_SEED
        }
    }
}

impl XiangqiEngine {
    pub fn new(config: EngineConfig) -> Self {
        XiangqiEngine::with_book(config, OpeningBook::builtin())
    }

    pub fn with_book(config: EngineConfig, book: OpeningBook) -> Self {
        let mut rng = fastrand::Rng::with_seed(resolve_seed(config.seed));
        let board = XiangqiEngine::fresh_board(config.variant, &mut rng);
        let search = SearchState::new(config.build_evaluator(), config.tt_bits);
        XiangqiEngine {
            board,
            config,
            search,
            book,
            rng,
        }
    }

    fn fresh_board(variant: Variant, rng: &mut fastrand::Rng) -> Board {
        match variant {
            Variant::Standard => Board::init(),
            Variant::Jieqi => Board::jieqi(rng),
        }
    }

    /// 重新开局：新棋盘（揭棋重新洗牌），清空历史、置换表和历史表
    pub fn reset(&mut self) {
        self.board = XiangqiEngine::fresh_board(self.config.variant, &mut self.rng);
        self.search.reset();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// 直接换一个局面（例如从 FEN 载入），历史随棋盘一起替换
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.search.reset();
    }

    pub fn set_difficulty(&mut self, level: u8) -> Result<()> {
        self.config.difficulty = Difficulty::try_from(level)?;
        Ok(())
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    pub fn is_valid_move(&mut self, from_row: i32, from_col: i32, to_row: i32, to_col: i32) -> bool {
        self.board
            .is_valid_move(Position::new(from_row, from_col), Position::new(to_row, to_col))
    }

    /// 不再校验合法性，调用方需先用 is_valid_move 检查
    pub fn move_piece(&mut self, from_row: i32, from_col: i32, to_row: i32, to_col: i32) -> Option<MoveRecord> {
        self.board
            .move_piece(Position::new(from_row, from_col), Position::new(to_row, to_col))
    }

    pub fn undo(&mut self) -> Option<MoveRecord> {
        self.board.undo()
    }

    /// 引擎一方（默认黑方）的最佳走法；无棋可走时返回 None
    pub fn get_best_move(&mut self) -> Option<Move> {
        self.get_best_move_for(self.config.engine_side)
    }

    pub fn get_best_move_for(&mut self, side: Player) -> Option<Move> {
        if let Some(m) = self.book_move(side) {
            return Some(m);
        }
        let limits = self.config.difficulty.limits();
        self.search_with_limits(side, limits)
    }

    /// 跳过开局库，按给定限制搜索
    pub fn search_with_limits(&mut self, side: Player, limits: SearchLimits) -> Option<Move> {
        let (_, best_move) = self.search.iterative_deepening(&mut self.board, side, limits);
        best_move
    }

    fn book_move(&mut self, side: Player) -> Option<Move> {
        if self.book.is_empty() {
            return None;
        }
        // 揭棋只有开局第一步时表面局面和标准开局一致
        if self.board.variant == Variant::Jieqi && !self.board.history.is_empty() {
            return None;
        }
        let candidates = self.book.candidates(self.board.apparent_fingerprint(side));
        if candidates.is_empty() {
            return None;
        }
        let entry = *candidates[self.rng.usize(..candidates.len())];
        let (from, to) = (entry.from, entry.to);
        if self.board.side_of(from) != Some(side) || !self.board.is_valid_move(from, to) {
            warn!(from = %from, to = %to, "rejected opening book move");
            return None;
        }
        info!(from = %from, to = %to, weight = entry.weight, "opening book hit");
        Some(Move {
            player: side,
            from,
            to,
            chess: self.board.apparent_chess_at(from),
            capture: self.board.apparent_chess_at(to),
        })
    }

    /// 将帅被吃的一方输；双方将帅都在返回 None
    pub fn check_win(&self) -> Option<Player> {
        let mut red_king = false;
        let mut black_king = false;
        for pos in Position::all() {
            match self.board.chess_at(pos) {
                Chess::Red(ChessType::King) => red_king = true,
                Chess::Black(ChessType::King) => black_king = true,
                _ => {}
            }
        }
        if !red_king {
            Some(Player::Black)
        } else if !black_king {
            Some(Player::Red)
        } else {
            None
        }
    }

    /// 10×9 棋盘快照（真实棋子），暗子需要配合 is_concealed 显示
    pub fn board_state(&self) -> [[Chess; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize] {
        self.board.chesses
    }

    pub fn piece_at(&self, row: i32, col: i32) -> Option<Chess> {
        self.board.piece_at(Position::new(row, col))
    }

    pub fn is_concealed(&self, row: i32, col: i32) -> bool {
        self.board.is_concealed(Position::new(row, col))
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.board.last_move()
    }

    pub fn legal_moves(&mut self, side: Player) -> Vec<Move> {
        self.board.legal_moves(side)
    }

    /// by 方吃掉的棋子
    pub fn captured(&self, by: Player) -> &[CapturedPiece] {
        self.board.captured(by)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.clone(),
            difficulty: self.config.difficulty,
        }
    }

    pub fn restore(&mut self, snapshot: GameSnapshot) {
        let GameSnapshot { mut board, difficulty } = snapshot;
        // 指纹不进存档，载入后重算
        board.refresh_zobrist();
        self.config.variant = board.variant;
        self.config.difficulty = difficulty;
        self.set_board(board);
    }
}
