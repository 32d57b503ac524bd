/*
 * 象棋棋盘模块（Board 与棋子表示）
 *
 * 设计要点
 * - 棋盘 9 列 x 10 行，第 0 行是黑方底线，第 9 行是红方底线
 * - 棋子用 Chess 枚举表示，分黑方/红方与具体棋种；Chess::None 表示空格
 * - Board 保存完整局面：棋子排布、规则变体、暗子状态、对局历史、被吃棋子、Zobrist 指纹
 * - 所有改动只通过 make_move / unmake_move 完成，它们严格对称（含暗子与被吃列表）
 * - 搜索用 apply() 得到 ScopedMove，离开作用域时自动撤销；搜索里走动的暗子不会翻开
 */
use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::concealment::Concealment;
use crate::constant::{FEN_MAP, ZOBRIST_TABLE, ZOBRIST_TABLE_LOCK};
use crate::error::{EngineError, Result};
use crate::rules::Variant;
use crate::zobrist::Zobristable;

pub const BOARD_WIDTH: i32 = 9;
pub const BOARD_HEIGHT: i32 = 10;

pub const START_FEN: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Chess {
    Black(ChessType),
    Red(ChessType),
    None,
}

impl Chess {
    pub fn new(player: Player, ct: ChessType) -> Self {
        match player {
            Player::Red => Chess::Red(ct),
            Player::Black => Chess::Black(ct),
        }
    }
    pub fn material_value(&self) -> i32 {
        match self.chess_type() {
            Some(ct) => ct.material_value(),
            None => 0,
        }
    }
    pub fn belong_to(&self, player: Player) -> bool {
        Some(player) == self.player()
    }
    pub fn chess_type(&self) -> Option<ChessType> {
        match self {
            Chess::Black(ct) => Some(ct.to_owned()),
            Chess::Red(ct) => Some(ct.to_owned()),
            Chess::None => None,
        }
    }
    pub fn player(&self) -> Option<Player> {
        match self {
            Chess::Black(_) => Some(Player::Black),
            Chess::Red(_) => Some(Player::Red),
            Chess::None => None,
        }
    }
    pub fn fen_char(&self) -> Option<char> {
        let ch = self.chess_type()?.fen_char();
        match self {
            Chess::Red(_) => Some(ch.to_ascii_uppercase()),
            _ => Some(ch),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ChessType {
    King,    // 帅
    Advisor, // 士
    Bishop,  // 相
    Knight,  // 马
    Rook,    // 车
    Cannon,  // 炮
    Pawn,    // 兵
}

impl ChessType {
    pub fn value(&self) -> i32 {
        match self {
            ChessType::King => 0,
            ChessType::Advisor => 1,
            ChessType::Bishop => 2,
            ChessType::Knight => 3,
            ChessType::Rook => 4,
            ChessType::Cannon => 5,
            ChessType::Pawn => 6,
        }
    }

    pub fn material_value(&self) -> i32 {
        match self {
            ChessType::King => 10000,
            ChessType::Advisor => 200,
            ChessType::Bishop => 200,
            ChessType::Knight => 450,
            ChessType::Rook => 900,
            ChessType::Cannon => 450,
            ChessType::Pawn => 100,
        }
    }

    pub fn fen_char(&self) -> char {
        match self {
            ChessType::King => 'k',
            ChessType::Advisor => 'a',
            ChessType::Bishop => 'b',
            ChessType::Knight => 'n',
            ChessType::Rook => 'r',
            ChessType::Cannon => 'c',
            ChessType::Pawn => 'p',
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Player {
    Red,
    Black,
}

impl Player {
    pub fn value(&self) -> i32 {
        if self == &Player::Red {
            0
        } else {
            1
        }
    }
    pub fn next(&self) -> Player {
        if self == &Player::Red {
            Player::Black
        } else {
            Player::Red
        }
    }
    /// 评估分以红方为正
    pub fn sign(&self) -> i32 {
        if self == &Player::Red {
            1
        } else {
            -1
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }
    pub fn up(&self, delta: i32) -> Self {
        Position::new(self.row - delta, self.col)
    }
    pub fn down(&self, delta: i32) -> Self {
        Position::new(self.row + delta, self.col)
    }
    pub fn left(&self, delta: i32) -> Self {
        Position::new(self.row, self.col - delta)
    }
    pub fn right(&self, delta: i32) -> Self {
        Position::new(self.row, self.col + delta)
    }
    /// 上下镜像（黑方查位置价值表用）
    pub fn mirror(&self) -> Self {
        Position::new(BOARD_HEIGHT - 1 - self.row, self.col)
    }
    pub fn in_board(&self) -> bool {
        in_board(*self)
    }
    pub fn index(&self) -> usize {
        (self.row * BOARD_WIDTH + self.col) as usize
    }
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_HEIGHT).flat_map(|row| (0..BOARD_WIDTH).map(move |col| Position::new(row, col)))
    }
}

impl TryFrom<&str> for Position {
    type Error = EngineError;

    /// ICCS 坐标，例如 "h2"：列 a-i，行 0-9 自红方底线起算
    fn try_from(m: &str) -> Result<Self> {
        let mb = m.as_bytes();
        if mb.len() != 2 || !(b'a'..=b'i').contains(&mb[0]) || !mb[1].is_ascii_digit() {
            return Err(EngineError::InvalidSquare(m.to_owned()));
        }
        Ok(Position::new(
            BOARD_HEIGHT - 1 - (mb[1] - b'0') as i32,
            (mb[0] - b'a') as i32,
        ))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col = (b'a' + self.col as u8) as char;
        write!(f, "{}{}", col, BOARD_HEIGHT - 1 - self.row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub player: Player, // 玩家
    pub from: Position, // 起手位置
    pub to: Position,   // 落子位置
    pub chess: Chess,   // 表面上走的子（暗子按原始位置棋种计）
    pub capture: Chess, // 表面上吃的子
}

impl Move {
    pub fn is_capture(&self) -> bool {
        self.capture != Chess::None
    }
    pub fn with_target(&self, to: Position, capture: Chess) -> Move {
        Move {
            player: self.player,
            from: self.from,
            to,
            chess: self.chess,
            capture,
        }
    }
    /// 解析 "h2e2" 形式的走法，只做坐标解析
    pub fn parse_iccs(m: &str) -> Result<(Position, Position)> {
        if m.len() != 4 || !m.is_ascii() {
            return Err(EngineError::InvalidMove(m.to_owned()));
        }
        let (from_str, to_str) = m.split_at(2);
        Ok((Position::try_from(from_str)?, Position::try_from(to_str)?))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// 局面指纹：两张独立的 Zobrist 表，key 用来寻址，lock 用来校验
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Fingerprint {
    pub key: u64,
    pub lock: u64,
}

impl Fingerprint {
    pub fn with_player(&self, player: Player) -> Fingerprint {
        Fingerprint {
            key: self.key ^ ZOBRIST_TABLE.player(player),
            lock: self.lock ^ ZOBRIST_TABLE_LOCK.player(player),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CapturedPiece {
    pub chess: Chess,
    // 被吃时是否还是暗子，揭棋估值需要区分"已见过"与"未见过"
    pub concealed: bool,
}

/// 一步棋的完整记录，同时也是撤销凭据
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: Position,
    pub to: Position,
    pub chess: Chess,
    pub capture: Chess,
    pub fingerprint: Fingerprint,
    pub prev_fingerprint: Fingerprint,
    pub revealed: bool,
    pub capture_concealed: bool,
    // 走子前 from / to 上的子只在搜索树里翻开过
    pub moved_masked: bool,
    pub capture_masked: bool,
    // 搜索中走动的暗子：落点上仍不可见
    pub masked: bool,
    pub moved_slot: Option<ChessType>,
    pub capture_slot: Option<ChessType>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    // 9×10的棋盘，红方在下，黑方在上
    pub chesses: [[Chess; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
    pub variant: Variant,
    pub concealment: Concealment,
    pub history: Vec<MoveRecord>,
    pub captured_by_red: Vec<CapturedPiece>,
    pub captured_by_black: Vec<CapturedPiece>,
    #[serde(skip)]
    pub zobrist_value: u64,
    #[serde(skip)]
    pub zobrist_value_lock: u64,
}

// 棋子是否在棋盘内
pub fn in_board(pos: Position) -> bool {
    pos.row >= 0 && pos.row < BOARD_HEIGHT && pos.col >= 0 && pos.col < BOARD_WIDTH
}

// 棋子是否在玩家的楚河汉界以内
pub fn in_country(row: i32, player: Player) -> bool {
    let base_row = if player == Player::Red { BOARD_HEIGHT - 1 } else { 0 };
    (row - base_row).abs() < BOARD_HEIGHT / 2
}

// 棋子是否在九宫格内
pub fn in_palace(pos: Position, player: Player) -> bool {
    if player == Player::Black {
        pos.row >= 0 && pos.row < 3 && pos.col >= 3 && pos.col < 6
    } else {
        pos.row >= 7 && pos.row < BOARD_HEIGHT && pos.col >= 3 && pos.col < 6
    }
}

impl Board {
    pub fn empty(variant: Variant) -> Self {
        Board {
            chesses: [[Chess::None; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
            variant,
            concealment: Concealment::default(),
            history: vec![],
            captured_by_red: vec![],
            captured_by_black: vec![],
            zobrist_value: 0,
            zobrist_value_lock: 0,
        }
    }

    // 标准象棋开局局面
    pub fn init() -> Self {
        let mut board = Board::empty(Variant::Standard);
        for pos in Position::all() {
            if let Some(ct) = Concealment::start_slot(pos) {
                board.set_chess(pos, Chess::new(Concealment::infer_side(pos), ct));
            }
        }
        board.refresh_zobrist();
        board
    }

    // 揭棋开局：除将帅外全部暗子，位置随机
    pub fn jieqi(rng: &mut fastrand::Rng) -> Self {
        let (chesses, concealment) = Concealment::deal(rng);
        let mut board = Board::empty(Variant::Jieqi);
        board.chesses = chesses;
        board.concealment = concealment;
        board.refresh_zobrist();
        board
    }

    /// 解析 FEN（只支持标准象棋），返回局面与走棋方
    pub fn from_fen(fen: &str) -> Result<(Self, Player)> {
        let invalid = |reason| EngineError::InvalidFen {
            fen: fen.to_owned(),
            reason,
        };
        let mut board = Board::empty(Variant::Standard);
        let mut parts = fen.split_whitespace();
        let pos = parts.next().ok_or_else(|| invalid("empty"))?;
        let rows: Vec<&str> = pos.split('/').collect();
        if rows.len() != BOARD_HEIGHT as usize {
            return Err(invalid("expected 10 ranks"));
        }
        for (i, row) in rows.iter().enumerate() {
            let mut j = 0;
            for col in row.chars() {
                if let Some(skip) = col.to_digit(10) {
                    j += skip as i32;
                } else {
                    let chess = FEN_MAP.get(&col).ok_or_else(|| invalid("unknown piece"))?;
                    let at = Position::new(i as i32, j);
                    if !at.in_board() {
                        return Err(invalid("rank too long"));
                    }
                    board.set_chess(at, *chess);
                    j += 1;
                }
            }
            if j != BOARD_WIDTH {
                return Err(invalid("rank has wrong width"));
            }
        }
        let turn = match parts.next() {
            Some("b") => Player::Black,
            Some("w") | Some("r") | None => Player::Red,
            Some(_) => return Err(invalid("bad side to move")),
        };
        board.refresh_zobrist();
        Ok((board, turn))
    }

    pub fn to_fen(&self, player: Player) -> String {
        let ranks: Vec<String> = self
            .chesses
            .iter()
            .map(|line| {
                let mut rank = String::new();
                let mut empty = 0;
                for chess in line {
                    match chess.fen_char() {
                        Some(ch) => {
                            if empty > 0 {
                                rank.push_str(&empty.to_string());
                                empty = 0;
                            }
                            rank.push(ch);
                        }
                        None => empty += 1,
                    }
                }
                if empty > 0 {
                    rank.push_str(&empty.to_string());
                }
                rank
            })
            .collect();
        let side = if player == Player::Red { "w" } else { "b" };
        format!("{} {} - - 0 1", ranks.join("/"), side)
    }

    pub fn chess_at(&self, pos: Position) -> Chess {
        if in_board(pos) {
            self.chesses[pos.row as usize][pos.col as usize]
        } else {
            Chess::None
        }
    }

    pub fn piece_at(&self, pos: Position) -> Option<Chess> {
        match self.chess_at(pos) {
            Chess::None => None,
            chess => Some(chess),
        }
    }

    pub fn set_chess(&mut self, pos: Position, chess: Chess) {
        self.chesses[pos.row as usize][pos.col as usize] = chess;
    }

    /// 真实对局中仍是暗子
    pub fn is_concealed(&self, pos: Position) -> bool {
        self.concealment.is_hidden(pos)
    }

    /// 搜索视角下身份未知：暗子，或只在搜索树里走动过的暗子
    pub fn is_veiled(&self, pos: Position) -> bool {
        self.concealment.is_veiled(pos)
    }

    /// 对手（以及搜索）能看到的棋子：颜色公开，暗子的棋种按原始位置呈现
    pub fn apparent_chess_at(&self, pos: Position) -> Chess {
        let chess = self.chess_at(pos);
        if self.concealment.is_veiled(pos) {
            if let (Some(player), Some(slot)) = (chess.player(), self.concealment.slot_role(pos)) {
                return Chess::new(player, slot);
            }
        }
        chess
    }

    pub fn side_of(&self, pos: Position) -> Option<Player> {
        self.apparent_chess_at(pos).player()
    }

    /// 决定走法规则的棋种
    pub fn rule_role(&self, pos: Position) -> Option<ChessType> {
        self.apparent_chess_at(pos).chess_type()
    }

    pub fn captured(&self, player: Player) -> &[CapturedPiece] {
        match player {
            Player::Red => &self.captured_by_red,
            Player::Black => &self.captured_by_black,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            key: self.zobrist_value,
            lock: self.zobrist_value_lock,
        }
    }

    /// 以表面局面计算的指纹（开局库键），暗子不会泄露身份
    pub fn apparent_fingerprint(&self, player: Player) -> Fingerprint {
        let mut apparent = self.chesses;
        for pos in Position::all().filter(|pos| self.is_veiled(*pos)) {
            apparent[pos.row as usize][pos.col as usize] = self.apparent_chess_at(pos);
        }
        Fingerprint {
            key: ZOBRIST_TABLE.calc_chesses(&apparent, player),
            lock: ZOBRIST_TABLE_LOCK.calc_chesses(&apparent, player),
        }
    }

    fn calc_full(&self, table: &Zobristable) -> u64 {
        let mut value = table.calc_chesses(&self.chesses, Player::Red);
        for pos in Position::all() {
            if self.concealment.is_veiled(pos) {
                value ^= table.concealed(pos);
            }
            if let Some(slot) = self.concealment.slot_role(pos) {
                value ^= table.slot(slot, pos);
            }
        }
        value
    }

    /// 全量重算指纹（初始化、恢复存档时使用）
    pub fn refresh_zobrist(&mut self) {
        self.zobrist_value = self.calc_full(&ZOBRIST_TABLE);
        self.zobrist_value_lock = self.calc_full(&ZOBRIST_TABLE_LOCK);
    }

    fn zobrist_delta(table: &Zobristable, r: &MoveRecord) -> u64 {
        let mut delta = table.chess(r.chess, r.from) ^ table.chess(r.chess, r.to) ^ table.chess(r.capture, r.to);
        if r.revealed || r.moved_masked {
            delta ^= table.concealed(r.from);
        }
        if r.masked {
            delta ^= table.concealed(r.to);
        }
        if r.capture_concealed || r.capture_masked {
            delta ^= table.concealed(r.to);
        }
        if let Some(slot) = r.moved_slot {
            delta ^= table.slot(slot, r.from) ^ table.slot(slot, r.to);
        }
        if let Some(slot) = r.capture_slot {
            delta ^= table.slot(slot, r.to);
        }
        delta
    }

    // 应用走子到棋盘，不写对局历史；暗子走动即翻开
    // 调用方保证 from 上有子
    pub fn make_move(&mut self, from: Position, to: Position) -> MoveRecord {
        self.make_move_inner(from, to, false)
    }

    // in_search 时暗子走动后仍然蒙着，直到真实对局里走出这一步
    fn make_move_inner(&mut self, from: Position, to: Position, in_search: bool) -> MoveRecord {
        let chess = self.chess_at(from);
        let capture = self.chess_at(to);
        let revealed = self.concealment.is_hidden(from);
        let moved_masked = self.concealment.is_masked(from);
        let mut record = MoveRecord {
            from,
            to,
            chess,
            capture,
            fingerprint: Fingerprint::default(),
            prev_fingerprint: self.fingerprint(),
            revealed,
            capture_concealed: self.concealment.is_hidden(to),
            moved_masked,
            capture_masked: self.concealment.is_masked(to),
            masked: in_search && (revealed || moved_masked),
            moved_slot: self.concealment.slot_role(from),
            capture_slot: self.concealment.slot_role(to),
        };

        // 被吃的子连同它的暗子信息一起离场
        self.concealment.clear(to);
        self.concealment.clear(from);
        if record.masked {
            self.concealment.set_masked(to, record.moved_slot);
        } else if record.moved_slot.is_some() {
            // 原始位置棋种跟着棋子走
            self.concealment.set(to, false, record.moved_slot);
        }

        if let Some(player) = capture.player() {
            let piece = CapturedPiece {
                chess: capture,
                concealed: record.capture_concealed || record.capture_masked,
            };
            match player.next() {
                Player::Red => self.captured_by_red.push(piece),
                Player::Black => self.captured_by_black.push(piece),
            }
        }

        self.set_chess(from, Chess::None);
        self.set_chess(to, chess);
        self.zobrist_value ^= Board::zobrist_delta(&ZOBRIST_TABLE, &record);
        self.zobrist_value_lock ^= Board::zobrist_delta(&ZOBRIST_TABLE_LOCK, &record);
        record.fingerprint = self.fingerprint();
        record
    }

    // 撤销 make_move，record 必须是最近一次 make_move 的返回值
    pub fn unmake_move(&mut self, record: &MoveRecord) {
        self.set_chess(record.from, record.chess);
        self.set_chess(record.to, record.capture);

        self.concealment.clear(record.to);
        if record.moved_masked {
            self.concealment.set_masked(record.from, record.moved_slot);
        } else if record.moved_slot.is_some() {
            self.concealment.set(record.from, record.revealed, record.moved_slot);
        }
        if record.capture_masked {
            self.concealment.set_masked(record.to, record.capture_slot);
        } else if record.capture_concealed || record.capture_slot.is_some() {
            self.concealment.set(record.to, record.capture_concealed, record.capture_slot);
        }

        if let Some(player) = record.capture.player() {
            match player.next() {
                Player::Red => self.captured_by_red.pop(),
                Player::Black => self.captured_by_black.pop(),
            };
        }

        self.zobrist_value = record.prev_fingerprint.key;
        self.zobrist_value_lock = record.prev_fingerprint.lock;
    }

    /// 作用域内的临时走子（搜索、合法性模拟），drop 时自动撤销
    pub fn apply(&mut self, from: Position, to: Position) -> ScopedMove<'_> {
        let record = self.make_move_inner(from, to, true);
        ScopedMove { board: self, record }
    }

    // 执行走子并写入对局历史（用于实际对局）
    pub fn move_piece(&mut self, from: Position, to: Position) -> Option<MoveRecord> {
        if !from.in_board() || !to.in_board() || from == to || self.chess_at(from) == Chess::None {
            return None;
        }
        let record = self.make_move(from, to);
        self.history.push(record);
        Some(record)
    }

    pub fn undo(&mut self) -> Option<MoveRecord> {
        let record = self.history.pop()?;
        self.unmake_move(&record);
        Some(record)
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.history.last()
    }

    pub fn king_position(&self, player: Player) -> Option<Position> {
        let king = Chess::new(player, ChessType::King);
        let rows = if player == Player::Black { 0..3 } else { 7..BOARD_HEIGHT };
        for i in rows {
            for j in 3..6 {
                if self.chess_at(Position::new(i, j)) == king {
                    return Some(Position::new(i, j));
                }
            }
        }
        None
    }
}

pub struct ScopedMove<'a> {
    board: &'a mut Board,
    record: MoveRecord,
}

impl ScopedMove<'_> {
    pub fn record(&self) -> &MoveRecord {
        &self.record
    }
}

impl Deref for ScopedMove<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl DerefMut for ScopedMove<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl Drop for ScopedMove<'_> {
    fn drop(&mut self) {
        self.board.unmake_move(&self.record);
    }
}

#[cfg(test)]
mod tests {
    use crate::board::*;

    #[test]
    fn test_init_layout() {
        let board = Board::init();
        assert_eq!(board.chess_at(Position::new(0, 4)), Chess::Black(ChessType::King));
        assert_eq!(board.chess_at(Position::new(7, 1)), Chess::Red(ChessType::Cannon));
        assert_eq!(board.chess_at(Position::new(3, 8)), Chess::Black(ChessType::Pawn));
        assert_eq!(board.chesses.iter().flatten().filter(|c| **c != Chess::None).count(), 32);
        assert_eq!(board.to_fen(Player::Red), START_FEN);
    }

    #[test]
    fn test_piece_at_out_of_range() {
        let board = Board::init();
        assert_eq!(board.piece_at(Position::new(-1, 0)), None);
        assert_eq!(board.piece_at(Position::new(10, 0)), None);
        assert_eq!(board.piece_at(Position::new(0, 9)), None);
        assert_eq!(board.piece_at(Position::new(4, 4)), None);
        assert_eq!(board.piece_at(Position::new(9, 0)), Some(Chess::Red(ChessType::Rook)));
    }

    #[test]
    fn test_from_fen() {
        let (board, turn) = Board::from_fen("4k4/9/9/9/9/9/9/4p4/9/5K3 b - - 0 1").unwrap();
        assert_eq!(turn, Player::Black);
        assert_eq!(board.chess_at(Position::new(7, 4)), Chess::Black(ChessType::Pawn));
        assert_eq!(board.chess_at(Position::new(9, 5)), Chess::Red(ChessType::King));
        assert_eq!(board.fingerprint(), Board::from_fen(&board.to_fen(turn)).unwrap().0.fingerprint());

        assert!(Board::from_fen("4k4/9/9 w").is_err());
        assert!(Board::from_fen("4x4/9/9/9/9/9/9/9/9/4K4 w").is_err());
        assert!(Board::from_fen("4k5/9/9/9/9/9/9/9/9/4K4 w").is_err());
    }

    #[test]
    fn test_iccs() {
        let (from, to) = Move::parse_iccs("h2e2").unwrap();
        assert_eq!(from, Position::new(7, 7));
        assert_eq!(to, Position::new(7, 4));
        assert_eq!(from.to_string(), "h2");
        assert!(Move::parse_iccs("z2e2").is_err());
        assert!(Move::parse_iccs("h2e").is_err());
    }

    #[test]
    fn test_move_and_undo_with_capture() {
        let mut board = Board::init();
        let before = board.clone();
        // 红炮打马
        let record = board.move_piece(Position::new(7, 1), Position::new(0, 1)).unwrap();
        assert_eq!(record.capture, Chess::Black(ChessType::Knight));
        assert_eq!(board.captured_by_red.len(), 1);
        assert_eq!(board.history.len(), 1);
        assert_ne!(board.fingerprint(), before.fingerprint());
        assert_eq!(record.fingerprint, board.fingerprint());

        let undone = board.undo().unwrap();
        assert_eq!(undone, record);
        assert_eq!(board, before);
        assert_eq!(board.fingerprint(), before.fingerprint());
        assert!(board.undo().is_none());
    }

    #[test]
    fn test_incremental_fingerprint_matches_full() {
        let mut board = Board::jieqi(&mut fastrand::Rng::with_seed(11));
        board.move_piece(Position::new(6, 0), Position::new(5, 0)).unwrap();
        board.move_piece(Position::new(3, 0), Position::new(4, 0)).unwrap();
        board.move_piece(Position::new(5, 0), Position::new(4, 0)).unwrap();
        let incremental = board.fingerprint();
        board.refresh_zobrist();
        assert_eq!(incremental, board.fingerprint());
    }

    #[test]
    fn test_jieqi_move_and_undo_round_trip() {
        let mut board = Board::jieqi(&mut fastrand::Rng::with_seed(5));
        let before = board.clone();
        let slot = board.concealment.slot_role(Position::new(6, 4));

        board.move_piece(Position::new(6, 4), Position::new(5, 4)).unwrap();
        assert!(!board.is_concealed(Position::new(5, 4)));
        assert_eq!(board.concealment.slot_role(Position::new(5, 4)), slot);
        assert_eq!(board.concealment.slot_role(Position::new(6, 4)), None);

        board.move_piece(Position::new(3, 4), Position::new(4, 4)).unwrap();
        // 吃掉一个已翻开的子
        board.move_piece(Position::new(4, 4), Position::new(5, 4)).unwrap();
        assert_eq!(board.captured_by_black.len(), 1);
        assert!(!board.captured_by_black[0].concealed);

        while board.undo().is_some() {}
        assert_eq!(board, before);
        assert_eq!(board.fingerprint(), before.fingerprint());
    }

    #[test]
    fn test_capture_concealed_marker() {
        let (chesses, concealment) = Concealment::deal(&mut fastrand::Rng::with_seed(8));
        let mut board = Board::empty(Variant::Jieqi);
        board.chesses = chesses;
        board.concealment = concealment;
        // 黑车贴在红方暗兵前面
        board.set_chess(Position::new(5, 4), Chess::Black(ChessType::Rook));
        board.refresh_zobrist();
        let before = board.clone();

        let record = board.move_piece(Position::new(5, 4), Position::new(6, 4)).unwrap();
        assert!(record.capture_concealed);
        assert_eq!(record.capture_slot, Some(ChessType::Pawn));
        assert!(board.captured_by_black[0].concealed);
        assert!(!board.is_concealed(Position::new(6, 4)));

        board.undo();
        assert_eq!(board, before);
        assert!(board.is_concealed(Position::new(6, 4)));
    }

    #[test]
    fn test_search_move_keeps_piece_veiled() {
        let mut board = Board::jieqi(&mut fastrand::Rng::with_seed(5));
        let before = board.clone();
        let from = Position::new(6, 4);
        let to = Position::new(5, 4);
        let truth = board.chess_at(from);
        {
            let mut scoped = board.apply(from, to);
            assert!(scoped.record().masked);
            assert!(!scoped.is_concealed(to));
            assert!(scoped.is_veiled(to));
            assert_eq!(scoped.chess_at(to), truth);
            assert_eq!(scoped.apparent_chess_at(to), Chess::Red(ChessType::Pawn));
            {
                // 再走一步依旧蒙着
                let again = scoped.apply(to, Position::new(4, 4));
                assert!(again.record().moved_masked);
                assert!(again.is_veiled(Position::new(4, 4)));
                assert_eq!(again.apparent_chess_at(Position::new(4, 4)), Chess::Red(ChessType::Pawn));
            }
            let mut full = (*scoped).clone();
            full.refresh_zobrist();
            assert_eq!(full.fingerprint(), scoped.fingerprint());
        }
        assert_eq!(board, before);

        // 真实走子才翻开
        let record = board.move_piece(from, to).unwrap();
        assert!(record.revealed && !record.masked);
        assert!(!board.is_veiled(to));
        assert_eq!(board.apparent_chess_at(to), truth);
    }

    #[test]
    fn test_scoped_move_reverts() {
        let mut board = Board::init();
        let before = board.clone();
        {
            let scoped = board.apply(Position::new(9, 0), Position::new(8, 0));
            assert_eq!(scoped.chess_at(Position::new(8, 0)), Chess::Red(ChessType::Rook));
            assert_eq!(scoped.record().chess, Chess::Red(ChessType::Rook));
        }
        assert_eq!(board, before);
    }
}
