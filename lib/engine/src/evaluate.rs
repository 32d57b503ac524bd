/*
 * 局面评估
 *
 * 分数以红方为正：红方子力 + 位置分 减去 黑方子力 + 位置分。
 * 位置价值表按红方视角书写（第 0 行是对方底线），黑方查表时上下镜像。
 *
 * 暗子一律按期望价值计分：该方尚未见过的棋子的平均子力
 * + 原始位置棋种子力的一小部分 + 原始位置棋种的位置分。
 * 增强评估额外计算活动性、将帅安全、子力配合、控制中心四项，只用表面信息。
 */
use serde::{Deserialize, Serialize};

use crate::board::*;
use crate::concealment::JIEQI_POOL;

type Table = [[i32; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];

const KING_VALUE_TABLE: Table = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 1, 1, 1, 0, 0, 0],
    [0, 0, 0, 2, 2, 2, 0, 0, 0],
    [0, 0, 0, 11, 15, 11, 0, 0, 0],
];

const ADVISOR_VALUE_TABLE: Table = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 2, 0, 2, 0, 0, 0],
    [0, 0, 0, 0, 3, 0, 0, 0, 0],
    [0, 0, 0, 2, 0, 2, 0, 0, 0],
];

const BISHOP_VALUE_TABLE: Table = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 2, 0, 0, 0, 2, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 0, 0, 0, 3, 0, 0, 0, 1],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 2, 0, 0, 0, 2, 0, 0],
];

const ROOK_VALUE_TABLE: Table = [
    [10, 10, 10, 10, 10, 10, 10, 10, 10],
    [10, 20, 20, 20, 20, 20, 20, 20, 10],
    [5, 10, 10, 10, 10, 10, 10, 10, 5],
    [5, 10, 10, 10, 10, 10, 10, 10, 5],
    [5, 10, 10, 10, 10, 10, 10, 10, 5],
    [5, 10, 10, 10, 10, 10, 10, 10, 5],
    [0, 5, 5, 5, 5, 5, 5, 5, 0],
    [0, 5, 5, 5, 5, 5, 5, 5, 0],
    [0, 5, 5, 5, 5, 5, 5, 5, 0],
    [-5, 5, 5, 5, 5, 5, 5, 5, -5],
];

const KNIGHT_VALUE_TABLE: Table = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [5, 15, 15, 15, 15, 15, 15, 15, 5],
    [5, 10, 20, 20, 20, 20, 20, 10, 5],
    [5, 5, 15, 20, 20, 20, 15, 5, 5],
    [5, 5, 10, 15, 15, 15, 10, 5, 5],
    [5, 5, 10, 15, 15, 15, 10, 5, 5],
    [0, 5, 5, 5, 5, 5, 5, 5, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

const CANNON_VALUE_TABLE: Table = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [10, 10, 10, 10, 10, 10, 10, 10, 10],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

const PAWN_VALUE_TABLE: Table = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [30, 40, 50, 60, 70, 60, 50, 40, 30],
    [20, 30, 40, 50, 60, 50, 40, 30, 20],
    [20, 20, 20, 20, 20, 20, 20, 20, 20],
    [10, 10, 20, 30, 40, 30, 20, 10, 10],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

// 中心区域：第 4、5 行 x 第 3-5 列
const CENTER_ROWS: [i32; 2] = [4, 5];
const CENTER_COLS: [i32; 3] = [3, 4, 5];

// 棋种在特定位置的位置分
pub fn position_value(ct: ChessType, pos: Position, player: Player) -> i32 {
    let pos = if player == Player::Black { pos.mirror() } else { pos };
    let (row, col) = (pos.row as usize, pos.col as usize);
    match ct {
        ChessType::King => KING_VALUE_TABLE[row][col],
        ChessType::Advisor => ADVISOR_VALUE_TABLE[row][col],
        ChessType::Bishop => BISHOP_VALUE_TABLE[row][col],
        ChessType::Knight => KNIGHT_VALUE_TABLE[row][col],
        ChessType::Rook => ROOK_VALUE_TABLE[row][col],
        ChessType::Cannon => CANNON_VALUE_TABLE[row][col],
        ChessType::Pawn => PAWN_VALUE_TABLE[row][col],
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum EvaluatorKind {
    #[default]
    Basic,
    Extended,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct EvalWeights {
    pub mobility: f32,
    pub king_safety: f32,
    pub coordination: f32,
    pub center: f32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        EvalWeights {
            mobility: 0.3,
            king_safety: 0.5,
            coordination: 0.4,
            center: 0.2,
        }
    }
}

// 暗子期望价值里，原始位置棋种子力所占的比例
pub const DEFAULT_CONCEALED_BONUS: f32 = 0.1;

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Evaluator {
    pub kind: EvaluatorKind,
    pub weights: EvalWeights,
    pub concealed_bonus: f32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new(EvaluatorKind::Basic, EvalWeights::default(), DEFAULT_CONCEALED_BONUS)
    }
}

impl Evaluator {
    pub fn new(kind: EvaluatorKind, weights: EvalWeights, concealed_bonus: f32) -> Self {
        Evaluator {
            kind,
            weights,
            concealed_bonus,
        }
    }

    /// 红方为正的局面分
    pub fn evaluate(&self, board: &mut Board) -> i32 {
        let base = self.material(board);
        match self.kind {
            EvaluatorKind::Basic => base,
            EvaluatorKind::Extended => base + self.extended(board),
        }
    }

    /// 从 player 视角的局面分，负极大值搜索使用
    pub fn evaluate_for(&self, board: &mut Board, player: Player) -> i32 {
        self.evaluate(board) * player.sign()
    }

    // 子力 + 位置分，暗子按期望价值
    pub fn material(&self, board: &Board) -> i32 {
        let expected = [
            Evaluator::expected_concealed_value(board, Player::Red),
            Evaluator::expected_concealed_value(board, Player::Black),
        ];
        let mut score = 0;
        for pos in Position::all() {
            let value = if board.is_veiled(pos) {
                let Some(slot) = board.concealment.slot_role(pos) else {
                    continue;
                };
                let side = board.side_of(pos).unwrap_or(Player::Red);
                let bonus = (self.concealed_bonus * slot.material_value() as f32).round() as i32;
                side.sign() * (expected[side.value() as usize] + bonus + position_value(slot, pos, side))
            } else {
                let chess = board.chess_at(pos);
                let (Some(player), Some(ct)) = (chess.player(), chess.chess_type()) else {
                    continue;
                };
                player.sign() * (ct.material_value() + position_value(ct, pos, player))
            };
            score += value;
        }
        score
    }

    /// 某一方暗子的期望子力：该方 15 个非将帅棋子中还没被看到的那些的平均值。
    /// 看到包括：在棋盘上已经翻开的，以及翻开后被吃掉的；暗着被吃的仍算没见过。
    pub fn expected_concealed_value(board: &Board, side: Player) -> i32 {
        let mut unseen: Vec<ChessType> = JIEQI_POOL.to_vec();
        let on_board = Position::all()
            .filter(|pos| !board.is_veiled(*pos))
            .map(|pos| board.chess_at(pos));
        let captured = board
            .captured(side.next())
            .iter()
            .filter(|p| !p.concealed)
            .map(|p| p.chess);
        for chess in on_board.chain(captured) {
            if !chess.belong_to(side) {
                continue;
            }
            if let Some(idx) = chess.chess_type().and_then(|ct| unseen.iter().position(|u| *u == ct)) {
                unseen.swap_remove(idx);
            }
        }
        if unseen.is_empty() {
            return 0;
        }
        unseen.iter().map(|ct| ct.material_value()).sum::<i32>() / unseen.len() as i32
    }

    fn extended(&self, board: &mut Board) -> i32 {
        let red_moves = board.legal_moves(Player::Red);
        let black_moves = board.legal_moves(Player::Black);

        let mobility = red_moves.len() as f32 - black_moves.len() as f32;
        let king_safety = (king_safety(board, Player::Red, &red_moves) - king_safety(board, Player::Black, &black_moves)) as f32;
        let coordination = (coordination(board, Player::Red) - coordination(board, Player::Black)) as f32;
        let center = (center_control(board, Player::Red, &red_moves) - center_control(board, Player::Black, &black_moves)) as f32;

        let w = &self.weights;
        (mobility * w.mobility + king_safety * w.king_safety + coordination * w.coordination + center * w.center).round()
            as i32
    }
}

fn king_safety(board: &Board, player: Player, moves: &[Move]) -> i32 {
    let Some(king) = board.king_position(player) else {
        return -1000;
    };
    let mut safety = 0;
    for pos in [king.up(1), king.down(1), king.left(1), king.right(1)] {
        if board.side_of(pos) == Some(player) {
            safety += 10;
        }
    }
    if board.is_checked(player) {
        safety -= 50;
    }
    // 将帅活动空间
    safety += 5 * moves.iter().filter(|m| m.from == king).count() as i32;
    safety
}

fn coordination(board: &Board, player: Player) -> i32 {
    let mut counts = [0; 7];
    let mut crossed_pawns = 0;
    for pos in Position::all() {
        if board.side_of(pos) != Some(player) {
            continue;
        }
        if let Some(ct) = board.rule_role(pos) {
            counts[ct.value() as usize] += 1;
            if ct == ChessType::Pawn && !in_country(pos.row, player) {
                crossed_pawns += 1;
            }
        }
    }
    let rooks = counts[ChessType::Rook.value() as usize];
    let cannons = counts[ChessType::Cannon.value() as usize];
    let knights = counts[ChessType::Knight.value() as usize];

    let mut score = 5 * crossed_pawns;
    if rooks >= 2 {
        score += 20;
    }
    if cannons >= 2 {
        score += 15;
    }
    if rooks > 0 && knights > 0 {
        score += 10;
    }
    score
}

fn center_control(board: &Board, player: Player, moves: &[Move]) -> i32 {
    let mut control = 0;
    for row in CENTER_ROWS {
        for col in CENTER_COLS {
            let pos = Position::new(row, col);
            match board.side_of(pos) {
                Some(side) if side == player => control += 10,
                Some(_) => control -= 10,
                None => {}
            }
            if moves.iter().any(|m| m.to == pos) {
                control += 5;
            }
        }
    }
    control
}
