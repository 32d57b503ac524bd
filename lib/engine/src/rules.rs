/*
 * 走子规则
 *
 * - 几何规则：按棋种判断 from -> to 是否符合走法（蹩马腿、塞象眼、炮架等）
 * - 完整合法性：几何规则 + 不吃己方 + 模拟走子后不能对脸、不能自将、不能第三次重复局面
 * - 暗子（包括只在搜索树里走动过的）按原始位置棋种走子，并受标准规则约束
 * - 揭棋中翻开后的相（象）可以过河，士可以出九宫；将帅始终不出九宫
 */
use serde::{Deserialize, Serialize};

use crate::board::*;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    Standard,
    Jieqi,
}

impl Variant {
    // 相（象）能否过河
    pub fn elephant_crosses_river(&self, concealed: bool) -> bool {
        *self == Variant::Jieqi && !concealed
    }

    // 士能否离开九宫
    pub fn advisor_leaves_palace(&self, concealed: bool) -> bool {
        *self == Variant::Jieqi && !concealed
    }
}

// 局面在对局历史中出现到第几次就禁止
const REPETITION_LIMIT: usize = 3;

impl Board {
    pub fn has_chess_between(&self, posa: Position, posb: Position) -> bool {
        self.count_chess_between(posa, posb) > 0
    }

    pub fn count_chess_between(&self, posa: Position, posb: Position) -> i32 {
        let mut count = 0;
        if posa.row == posb.row {
            for j in posa.col.min(posb.col) + 1..posb.col.max(posa.col) {
                if self.chess_at(Position::new(posa.row, j)) != Chess::None {
                    count += 1;
                }
            }
        } else if posa.col == posb.col {
            for i in posa.row.min(posb.row) + 1..posb.row.max(posa.row) {
                if self.chess_at(Position::new(i, posa.col)) != Chess::None {
                    count += 1;
                }
            }
        }
        count
    }

    // 将帅对脸
    pub fn king_eye_to_eye(&self) -> bool {
        let (Some(posa), Some(posb)) = (self.king_position(Player::Red), self.king_position(Player::Black)) else {
            return false;
        };
        posa.col == posb.col && !self.has_chess_between(posa, posb)
    }

    /// 只看几何走法：棋种规则 + 不吃己方子，不考虑将军
    pub fn is_geometric_move(&self, from: Position, to: Position) -> bool {
        if !in_board(from) || !in_board(to) || from == to {
            return false;
        }
        let (Some(side), Some(ct)) = (self.side_of(from), self.rule_role(from)) else {
            return false;
        };
        if self.side_of(to) == Some(side) {
            return false;
        }
        self.is_move_valid_for_chess_type(ct, side, from, to)
    }

    fn is_move_valid_for_chess_type(&self, ct: ChessType, side: Player, from: Position, to: Position) -> bool {
        let concealed = self.is_veiled(from);
        let row_diff = (from.row - to.row).abs();
        let col_diff = (from.col - to.col).abs();
        match ct {
            ChessType::King => row_diff + col_diff == 1 && in_palace(to, side),
            ChessType::Advisor => {
                row_diff == 1
                    && col_diff == 1
                    && (self.variant.advisor_leaves_palace(concealed) || in_palace(to, side))
            }
            ChessType::Bishop => {
                row_diff == 2
                    && col_diff == 2
                    && (self.variant.elephant_crosses_river(concealed) || in_country(to.row, side))
                    && self.chess_at(Position::new((from.row + to.row) / 2, (from.col + to.col) / 2)) == Chess::None
            }
            ChessType::Knight => {
                if row_diff == 2 && col_diff == 1 {
                    // 竖着跳，马腿在纵向
                    self.chess_at(Position::new((from.row + to.row) / 2, from.col)) == Chess::None
                } else if row_diff == 1 && col_diff == 2 {
                    self.chess_at(Position::new(from.row, (from.col + to.col) / 2)) == Chess::None
                } else {
                    false
                }
            }
            ChessType::Rook => (row_diff == 0 || col_diff == 0) && self.count_chess_between(from, to) == 0,
            ChessType::Cannon => {
                if row_diff != 0 && col_diff != 0 {
                    return false;
                }
                if self.chess_at(to) == Chess::None {
                    self.count_chess_between(from, to) == 0
                } else {
                    // 吃子必须隔一个炮架
                    self.count_chess_between(from, to) == 1
                }
            }
            ChessType::Pawn => {
                let forward = if side == Player::Red { -1 } else { 1 };
                if to.row - from.row == forward && col_diff == 0 {
                    true
                } else {
                    // 过河兵可以横走，永远不能后退
                    !in_country(from.row, side) && row_diff == 0 && col_diff == 1
                }
            }
        }
    }

    /// 对方是否有子能按几何规则走到 player 的将帅上；没有将帅视为被将
    pub fn is_checked(&self, player: Player) -> bool {
        let Some(king) = self.king_position(player) else {
            return true;
        };
        let enemy = player.next();
        Position::all().any(|pos| self.side_of(pos) == Some(enemy) && self.is_geometric_move(pos, king))
    }

    /// 当前局面（历史里的最后一步走完之后）在真实对局中第几次出现，达到上限即违规
    pub fn would_repeat(&self) -> bool {
        let fingerprint = self.fingerprint();
        let seen = self.history.iter().filter(|r| r.fingerprint == fingerprint).count();
        1 + seen >= REPETITION_LIMIT
    }

    /// 完整合法性判断，在当前棋盘上模拟走子后自动撤销
    pub fn is_valid_move(&mut self, from: Position, to: Position) -> bool {
        if !self.is_geometric_move(from, to) {
            return false;
        }
        let Some(side) = self.side_of(from) else {
            return false;
        };
        let scoped = self.apply(from, to);
        !(scoped.king_eye_to_eye() || scoped.is_checked(side) || scoped.would_repeat())
    }

    // 按棋种生成候选落点（不保证合法，调用方再过滤）
    pub fn generate_move_for_chess_type(&self, ct: ChessType, side: Player, position_base: Position) -> Vec<Position> {
        let mut targets = vec![];
        match ct {
            ChessType::King => {
                targets.append(&mut vec![
                    position_base.up(1),
                    position_base.down(1),
                    position_base.left(1),
                    position_base.right(1),
                ]);
            }
            ChessType::Advisor => {
                targets.append(&mut vec![
                    position_base.up(1).left(1),
                    position_base.up(1).right(1),
                    position_base.down(1).left(1),
                    position_base.down(1).right(1),
                ]);
            }
            ChessType::Bishop => {
                targets.append(&mut vec![
                    position_base.up(2).left(2),
                    position_base.up(2).right(2),
                    position_base.down(2).left(2),
                    position_base.down(2).right(2),
                ]);
            }
            ChessType::Knight => {
                targets.append(&mut vec![
                    position_base.up(2).left(1),
                    position_base.up(2).right(1),
                    position_base.down(2).left(1),
                    position_base.down(2).right(1),
                    position_base.up(1).left(2),
                    position_base.down(1).left(2),
                    position_base.up(1).right(2),
                    position_base.down(1).right(2),
                ]);
            }
            ChessType::Rook | ChessType::Cannon => {
                let rays: [fn(&Position, i32) -> Position; 4] =
                    [Position::up, Position::down, Position::left, Position::right];
                for step in rays {
                    let mut has_chess = false;
                    for delta in 1.. {
                        let target = step(&position_base, delta);
                        if !in_board(target) {
                            break;
                        }
                        let occupied = self.chess_at(target) != Chess::None;
                        if ct == ChessType::Rook {
                            targets.push(target);
                            if occupied {
                                break;
                            }
                        } else if !has_chess {
                            if occupied {
                                has_chess = true;
                            } else {
                                targets.push(target);
                            }
                        } else if occupied {
                            targets.push(target);
                            break;
                        }
                    }
                }
            }
            ChessType::Pawn => {
                // 过河兵可以左右走
                if !in_country(position_base.row, side) {
                    targets.push(position_base.left(1));
                    targets.push(position_base.right(1));
                }
                if side == Player::Black {
                    targets.push(position_base.down(1))
                } else {
                    targets.push(position_base.up(1));
                }
            }
        }
        targets
    }

    // 生成 player 的所有合法走子
    // capture_only: 只生成吃子走法（静态搜索用）
    pub fn generate_moves(&mut self, player: Player, capture_only: bool) -> Vec<Move> {
        let mut candidates = vec![];
        for position_base in Position::all() {
            if self.side_of(position_base) != Some(player) {
                continue;
            }
            let Some(ct) = self.rule_role(position_base) else {
                continue;
            };
            let move_base = Move {
                player,
                from: position_base,
                to: position_base,
                chess: self.apparent_chess_at(position_base),
                capture: Chess::None,
            };
            for target in self.generate_move_for_chess_type(ct, player, position_base) {
                if capture_only && self.chess_at(target) == Chess::None {
                    continue;
                }
                if self.is_geometric_move(position_base, target) {
                    candidates.push(move_base.with_target(target, self.apparent_chess_at(target)));
                }
            }
        }
        candidates.retain(|m| self.is_valid_move(m.from, m.to));
        candidates
    }

    pub fn legal_moves(&mut self, player: Player) -> Vec<Move> {
        self.generate_moves(player, false)
    }
}
