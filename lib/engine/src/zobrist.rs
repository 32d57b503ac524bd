/*
 * Zobrist 哈希：局面指纹
 *
 * - 棋子：[走棋方][棋种][格子]
 * - 揭棋额外两组：暗子标记 [格子]，以及原始位置棋种 [棋种][格子]
 * - 走棋方只在置换表与开局库的键里异或进去，对局历史里的指纹与走棋方无关
 */
use crate::board::{Chess, ChessType, Player, Position, BOARD_HEIGHT, BOARD_WIDTH};

const SQUARES: usize = (BOARD_WIDTH * BOARD_HEIGHT) as usize;

#[derive(Debug)]
pub struct Zobristable {
    chesses: [[[u64; SQUARES]; 7]; 2],
    concealed: [u64; SQUARES],
    slots: [[u64; SQUARES]; 7],
    player: u64,
}

impl Zobristable {
    /// 固定种子生成，保证同一进程内外的指纹一致
    pub fn new(seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut chesses = [[[0u64; SQUARES]; 7]; 2];
        for side in chesses.iter_mut() {
            for kind in side.iter_mut() {
                for key in kind.iter_mut() {
                    *key = rng.u64(..);
                }
            }
        }
        let mut concealed = [0u64; SQUARES];
        for key in concealed.iter_mut() {
            *key = rng.u64(..);
        }
        let mut slots = [[0u64; SQUARES]; 7];
        for kind in slots.iter_mut() {
            for key in kind.iter_mut() {
                *key = rng.u64(..);
            }
        }
        Zobristable {
            chesses,
            concealed,
            slots,
            player: rng.u64(..),
        }
    }

    pub fn chess(&self, chess: Chess, pos: Position) -> u64 {
        match (chess.player(), chess.chess_type()) {
            (Some(player), Some(ct)) => self.chesses[player.value() as usize][ct.value() as usize][pos.index()],
            _ => 0,
        }
    }

    pub fn concealed(&self, pos: Position) -> u64 {
        self.concealed[pos.index()]
    }

    pub fn slot(&self, ct: ChessType, pos: Position) -> u64 {
        self.slots[ct.value() as usize][pos.index()]
    }

    pub fn player(&self, player: Player) -> u64 {
        if player == Player::Black {
            self.player
        } else {
            0
        }
    }

    /// 只看棋子摆放，再叠加走棋方（开局库用）
    pub fn calc_chesses(&self, chesses: &[[Chess; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize], player: Player) -> u64 {
        let mut value = 0;
        for (row, line) in chesses.iter().enumerate() {
            for (col, chess) in line.iter().enumerate() {
                value ^= self.chess(*chess, Position::new(row as i32, col as i32));
            }
        }
        value ^ self.player(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn test_deterministic() {
        let a = Zobristable::new(7);
        let b = Zobristable::new(7);
        let board = Board::init();
        assert_eq!(
            a.calc_chesses(&board.chesses, Player::Red),
            b.calc_chesses(&board.chesses, Player::Red)
        );
    }

    #[test]
    fn test_player_matters() {
        let table = Zobristable::new(7);
        let board = Board::init();
        assert_ne!(
            table.calc_chesses(&board.chesses, Player::Red),
            table.calc_chesses(&board.chesses, Player::Black)
        );
    }
}
