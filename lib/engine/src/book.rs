/*
 * 开局库
 *
 * 每行格式：`<走法> <权重> <FEN>`，例如
 *   h2e2 120 rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1
 * 按局面指纹（含走棋方）排序，同一局面的所有行组成候选列表。
 * 库里的走法不可信，使用前由引擎重新校验。
 */
use tracing::warn;

use crate::board::{Board, Fingerprint, Move, Position};
use crate::error::{EngineError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookEntry {
    pub key: u64,
    pub lock: u64,
    pub from: Position,
    pub to: Position,
    pub weight: i32,
}

#[derive(Clone, Debug, Default)]
pub struct OpeningBook {
    entries: Vec<BookEntry>,
}

impl OpeningBook {
    pub fn empty() -> Self {
        OpeningBook::default()
    }

    /// 随引擎一起发布的小开局库
    pub fn builtin() -> Self {
        OpeningBook::parse(include_str!("../BOOK.DAT"))
    }

    /// 解析整份开局库，坏行记录告警后跳过
    pub fn parse(data: &str) -> Self {
        let mut entries: Vec<BookEntry> = data
            .lines()
            .enumerate()
            .map(|(no, line)| (no + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|(no, line)| match OpeningBook::parse_line(no, line) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(%err, "skipping opening book line");
                    None
                }
            })
            .collect();
        entries.sort_by_key(|e| e.key);
        OpeningBook { entries }
    }

    pub fn parse_line(no: usize, line: &str) -> Result<BookEntry> {
        let invalid = |reason| EngineError::InvalidBookLine { line: no, reason };
        let mut tokens = line.splitn(3, ' ');
        let m = tokens.next().ok_or_else(|| invalid("missing move"))?;
        let weight = tokens.next().ok_or_else(|| invalid("missing weight"))?;
        let fen = tokens.next().ok_or_else(|| invalid("missing fen"))?;

        let (from, to) = Move::parse_iccs(m).map_err(|_| invalid("bad move"))?;
        let weight = weight.parse::<i32>().map_err(|_| invalid("bad weight"))?;
        let (board, turn) = Board::from_fen(fen).map_err(|_| invalid("bad fen"))?;
        let Fingerprint { key, lock } = board.apparent_fingerprint(turn);
        Ok(BookEntry {
            key,
            lock,
            from,
            to,
            weight,
        })
    }

    /// 某局面的全部候选走法，按库中顺序
    pub fn candidates(&self, fingerprint: Fingerprint) -> Vec<&BookEntry> {
        let start = self.entries.partition_point(|e| e.key < fingerprint.key);
        self.entries[start..]
            .iter()
            .take_while(|e| e.key == fingerprint.key)
            .filter(|e| e.lock == fingerprint.lock)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Player, START_FEN};

    #[test]
    fn test_builtin_book() {
        let book = OpeningBook::builtin();
        assert_eq!(book.len(), 16);
        let board = Board::init();
        let candidates = book.candidates(board.apparent_fingerprint(Player::Red));
        assert_eq!(candidates.len(), 6);
        // 同一局面黑方走没有候选
        assert!(book.candidates(board.apparent_fingerprint(Player::Black)).is_empty());
    }

    #[test]
    fn test_lookup_after_move() {
        let book = OpeningBook::builtin();
        let mut board = Board::init();
        board.move_piece(Position::new(7, 7), Position::new(7, 4)).unwrap();
        let moves: Vec<String> = book
            .candidates(board.apparent_fingerprint(Player::Black))
            .iter()
            .map(|e| format!("{}{}", e.from, e.to))
            .collect();
        assert_eq!(moves.len(), 3);
        assert!(moves.contains(&"h9g7".to_owned()));
        assert!(moves.contains(&"h7e7".to_owned()));
    }

    #[test]
    fn test_bad_lines_skipped() {
        let data = format!(
            "h2e2 10 {fen}\n\
             # comment\n\
             \n\
             z2e2 10 {fen}\n\
             h2e2 many {fen}\n\
             h2e2 10 not/a/fen w\n\
             b0c2\n\
             b0c2 5 {fen}\n",
            fen = START_FEN
        );
        let book = OpeningBook::parse(&data);
        assert_eq!(book.len(), 2);
        assert!(!book.is_empty());
        assert_eq!(
            OpeningBook::parse_line(7, "b0c2"),
            Err(EngineError::InvalidBookLine {
                line: 7,
                reason: "missing weight"
            })
        );
        assert!(OpeningBook::empty().candidates(Board::init().apparent_fingerprint(Player::Red)).is_empty());
    }
}
