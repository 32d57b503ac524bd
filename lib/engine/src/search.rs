/*
 * Search State Module - AI搜索状态管理
 *
 * 搜索相关的状态与 Board 分离：
 * - 置换表（key 寻址，lock 校验），杀棋分按离根节点的距离修正后存取
 * - 历史启发表：90 x 90，安静走法产生剪枝时加 depth²
 * - 当前搜索路径上的局面，路径内重复视为和棋
 *
 * 搜索直接在传入的 Board 上 apply/撤销走子（ScopedMove），不复制棋盘。
 */
use std::time::{Duration, Instant};

use tracing::debug;

use crate::board::{Board, Fingerprint, Move, Player};
use crate::constant::{DRAW, MATE, MATE_THRESHOLD, MAX, MAX_DEPTH, MAX_TT_BITS, MIN, MIN_TT_BITS, QUIESCENCE_LIMIT};
use crate::evaluate::Evaluator;

/// 置换表记录的类型标志
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HashFlag {
    Exact, // 精确值
    Lower, // 下界（发生了 beta 剪枝）
    Upper, // 上界（没有走法超过 alpha）
}

/// 置换表记录
#[derive(Clone, Copy, Debug)]
pub struct Record {
    pub zobrist_lock: u64,
    pub depth: i32,
    pub flag: HashFlag,
    pub best_move: Option<Move>,
    pub value: i32,
}

/// 一次搜索的深度与时间限制
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SearchLimits {
    /// 不管用时多少都要搜完的深度
    pub min_depth: i32,
    pub max_depth: i32,
    pub time_budget: Duration,
}

impl SearchLimits {
    pub fn depth(depth: i32) -> Self {
        SearchLimits {
            min_depth: depth,
            max_depth: depth,
            time_budget: Duration::ZERO,
        }
    }
}

/// AI搜索状态，对局内一直保留，重新开局时清空
pub struct SearchState {
    pub evaluator: Evaluator,
    /// 搜索节点计数器
    pub counter: u64,
    /// 置换表
    pub records: Vec<Option<Record>>,
    mask: u64,
    /// 历史启发表，索引：from_square_index * 90 + to_square_index
    pub history_table: Vec<i32>,
    // 当前搜索路径（含根节点）上各局面的 key
    path: Vec<u64>,
    // 上一轮迭代的最佳走法，根节点优先搜索
    root_move: Option<Move>,
    /// 当前搜索距离根节点的深度
    pub distance: i32,
    /// 上一次迭代加深完整搜完的深度
    pub completed_depth: i32,
}

impl SearchState {
    pub fn new(evaluator: Evaluator, tt_bits: u32) -> Self {
        let size = 1usize << tt_bits.clamp(MIN_TT_BITS, MAX_TT_BITS);
        SearchState {
            evaluator,
            counter: 0,
            records: vec![None; size],
            mask: size as u64 - 1,
            history_table: vec![0; 90 * 90],
            path: vec![],
            root_move: None,
            distance: 0,
            completed_depth: 0,
        }
    }

    /// 清空置换表和历史表（新对局）
    pub fn reset(&mut self) {
        self.counter = 0;
        self.records.iter_mut().for_each(|r| *r = None);
        self.history_table.iter_mut().for_each(|h| *h = 0);
        self.path.clear();
        self.root_move = None;
        self.distance = 0;
        self.completed_depth = 0;
    }

    pub fn find_record(&self, fingerprint: Fingerprint, depth: i32) -> (Option<(i32, HashFlag)>, Option<Move>) {
        let Some(record) = &self.records[(fingerprint.key & self.mask) as usize] else {
            return (None, None);
        };
        if record.zobrist_lock != fingerprint.lock {
            return (None, None);
        }
        let mut value = record.value;
        if value > MATE_THRESHOLD {
            value -= self.distance;
        } else if value < -MATE_THRESHOLD {
            value += self.distance;
        }
        if record.depth >= depth {
            (Some((value, record.flag)), record.best_move)
        } else {
            (None, record.best_move)
        }
    }

    pub fn add_record(
        &mut self,
        fingerprint: Fingerprint,
        depth: i32,
        mut value: i32,
        flag: HashFlag,
        best_move: Option<Move>,
    ) {
        // 存的是"从当前节点算起"的杀棋步数
        if value > MATE_THRESHOLD {
            value += self.distance;
        } else if value < -MATE_THRESHOLD {
            value -= self.distance;
        }
        let index = (fingerprint.key & self.mask) as usize;
        if let Some(old_record) = &self.records[index] {
            if old_record.depth > depth {
                return;
            }
        }
        self.records[index] = Some(Record {
            value,
            depth,
            flag,
            best_move,
            zobrist_lock: fingerprint.lock,
        });
    }

    fn history_index(mv: &Move) -> usize {
        mv.from.index() * 90 + mv.to.index()
    }

    pub fn update_history(&mut self, mv: &Move, depth: i32) {
        self.history_table[SearchState::history_index(mv)] += depth * depth;
    }

    pub fn history_score(&self, mv: &Move) -> i32 {
        self.history_table[SearchState::history_index(mv)]
    }

    // 排序优先级：Hash Move > 吃子（MVV/LVA）> 历史启发
    pub fn sort_moves(&self, moves: &mut [Move], hash_move: Option<&Move>) {
        moves.sort_by_key(|mv| {
            if hash_move == Some(mv) {
                return i32::MIN;
            }
            if mv.is_capture() {
                -(1_000_000 + mv.capture.material_value() * 10 - mv.chess.material_value())
            } else {
                -self.history_score(mv)
            }
        });
    }

    // 负极大值 alpha-beta，返回 side 视角的分数
    pub fn alpha_beta(
        &mut self,
        board: &mut Board,
        side: Player,
        depth: i32,
        alpha: i32,
        beta: i32,
    ) -> (i32, Option<Move>) {
        let fingerprint = board.fingerprint().with_player(side);
        // 搜索路径上重复出现的局面按和棋计
        if self.distance > 0 && self.path.contains(&fingerprint.key) {
            return (DRAW, None);
        }
        self.path.push(fingerprint.key);
        let result = self.alpha_beta_internal(board, side, fingerprint, depth, alpha, beta);
        self.path.pop();
        result
    }

    fn alpha_beta_internal(
        &mut self,
        board: &mut Board,
        side: Player,
        fingerprint: Fingerprint,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
    ) -> (i32, Option<Move>) {
        self.counter += 1;
        let (bound, hash_move) = self.find_record(fingerprint, depth);
        // 根节点必须真正搜索才能给出走法
        if let (Some((value, flag)), true) = (bound, self.distance > 0) {
            match flag {
                HashFlag::Exact => return (value, hash_move),
                HashFlag::Lower => alpha = alpha.max(value),
                HashFlag::Upper => beta = beta.min(value),
            }
            if alpha >= beta {
                return (value, hash_move);
            }
        }

        if depth <= 0 || self.distance >= MAX_DEPTH {
            return (self.quies(board, side, alpha, beta, 0), None);
        }

        let mut moves = board.generate_moves(side, false);
        if moves.is_empty() {
            // 无棋可走即输，越早的杀棋分数越极端
            return (-MATE + self.distance, None);
        }
        let first = if self.distance == 0 { self.root_move.or(hash_move) } else { hash_move };
        self.sort_moves(&mut moves, first.as_ref());

        let alpha_orig = alpha;
        let mut best_value = MIN;
        let mut best_move = None;
        for m in moves {
            let v = {
                let mut scoped = board.apply(m.from, m.to);
                self.distance += 1;
                let v = -self.alpha_beta(&mut scoped, side.next(), depth - 1, -beta, -alpha).0;
                self.distance -= 1;
                v
            };
            if v > best_value {
                best_value = v;
                best_move = Some(m);
            }
            if v > alpha {
                alpha = v;
            }
            if alpha >= beta {
                if !m.is_capture() {
                    self.update_history(&m, depth);
                }
                break;
            }
        }

        let flag = if best_value <= alpha_orig {
            HashFlag::Upper
        } else if best_value >= beta {
            HashFlag::Lower
        } else {
            HashFlag::Exact
        };
        self.add_record(fingerprint, depth, best_value, flag, best_move);
        (best_value, best_move)
    }

    // 静态搜索：只搜吃子，缓解水平线效应
    pub fn quies(&mut self, board: &mut Board, side: Player, mut alpha: i32, beta: i32, ply: i32) -> i32 {
        self.counter += 1;
        let v = self.evaluator.evaluate_for(board, side);
        if ply >= QUIESCENCE_LIMIT {
            return v;
        }
        if v >= beta {
            return beta;
        }
        if v > alpha {
            alpha = v;
        }

        let mut moves = board.generate_moves(side, true);
        self.sort_moves(&mut moves, None);
        for m in moves {
            let v = {
                let mut scoped = board.apply(m.from, m.to);
                -self.quies(&mut scoped, side.next(), -beta, -alpha, ply + 1)
            };
            if v >= beta {
                return beta;
            }
            if v > alpha {
                alpha = v;
            }
        }
        alpha
    }

    /// 迭代加深：时间只在两轮之间检查，min_depth 以内的轮次一定搜完
    pub fn iterative_deepening(&mut self, board: &mut Board, side: Player, limits: SearchLimits) -> (i32, Option<Move>) {
        let start = Instant::now();
        self.counter = 0;
        self.distance = 0;
        self.root_move = None;
        self.completed_depth = 0;

        let mut best_value = 0;
        let mut best_move = None;
        for depth in 1..=limits.max_depth.min(MAX_DEPTH) {
            if depth > limits.min_depth && start.elapsed() >= limits.time_budget {
                break;
            }
            let (v, bm) = self.alpha_beta(board, side, depth, MIN, MAX);
            let Some(bm) = bm else {
                // 没有合法走法
                break;
            };
            best_value = v;
            best_move = Some(bm);
            self.root_move = best_move;
            self.completed_depth = depth;
            debug!(
                depth,
                score = v,
                nodes = self.counter,
                elapsed_ms = start.elapsed().as_millis() as u64,
                best_move = %bm,
                "search iteration complete"
            );
            if v.abs() >= MATE_THRESHOLD {
                break;
            }
        }
        self.root_move = None;
        (best_value, best_move)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Chess, ChessType, Position};
    use crate::constant::DEFAULT_TT_BITS;
    use crate::rules::Variant;

    fn state() -> SearchState {
        SearchState::new(Evaluator::default(), DEFAULT_TT_BITS)
    }

    // 不剪枝、不查表的负极大值，作为对照
    fn negamax(state: &mut SearchState, board: &mut Board, side: Player, depth: i32, distance: i32) -> i32 {
        if depth == 0 {
            return state.quies(board, side, MIN, MAX, 0);
        }
        let moves = board.legal_moves(side);
        if moves.is_empty() {
            return -MATE + distance;
        }
        let mut best = MIN;
        for m in moves {
            let mut scoped = board.apply(m.from, m.to);
            best = best.max(-negamax(state, &mut scoped, side.next(), depth - 1, distance + 1));
        }
        best
    }

    #[test]
    fn test_alpha_beta_matches_negamax() {
        let (mut board, side) = Board::from_fen("3k5/9/2n6/9/9/9/9/9/4C4/4K4 w - - 0 1").unwrap();
        for depth in [1, 2, 3] {
            let expected = negamax(&mut state(), &mut board, side, depth, 0);
            let mut searcher = state();
            let (first, _) = searcher.alpha_beta(&mut board, side, depth, MIN, MAX);
            assert_eq!(first, expected, "depth {}", depth);
            // 第二次搜索会用上置换表
            let (second, _) = searcher.alpha_beta(&mut board, side, depth, MIN, MAX);
            assert_eq!(second, expected, "depth {} with tt", depth);
        }
    }

    #[test]
    fn test_find_mate_in_one() {
        let (mut board, side) = Board::from_fen("4k4/R8/9/9/9/9/9/9/9/3K4R w - - 0 1").unwrap();
        let before = board.clone();
        let limits = SearchLimits {
            min_depth: 2,
            max_depth: 4,
            time_budget: Duration::from_secs(5),
        };
        let (value, best) = state().iterative_deepening(&mut board, side, limits);
        let best = best.unwrap();
        assert_eq!(value, MATE - 1);
        // 搜索结束后棋盘保持原样
        assert_eq!(board, before);
        // i0i9 与 a8f8 都是一步杀
        let mut after = board.apply(best.from, best.to);
        assert!(after.legal_moves(Player::Black).is_empty());
    }

    #[test]
    fn test_time_budget_checked_between_depths() {
        let (mut board, side) = Board::from_fen("3k5/9/2n6/9/9/9/9/9/4C4/4K4 w - - 0 1").unwrap();
        let mut searcher = state();
        // 时间已经用完，保底深度仍要搜完，然后立即停止
        let spent = SearchLimits {
            min_depth: 2,
            max_depth: 8,
            time_budget: Duration::ZERO,
        };
        let (_, best) = searcher.iterative_deepening(&mut board, side, spent);
        assert!(best.is_some());
        assert_eq!(searcher.completed_depth, 2);

        let roomy = SearchLimits {
            min_depth: 1,
            max_depth: 3,
            time_budget: Duration::from_secs(60),
        };
        searcher.iterative_deepening(&mut board, side, roomy);
        assert_eq!(searcher.completed_depth, 3);
    }

    #[test]
    fn test_no_legal_moves() {
        let (mut board, _) = Board::from_fen("4k3R/R8/9/9/9/9/9/9/9/3K5 b - - 0 1").unwrap();
        let (_, best) = state().iterative_deepening(&mut board, Player::Black, SearchLimits::depth(3));
        assert!(best.is_none());
    }

    #[test]
    fn test_prefers_capture() {
        // 红车可以白吃黑车
        let (mut board, side) = Board::from_fen("3k5/9/9/9/r8/9/9/9/9/R3K4 w - - 0 1").unwrap();
        let (_, best) = state().iterative_deepening(&mut board, side, SearchLimits::depth(2));
        let best = best.unwrap();
        assert_eq!(best.to, Position::new(4, 0));
        assert!(best.is_capture());
    }

    #[test]
    fn test_veiled_identity_does_not_steer_search() {
        let veiled_pair = |left: ChessType, right: ChessType| {
            let mut board = Board::empty(Variant::Jieqi);
            board.set_chess(Position::new(9, 4), Chess::Red(ChessType::King));
            board.set_chess(Position::new(0, 4), Chess::Black(ChessType::King));
            board.set_chess(Position::new(3, 4), Chess::Black(ChessType::Pawn));
            for (col, ct) in [(0, left), (8, right)] {
                board.set_chess(Position::new(6, col), Chess::Red(ct));
                board.concealment.set(Position::new(6, col), true, Some(ChessType::Pawn));
            }
            board.refresh_zobrist();
            board
        };
        for depth in [1, 2] {
            let mut a = veiled_pair(ChessType::Rook, ChessType::Pawn);
            let mut b = veiled_pair(ChessType::Pawn, ChessType::Rook);
            let found_a = state().iterative_deepening(&mut a, Player::Red, SearchLimits::depth(depth));
            let found_b = state().iterative_deepening(&mut b, Player::Red, SearchLimits::depth(depth));
            assert_eq!(found_a, found_b, "depth {}", depth);
            assert!(found_a.1.is_some());
        }
    }

    #[test]
    fn test_tt_mate_distance_round_trip() {
        let mut searcher = state();
        let fp = Fingerprint { key: 42, lock: 7 };
        searcher.distance = 3;
        searcher.add_record(fp, 2, MATE - 5, HashFlag::Exact, None);
        searcher.distance = 1;
        let (bound, _) = searcher.find_record(fp, 2);
        assert_eq!(bound, Some((MATE - 3, HashFlag::Exact)));
        assert_eq!(searcher.find_record(fp, 3).0, None);
        assert_eq!(searcher.find_record(Fingerprint { key: 42, lock: 8 }, 1).0, None);
    }

    #[test]
    fn test_tt_size_clamped() {
        assert_eq!(SearchState::new(Evaluator::default(), 2).records.len(), 1 << MIN_TT_BITS);
        assert_eq!(SearchState::new(Evaluator::default(), 64).records.len(), 1 << MAX_TT_BITS);
        assert_eq!(state().records.len(), 1 << DEFAULT_TT_BITS);
    }

    #[test]
    fn test_history_ordering() {
        let mut searcher = state();
        let mut board = Board::init();
        let mut moves = board.legal_moves(Player::Red);
        let quiet = *moves.iter().find(|m| !m.is_capture()).unwrap();
        searcher.update_history(&quiet, 3);
        searcher.sort_moves(&mut moves, None);
        // 吃子排在最前，然后是历史分高的安静走法
        assert!(moves[0].is_capture() && moves[1].is_capture());
        assert_eq!(moves[2], quiet);
        let last = moves[moves.len() - 1];
        searcher.sort_moves(&mut moves, Some(&last));
        assert_eq!(moves[0], last);
    }
}
