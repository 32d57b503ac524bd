/*
 * 简化的 UCCI 文本协议，供外部适配层以子进程方式调用引擎
 *
 * 支持：ucci / isready / setoption name difficulty value N /
 *       position (fen <FEN> | startpos) [moves m1 m2 ...] / go [depth N] / undo / quit
 * 引擎本身不记走棋方，这里按走子次数轮换。
 */
use std::io::{self, BufRead, Write};

use regex::Regex;

use crate::board::{Board, Move, Player};
use crate::engine::XiangqiEngine;
use crate::search::SearchLimits;

const POSITION_PATTERN: &str = r#"^(?:fen (?P<fen>[kabnrcpKABNRCP1-9/]+ [wrb](?: - - \d+ \d+)?)|(?P<startpos>startpos))(?: moves (?P<moves>[a-i]\d[a-i]\d(?: [a-i]\d[a-i]\d)*))?$"#;

pub struct UcciSession<W: Write> {
    engine: XiangqiEngine,
    turn: Player,
    // 当前对局是否由 startpos 开始，fen 载入的局面不做前缀同步
    from_startpos: bool,
    out: W,
    position_regex: Regex,
}

impl<W: Write> UcciSession<W> {
    pub fn new(engine: XiangqiEngine, out: W) -> Result<Self, regex::Error> {
        Ok(UcciSession {
            engine,
            turn: Player::Red,
            from_startpos: true,
            out,
            position_regex: Regex::new(POSITION_PATTERN)?,
        })
    }

    pub fn engine(&self) -> &XiangqiEngine {
        &self.engine
    }

    pub fn turn(&self) -> Player {
        self.turn
    }

    /// 逐行读取命令直到 quit 或输入结束
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        for line in input.lines() {
            if !self.handle(line?.trim())? {
                break;
            }
        }
        self.out.flush()
    }

    /// 处理一条命令，返回 false 表示结束会话
    pub fn handle(&mut self, cmd: &str) -> io::Result<bool> {
        let (name, param) = cmd.split_once(' ').unwrap_or((cmd, ""));
        match name {
            "" => {}
            "ucci" => self.info()?,
            "isready" => writeln!(self.out, "readyok")?,
            "setoption" => self.set_option(param)?,
            "position" => self.position(param)?,
            "go" => self.go(param)?,
            "undo" => {
                if self.engine.undo().is_some() {
                    self.turn = self.turn.next();
                }
            }
            "quit" => {
                writeln!(self.out, "bye")?;
                return Ok(false);
            }
            _ => writeln!(self.out, "not support")?,
        }
        self.out.flush()?;
        Ok(true)
    }

    fn info(&mut self) -> io::Result<()> {
        writeln!(self.out, "id name {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
        writeln!(
            self.out,
            "option difficulty type spin min 1 max 3 default {}",
            self.engine.difficulty().level()
        )?;
        writeln!(self.out, "ucciok")
    }

    fn set_option(&mut self, param: &str) -> io::Result<()> {
        let tokens: Vec<&str> = param.split_whitespace().collect();
        match tokens.as_slice() {
            ["name", "difficulty", "value", level] => {
                let result = level
                    .parse::<u8>()
                    .map_err(|_| level.to_string())
                    .and_then(|l| self.engine.set_difficulty(l).map_err(|err| err.to_string()));
                if let Err(err) = result {
                    writeln!(self.out, "info string {}", err)?;
                }
                Ok(())
            }
            _ => writeln!(self.out, "info string unknown option `{}`", param),
        }
    }

    fn position(&mut self, param: &str) -> io::Result<()> {
        let Some(captures) = self.position_regex.captures(param) else {
            return writeln!(self.out, "info string bad position `{}`", param);
        };
        let moves: Vec<&str> = captures
            .name("moves")
            .map(|m| m.as_str().split(' ').collect())
            .unwrap_or_default();

        if let Some(fen) = captures.name("fen") {
            match Board::from_fen(fen.as_str()) {
                Ok((board, turn)) => {
                    self.engine.set_board(board);
                    self.turn = turn;
                    self.from_startpos = false;
                }
                Err(err) => return writeln!(self.out, "info string {}", err),
            }
        } else {
            // 揭棋每次重开都会重新洗牌，已走过的前缀保留当前对局
            let played: Vec<String> = self
                .engine
                .board()
                .history
                .iter()
                .map(|r| format!("{}{}", r.from, r.to))
                .collect();
            let is_prefix = played.len() <= moves.len() && played.iter().zip(&moves).all(|(a, b)| a == b);
            if self.from_startpos && is_prefix {
                let skip = played.len();
                return self.apply_moves(&moves[skip..]);
            }
            self.engine.reset();
            self.turn = Player::Red;
            self.from_startpos = true;
        }
        self.apply_moves(&moves)
    }

    fn apply_moves(&mut self, moves: &[&str]) -> io::Result<()> {
        for m in moves {
            let Ok((from, to)) = Move::parse_iccs(m) else {
                return writeln!(self.out, "info string bad move `{}`", m);
            };
            if self.engine.board().side_of(from) != Some(self.turn)
                || !self.engine.is_valid_move(from.row, from.col, to.row, to.col)
            {
                return writeln!(self.out, "info string illegal move `{}`", m);
            }
            self.engine.move_piece(from.row, from.col, to.row, to.col);
            self.turn = self.turn.next();
        }
        Ok(())
    }

    // 执行搜索并输出最佳走子
    fn go(&mut self, param: &str) -> io::Result<()> {
        let tokens: Vec<&str> = param.split_whitespace().collect();
        let best_move = match tokens.as_slice() {
            ["depth", depth] => match depth.parse::<i32>() {
                Ok(depth) if depth > 0 => self.engine.search_with_limits(self.turn, SearchLimits::depth(depth)),
                _ => return writeln!(self.out, "info string bad depth `{}`", depth),
            },
            _ => self.engine.get_best_move_for(self.turn),
        };
        match best_move {
            Some(m) => writeln!(self.out, "bestmove {}", m),
            None => writeln!(self.out, "nobestmove"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::OpeningBook;
    use crate::config::EngineConfig;
    use crate::rules::Variant;

    fn session(variant: Variant) -> UcciSession<Vec<u8>> {
        let config = EngineConfig {
            variant,
            seed: Some(7),
            ..EngineConfig::default()
        };
        UcciSession::new(XiangqiEngine::with_book(config, OpeningBook::builtin()), vec![]).unwrap()
    }

    fn output(session: &UcciSession<Vec<u8>>) -> String {
        String::from_utf8(session.out.clone()).unwrap()
    }

    #[test]
    fn test_ucci_session() {
        let mut session = session(Variant::Standard);
        let input = "ucci\nisready\nsetoption name difficulty value 1\nposition startpos moves h2e2\ngo\nquit\nisready\n";
        session.run(input.as_bytes()).unwrap();
        let out = output(&session);
        assert!(out.contains("ucciok"));
        assert!(out.contains("readyok"));
        assert!(out.ends_with("bye\n"));
        assert_eq!(out.matches("readyok").count(), 1);
        assert_eq!(session.turn(), Player::Black);
        let line = out.lines().find(|l| l.starts_with("bestmove")).unwrap();
        // 开局库里 h2e2 之后的应着
        assert!(["bestmove h9g7", "bestmove b9c7", "bestmove h7e7"].contains(&line));
    }

    #[test]
    fn test_go_depth_finds_mate() {
        let mut session = session(Variant::Standard);
        let fen = "4k4/R8/9/9/9/9/9/9/9/3K4R w - - 0 1";
        session.handle(&format!("position fen {}", fen)).unwrap();
        session.handle("go depth 2").unwrap();
        let out = output(&session);
        let best = out.lines().find_map(|l| l.strip_prefix("bestmove ")).unwrap().to_owned();
        // 走完这步黑方无子可动
        session.handle(&format!("position fen {} moves {}", fen, best)).unwrap();
        assert_eq!(session.engine().last_move().map(|r| format!("{}{}", r.from, r.to)), Some(best));
        assert!(session.engine.legal_moves(Player::Black).is_empty());
    }

    #[test]
    fn test_no_best_move_and_errors() {
        let mut session = session(Variant::Standard);
        session.handle("position fen 4k3R/R8/9/9/9/9/9/9/9/3K5 b - - 0 1").unwrap();
        session.handle("go depth 2").unwrap();
        session.handle("setoption name difficulty value 9").unwrap();
        session.handle("position startpos moves a0a5").unwrap();
        session.handle("flip").unwrap();
        let out = output(&session);
        assert!(out.contains("nobestmove"));
        assert!(out.contains("difficulty must be 1..=3, got 9"));
        assert!(out.contains("illegal move `a0a5`"));
        assert!(out.contains("not support"));
        // fen 局面之后的 startpos 重新开局
        assert_eq!(session.engine().board(), &Board::init());
        assert_eq!(session.turn(), Player::Red);
    }

    #[test]
    fn test_jieqi_position_keeps_shuffle() {
        let mut session = session(Variant::Jieqi);
        session.handle("position startpos moves h2e2").unwrap();
        let layout = session.engine().board_state();
        session.handle("position startpos moves h2e2 h9g7").unwrap();
        assert_eq!(session.engine().board().history.len(), 2);
        // 同一盘棋，暗子身份没有重新洗
        assert_eq!(session.engine().board().history[0].chess, layout[7][4]);

        session.handle("undo").unwrap();
        assert_eq!(session.turn(), Player::Black);
        assert_eq!(session.engine().board().history.len(), 1);
    }
}
