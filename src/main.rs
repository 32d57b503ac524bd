use std::io;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use engine::book::OpeningBook;
use engine::constant::{DEFAULT_TT_BITS, MAX_TT_BITS, MIN_TT_BITS};
use engine::evaluate::EvaluatorKind;
use engine::ucci::UcciSession;
use engine::{Difficulty, EngineConfig, Variant, XiangqiEngine};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantArg {
    Standard,
    Jieqi,
}

/// 象棋 / 揭棋引擎，通过标准输入输出讲 UCCI 协议
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, value_enum, default_value = "standard")]
    variant: VariantArg,
    /// 1 简单，2 中等，3 困难
    #[arg(long, default_value_t = 2)]
    difficulty: u8,
    /// 固定随机种子（揭棋洗牌、开局库选择）
    #[arg(long)]
    seed: Option<u64>,
    /// 使用带机动性、将帅安全等项的扩展评估
    #[arg(long)]
    extended: bool,
    /// 置换表大小为 2^tt_bits
    #[arg(
        long,
        default_value_t = DEFAULT_TT_BITS,
        value_parser = clap::value_parser!(u32).range(MIN_TT_BITS as i64..=MAX_TT_BITS as i64)
    )]
    tt_bits: u32,
    #[arg(long)]
    no_book: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<EngineConfig> {
        let difficulty = Difficulty::try_from(self.difficulty).context("bad --difficulty")?;
        Ok(EngineConfig {
            variant: match self.variant {
                VariantArg::Standard => Variant::Standard,
                VariantArg::Jieqi => Variant::Jieqi,
            },
            difficulty,
            evaluator: if self.extended {
                EvaluatorKind::Extended
            } else {
                EvaluatorKind::Basic
            },
            tt_bits: self.tt_bits,
            seed: self.seed,
            ..EngineConfig::default()
        })
    }
}

fn main() -> anyhow::Result<()> {
    // 标准输出留给协议，日志写到标准错误
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config()?;
    info!(?config, "starting engine");

    let book = if args.no_book {
        OpeningBook::empty()
    } else {
        OpeningBook::builtin()
    };
    let engine = XiangqiEngine::with_book(config, book);
    let mut session = UcciSession::new(engine, io::stdout().lock()).context("compile position pattern")?;
    session.run(io::stdin().lock())?;
    Ok(())
}
