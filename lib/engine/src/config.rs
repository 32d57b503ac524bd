/* 引擎配置：难度档位、评估参数、置换表大小、随机种子 */
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::Player;
use crate::constant::DEFAULT_TT_BITS;
use crate::error::{EngineError, Result};
use crate::evaluate::{EvalWeights, Evaluator, EvaluatorKind, DEFAULT_CONCEALED_BONUS};
use crate::rules::Variant;
use crate::search::SearchLimits;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn level(&self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    // (保底深度, 最大深度, 时间预算)
    pub fn limits(&self) -> SearchLimits {
        let (min_depth, max_depth, millis) = match self {
            Difficulty::Easy => (2, 3, 500),
            Difficulty::Medium => (3, 5, 1500),
            Difficulty::Hard => (4, 8, 3000),
        };
        SearchLimits {
            min_depth,
            max_depth,
            time_budget: Duration::from_millis(millis),
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = EngineError;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Medium),
            3 => Ok(Difficulty::Hard),
            _ => Err(EngineError::InvalidDifficulty(level)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub variant: Variant,
    pub difficulty: Difficulty,
    /// 引擎默认执黑
    pub engine_side: Player,
    pub evaluator: EvaluatorKind,
    pub weights: EvalWeights,
    pub concealed_bonus: f32,
    /// 置换表大小为 2^tt_bits，超出 MIN_TT_BITS..=MAX_TT_BITS 时截断
    pub tt_bits: u32,
    /// 揭棋洗牌与开局库选择用的种子，None 时从系统取
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            variant: Variant::Standard,
            difficulty: Difficulty::default(),
            engine_side: Player::Black,
            evaluator: EvaluatorKind::Basic,
            weights: EvalWeights::default(),
            concealed_bonus: DEFAULT_CONCEALED_BONUS,
            tt_bits: DEFAULT_TT_BITS,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn build_evaluator(&self) -> Evaluator {
        Evaluator::new(self.evaluator, self.weights, self.concealed_bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_levels() {
        assert_eq!(Difficulty::try_from(1), Ok(Difficulty::Easy));
        assert_eq!(Difficulty::try_from(3).map(|d| d.level()), Ok(3));
        assert_eq!(Difficulty::try_from(0), Err(EngineError::InvalidDifficulty(0)));
        assert_eq!(Difficulty::try_from(4), Err(EngineError::InvalidDifficulty(4)));
    }

    #[test]
    fn test_limits_grow_with_difficulty() {
        let easy = Difficulty::Easy.limits();
        let hard = Difficulty::Hard.limits();
        assert_eq!((easy.min_depth, easy.max_depth), (2, 3));
        assert_eq!(Difficulty::Medium.limits().time_budget, Duration::from_millis(1500));
        assert!(hard.min_depth > easy.min_depth && hard.time_budget > easy.time_budget);
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.engine_side, Player::Black);
        assert_eq!(config.difficulty.level(), 2);
        assert_eq!(config.build_evaluator(), Evaluator::default());
    }
}
