//! 随机抽样服务 - 业务能力层
//!
//! 只负责"从可用题目中随机抽取 N 道"能力，不关心流程

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::debug;

use crate::config::Config;
use crate::error::{FormError, Result};

/// 随机抽样服务
///
/// 随机源在构造时注入；固定种子时抽样结果可复现。
pub struct RandomSampler {
    rng: Mutex<StdRng>,
}

impl RandomSampler {
    /// 使用系统熵创建
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// 使用固定种子创建
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// 根据配置选择随机源
    pub fn from_config(config: &Config) -> Self {
        match config.sampler_seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// 抽取 `count` 个不重复的 ID
    ///
    /// 可用数量小于或等于请求数量时返回 `InsufficientQuestions`，不会返回部分结果。
    pub fn sample(&self, available: &[String], count: usize) -> Result<Vec<String>> {
        let mut seen = HashSet::with_capacity(available.len());
        let mut pool: Vec<String> = available
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        if pool.len() <= count {
            return Err(FormError::InsufficientQuestions {
                requested: count,
                available: pool.len(),
            });
        }

        {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            pool.shuffle(&mut *rng);
        }
        pool.truncate(count);

        debug!("随机抽样 ({}/{}): {:?}", count, seen.len(), pool);
        Ok(pool)
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}
