//! Memory reuse configuration.
//!
//! Knobs for the double-buffer hazard guard, the stamped queue depth, the two
//! candidate-search toggles and strict input checking. Set them through the
//! builder or read them from `MOROK_REUSE_*` variables.

use bon::bon;

/// Minimum number of same-type queue blocks before the block used by the
/// immediately preceding group may be reused.
pub const DEFAULT_DB_REUSE_THRESHOLD: usize = 2;

/// Queue depth stamped on every queue-allocated tensor.
pub const DEFAULT_QUEUE_DEPTH: i64 = 2;

/// Knobs of the reuse heuristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReuseConfig {
    /// Double-buffer hazard threshold.
    ///
    /// When the only candidate for a queue group is the block that received
    /// the previous group, it is reused only if more than this many blocks of
    /// the same type exist.
    pub db_reuse_threshold: usize,
    /// Queue depth written back for queue blocks.
    pub queue_depth: i64,
    /// Require `group_is_reusable` on members of Calc blocks before a calc
    /// group may join them.
    pub calc_reuse_requires_reusable: bool,
    /// Reorder TmpBuff block members by size level while searching candidates.
    pub sort_tmpbuf_members: bool,
    /// Reject missing writeback records and inverted lifetimes.
    pub strict_attributes: bool,
}

impl Default for ReuseConfig {
    fn default() -> Self {
        Self {
            db_reuse_threshold: DEFAULT_DB_REUSE_THRESHOLD,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            calc_reuse_requires_reusable: false,
            sort_tmpbuf_members: true,
            strict_attributes: false,
        }
    }
}

#[bon]
impl ReuseConfig {
    /// Create a reuse configuration with builder pattern.
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_DB_REUSE_THRESHOLD)] db_reuse_threshold: usize,
        #[builder(default = DEFAULT_QUEUE_DEPTH)] queue_depth: i64,
        #[builder(default = false)] calc_reuse_requires_reusable: bool,
        #[builder(default = true)] sort_tmpbuf_members: bool,
        #[builder(default = false)] strict_attributes: bool,
    ) -> Self {
        Self { db_reuse_threshold, queue_depth, calc_reuse_requires_reusable, sort_tmpbuf_members, strict_attributes }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `MOROK_REUSE_DB_THRESHOLD` - Double-buffer reuse threshold (default: 2)
    /// * `MOROK_REUSE_QUEUE_DEPTH` - Queue depth stamped on queue tensors (default: 2)
    /// * `MOROK_REUSE_CALC_GATE` - Require reusable members for Calc-to-Calc reuse if set
    /// * `MOROK_REUSE_NO_TMPBUF_SORT` - Keep TmpBuff member order during candidate search if set
    /// * `MOROK_REUSE_STRICT` - Enable strict attribute checking if set
    pub fn from_env() -> Self {
        let db_reuse_threshold = std::env::var("MOROK_REUSE_DB_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_REUSE_THRESHOLD);
        let queue_depth =
            std::env::var("MOROK_REUSE_QUEUE_DEPTH").ok().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_QUEUE_DEPTH);
        let calc_reuse_requires_reusable = std::env::var("MOROK_REUSE_CALC_GATE").is_ok();
        let sort_tmpbuf_members = std::env::var("MOROK_REUSE_NO_TMPBUF_SORT").is_err();
        let strict_attributes = std::env::var("MOROK_REUSE_STRICT").is_ok();

        Self { db_reuse_threshold, queue_depth, calc_reuse_requires_reusable, sort_tmpbuf_members, strict_attributes }
    }
}
