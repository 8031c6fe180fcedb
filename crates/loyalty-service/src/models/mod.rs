//! 积分服务领域模型
//!
//! 包含门店、活动、交易、奖励和积分余额等核心实体定义

pub mod campaign;
pub mod enums;
pub mod reward;
pub mod store;
pub mod transaction;
pub mod user;

// 重新导出常用类型
pub use campaign::{Campaign, NewCampaign};
pub use enums::{
    ADDITIONAL_MULTIPLIER, ADDITIONAL_THRESHOLD, CampaignType, DOUBLE_MULTIPLIER, RewardType,
};
pub use reward::{AccumulatedReward, Reward, STORED_VALUE_LIMIT, fits_storage};
pub use store::{Branch, BranchWithStore, Store};
pub use transaction::{NewTransaction, Transaction};
pub use user::User;
