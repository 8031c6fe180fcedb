//! 服务层
//!
//! 实现积分业务逻辑，协调仓储层。
//!
//! ## 模块结构
//!
//! - `campaign_resolver`: 分店当日生效活动的解析
//! - `reward_calculator`: 积分计算（纯函数）
//! - `balance_ledger`: 积分余额累加、扣减与查询
//! - `transaction_service`: 消费交易入账
//! - `claim_service`: 奖励兑换
//! - `campaign_service`: 活动创建
//! - `store_access`: 存储调用的超时与重试

pub mod balance_ledger;
pub mod campaign_resolver;
pub mod campaign_service;
pub mod claim_service;
pub mod dto;
pub mod reward_calculator;
pub mod store_access;
pub mod transaction_service;

pub use balance_ledger::BalanceLedger;
pub use campaign_resolver::CampaignResolver;
pub use campaign_service::CampaignService;
pub use claim_service::ClaimService;
pub use dto::*;
pub use store_access::StoreAccess;
pub use transaction_service::TransactionService;
