//! 数据库仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 使用 SQLx 进行类型安全的数据库操作
//! - 定义 trait 接口以支持 mock 测试和进程内实现

mod branch_repo;
mod campaign_repo;
mod ledger_repo;
pub mod memory;
mod reward_repo;
mod traits;
mod transaction_repo;
mod user_repo;

use std::sync::Arc;

use sqlx::PgPool;

pub use branch_repo::BranchRepository;
pub use campaign_repo::CampaignRepository;
pub use ledger_repo::LedgerRepository;
pub use memory::MemoryStore;
pub use reward_repo::RewardRepository;
pub use traits::*;
pub use transaction_repo::TransactionRepository;
pub use user_repo::UserRepository;

/// 服务层使用的全部仓储
#[derive(Clone)]
pub struct Repositories {
    pub branches: Arc<dyn BranchRepositoryTrait>,
    pub campaigns: Arc<dyn CampaignRepositoryTrait>,
    pub transactions: Arc<dyn TransactionRepositoryTrait>,
    pub ledger: Arc<dyn LedgerRepositoryTrait>,
    pub rewards: Arc<dyn RewardRepositoryTrait>,
    pub users: Arc<dyn UserRepositoryTrait>,
}

impl Repositories {
    /// PostgreSQL 仓储
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            branches: Arc::new(BranchRepository::new(pool.clone())),
            campaigns: Arc::new(CampaignRepository::new(pool.clone())),
            transactions: Arc::new(TransactionRepository::new(pool.clone())),
            ledger: Arc::new(LedgerRepository::new(pool.clone())),
            rewards: Arc::new(RewardRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool)),
        }
    }

    /// 进程内仓储，所有仓储共享同一个 `MemoryStore`
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            branches: store.clone(),
            campaigns: store.clone(),
            transactions: store.clone(),
            ledger: store.clone(),
            rewards: store.clone(),
            users: store,
        }
    }
}
