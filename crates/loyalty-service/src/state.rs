//! 应用状态定义
//!
//! 包含 Axum 路由共享的服务实例

use std::sync::Arc;

use crate::repository::Repositories;
use crate::service::{
    BalanceLedger, CampaignResolver, CampaignService, ClaimService, StoreAccess,
    TransactionService,
};

/// Axum 应用共享状态
///
/// 所有服务通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    pub transaction_service: Arc<TransactionService>,
    pub claim_service: Arc<ClaimService>,
    pub campaign_service: Arc<CampaignService>,
    pub ledger: Arc<BalanceLedger>,
}

impl AppState {
    /// 由仓储组装全部服务
    pub fn new(repos: Repositories, access: StoreAccess) -> Self {
        let ledger = Arc::new(BalanceLedger::new(repos.ledger.clone(), access.clone()));
        let resolver = Arc::new(CampaignResolver::new(
            repos.branches.clone(),
            repos.campaigns.clone(),
            access.clone(),
        ));

        let transaction_service = Arc::new(TransactionService::new(
            repos.branches.clone(),
            repos.transactions.clone(),
            repos.users.clone(),
            resolver,
            ledger.clone(),
            access.clone(),
        ));

        let claim_service = Arc::new(ClaimService::new(
            repos.rewards.clone(),
            repos.branches.clone(),
            ledger.clone(),
            access.clone(),
        ));

        let campaign_service = Arc::new(CampaignService::new(
            repos.branches,
            repos.campaigns,
            access,
        ));

        Self {
            transaction_service,
            claim_service,
            campaign_service,
            ledger,
        }
    }
}
