//! 活动解析
//!
//! 为分店在指定日期选出唯一生效的促销活动

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use super::store_access::StoreAccess;
use crate::error::{LoyaltyError, Result};
use crate::models::Campaign;
use crate::repository::{BranchRepositoryTrait, CampaignRepositoryTrait};

/// 活动解析服务
pub struct CampaignResolver {
    branch_repo: Arc<dyn BranchRepositoryTrait>,
    campaign_repo: Arc<dyn CampaignRepositoryTrait>,
    access: StoreAccess,
}

impl CampaignResolver {
    pub fn new(
        branch_repo: Arc<dyn BranchRepositoryTrait>,
        campaign_repo: Arc<dyn CampaignRepositoryTrait>,
        access: StoreAccess,
    ) -> Self {
        Self {
            branch_repo,
            campaign_repo,
            access,
        }
    }

    /// 查找分店在指定日期生效的活动
    ///
    /// 分店不存在返回 `BranchNotFound`；没有活动或没有命中日期时返回 `None`
    #[instrument(skip(self), fields(branch_id = branch_id, as_of = %as_of))]
    pub async fn find_active_campaign(
        &self,
        branch_id: i64,
        as_of: NaiveDate,
    ) -> Result<Option<Campaign>> {
        let branch = self
            .access
            .read("get_branch", || self.branch_repo.get_branch(branch_id))
            .await?;
        if branch.is_none() {
            return Err(LoyaltyError::BranchNotFound(branch_id));
        }

        self.active_campaign_for(branch_id, as_of).await
    }

    /// 已确认分店存在时直接解析活动
    pub(crate) async fn active_campaign_for(
        &self,
        branch_id: i64,
        as_of: NaiveDate,
    ) -> Result<Option<Campaign>> {
        let campaigns = self
            .access
            .read("list_campaigns", || self.campaign_repo.list_by_branch(branch_id))
            .await?;

        let selected = select_active(campaigns, as_of);
        debug!(
            branch_id,
            campaign_id = selected.as_ref().map(|c| c.id),
            "活动解析完成"
        );
        Ok(selected)
    }
}

/// 从候选活动中选出在 `as_of` 生效的一个
///
/// 多个活动重叠时取最新创建的（created_at 倒序，再按 id 倒序）
pub fn select_active(campaigns: Vec<Campaign>, as_of: NaiveDate) -> Option<Campaign> {
    let mut matching: Vec<Campaign> = campaigns
        .into_iter()
        .filter(|c| c.is_active_on(as_of))
        .collect();

    if matching.len() > 1 {
        warn!(
            branch_id = matching[0].branch_id,
            matched = matching.len(),
            as_of = %as_of,
            "同一日期命中多个活动，按最新创建的活动计算"
        );
    }

    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    matching.into_iter().next()
}
