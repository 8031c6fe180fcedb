//! 活动管理服务
//!
//! 创建活动时保证同一分店的活动区间互不重叠

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};
use validator::Validate;

use super::dto::CreateCampaignRequest;
use super::store_access::StoreAccess;
use crate::error::{LoyaltyError, Result};
use crate::models::{Campaign, NewCampaign};
use crate::repository::{BranchRepositoryTrait, CampaignRepositoryTrait};

/// 活动百分比上限
const MAX_PERCENTAGE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// 活动管理服务
pub struct CampaignService {
    branch_repo: Arc<dyn BranchRepositoryTrait>,
    campaign_repo: Arc<dyn CampaignRepositoryTrait>,
    access: StoreAccess,
}

impl CampaignService {
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

    /// 创建活动
    ///
    /// 重叠检查与写入之间没有锁，同一分店的并发创建仍可能产生重叠，由解析时的优先级规则兜底
    #[instrument(skip(self, request), fields(branch_id = request.branch_id, name = %request.name))]
    pub async fn create_campaign(&self, request: CreateCampaignRequest) -> Result<Campaign> {
        request.validate()?;
        let campaign: NewCampaign = request.into();
        validate_campaign(&campaign)?;

        let branch = self
            .access
            .read("get_branch", || self.branch_repo.get_branch(campaign.branch_id))
            .await?;
        if branch.is_none() {
            return Err(LoyaltyError::BranchNotFound(campaign.branch_id));
        }

        let existing = self
            .access
            .read("list_campaigns", || {
                self.campaign_repo.list_by_branch(campaign.branch_id)
            })
            .await?;
        if let Some(conflict) = existing
            .iter()
            .find(|c| c.overlaps(campaign.start_date, campaign.end_date))
        {
            return Err(LoyaltyError::CampaignOverlap {
                branch_id: campaign.branch_id,
                existing_id: conflict.id,
            });
        }

        let created = self
            .access
            .write("create_campaign", self.campaign_repo.create(&campaign))
            .await?;

        info!(
            campaign_id = created.id,
            campaign_type = created.campaign_type.as_str(),
            start_date = %created.start_date,
            end_date = %created.end_date,
            "活动创建成功"
        );

        Ok(created)
    }
}

fn validate_campaign(campaign: &NewCampaign) -> Result<()> {
    if campaign.start_date > campaign.end_date {
        return Err(LoyaltyError::Validation(format!(
            "活动开始日期 {} 晚于结束日期 {}",
            campaign.start_date, campaign.end_date
        )));
    }
    if campaign.percentage.is_sign_negative() || campaign.percentage > MAX_PERCENTAGE {
        return Err(LoyaltyError::Validation(format!(
            "活动百分比必须在 0 到 100 之间: {}",
            campaign.percentage
        )));
    }
    Ok(())
}
