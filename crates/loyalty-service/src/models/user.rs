//! 用户实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 积分用户
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[sqlx(default)]
    pub phone: Option<String>,
    /// 凭证哈希，不对外输出
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
