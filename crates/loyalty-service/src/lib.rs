//! 积分服务
//!
//! 门店消费积分的记录、累计与兑换。
//!
//! ## 核心功能
//!
//! - **活动解析**：为分店在交易日期选出生效的促销活动
//! - **积分计算**：消费金额 × 门店换算系数 × 活动倍数
//! - **余额账本**：按 (用户, 门店) 原子累加和条件扣减积分
//! - **交易入账**：交易写入与余额累加在同一存储事务中完成
//! - **奖励兑换**：校验余额后扣减积分
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 仓储层（PostgreSQL 与进程内实现）
//! - `service`: 业务服务层
//! - `handlers` / `routes` / `state`: HTTP 接口

pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;

pub use error::{LoyaltyError, Result};
pub use models::*;
pub use repository::{MemoryStore, Repositories};
pub use state::AppState;
