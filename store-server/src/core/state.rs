use std::path::Path;
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::db::repository::OrderRepository;
use crate::services::{
    CarrierClient, EmailClient, HttpEmailClient, NoEmailClient, PaymentClient,
    ReconciliationService, ShipmentService,
};

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是商店节点的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | payments | Arc<PaymentClient> | 支付网关客户端 |
/// | shipments | ShipmentService | 物流流程编排 |
/// | reconciliation | ReconciliationService | 支付对账流程 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 支付网关客户端
    pub payments: Arc<PaymentClient>,
    /// 物流流程编排
    pub shipments: ShipmentService,
    /// 支付 webhook 对账流程
    pub reconciliation: ReconciliationService,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database)
    /// 3. 出站客户端 (支付、物流、邮件)
    /// 4. 业务流程服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        let work_dir = Path::new(&config.work_dir);
        let db_dir = work_dir.join("database");
        std::fs::create_dir_all(&db_dir)?;

        let db_service = DbService::new(&db_dir)
            .await
            .map_err(|e| ServerError::Database(e.to_string()))?;

        Ok(Self::with_db(config.clone(), db_service.db))
    }

    /// 从已打开的数据库构造状态 (测试场景直接传入内存数据库)
    pub fn with_db(config: Config, db: Surreal<Db>) -> Self {
        let payments = Arc::new(PaymentClient::new(
            config.payment_api_url.clone(),
            config.payment_secret_key.clone(),
            config.request_timeout_ms,
        ));

        let carrier = Arc::new(CarrierClient::new(
            config.carrier_api_url.clone(),
            config.carrier_api_password.clone(),
            config.request_timeout_ms,
        ));

        let mailer: Arc<dyn EmailClient> = if config.email_enabled {
            Arc::new(HttpEmailClient::new(
                config.email_api_url.clone(),
                config.email_api_key.clone(),
                config.email_from.clone(),
            ))
        } else {
            Arc::new(NoEmailClient)
        };

        let orders = OrderRepository::new(db.clone());
        let shipments = ShipmentService::new(
            orders.clone(),
            carrier,
            config.carrier_sender_label.clone(),
        );
        let reconciliation = ReconciliationService::new(
            orders,
            shipments.clone(),
            mailer,
            config.store_name.clone(),
        );

        Self {
            config,
            db,
            payments,
            shipments,
            reconciliation,
        }
    }
}
