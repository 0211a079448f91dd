/// 服务器配置 - 商店节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/store | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | STORE_NAME | Store | 店铺名 (邮件主题等) |
/// | CURRENCY | czk | 结算货币 |
/// | PAYMENT_API_URL | https://api.payment.example | 支付网关地址 |
/// | PAYMENT_SECRET_KEY | (空) | 支付 API 密钥 |
/// | PAYMENT_WEBHOOK_SECRET | (空) | Webhook 签名密钥 |
/// | CARRIER_API_URL | https://api.carrier.example/rest | 物流 API 地址 |
/// | CARRIER_API_PASSWORD | (空) | 物流 API 密码 |
/// | CARRIER_SENDER_LABEL | (空) | 物流发件人标识 |
/// | EMAIL_API_URL | https://api.email.example | 邮件 API 地址 |
/// | EMAIL_API_KEY | (空) | 邮件 API 密钥 |
/// | EMAIL_FROM | orders@example.com | 发件人地址 |
/// | EMAIL_ENABLED | true | 是否发送邮件 |
/// | REQUEST_TIMEOUT_MS | 30000 | 出站请求超时(毫秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/store HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 店铺名，用于邮件主题和发票
    pub store_name: String,
    /// 结算货币 (ISO 4217 小写)
    pub currency: String,

    // === 支付网关 ===
    pub payment_api_url: String,
    pub payment_secret_key: String,
    pub payment_webhook_secret: String,

    // === 物流承运商 ===
    pub carrier_api_url: String,
    pub carrier_api_password: String,
    /// 承运商注册的发件人标识 (eshop)
    pub carrier_sender_label: String,

    // === 邮件 ===
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub email_enabled: bool,

    /// 出站请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/store".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            store_name: std::env::var("STORE_NAME").unwrap_or_else(|_| "Store".into()),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "czk".into()),

            payment_api_url: std::env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.payment.example".into()),
            payment_secret_key: std::env::var("PAYMENT_SECRET_KEY").unwrap_or_default(),
            payment_webhook_secret: std::env::var("PAYMENT_WEBHOOK_SECRET").unwrap_or_default(),

            carrier_api_url: std::env::var("CARRIER_API_URL")
                .unwrap_or_else(|_| "https://api.carrier.example/rest".into()),
            carrier_api_password: std::env::var("CARRIER_API_PASSWORD").unwrap_or_default(),
            carrier_sender_label: std::env::var("CARRIER_SENDER_LABEL").unwrap_or_default(),

            email_api_url: std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.email.example".into()),
            email_api_key: std::env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "orders@example.com".into()),
            email_enabled: std::env::var("EMAIL_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),

            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
