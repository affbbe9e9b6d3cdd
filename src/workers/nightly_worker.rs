use crate::domain::models::job::AssessmentType;
use crate::domain::models::scan_config::ScanConfiguration;
use crate::orchestrator::runner::{AssessmentRunner, StartError};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 夜间策略清单工作器
///
/// 每天触发一次全组织的策略清单扫描。该评估类型的发现
/// 只保留到下一轮刷新，所以需要固定节奏的重建。
pub struct NightlyWorker {
    runner: Arc<AssessmentRunner>,
    interval: Duration,
}

impl NightlyWorker {
    pub fn new(runner: Arc<AssessmentRunner>) -> Self {
        Self {
            runner,
            interval: Duration::from_secs(24 * 60 * 60), // 每天运行一次
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!("Nightly policy explorer worker started");

        let mut interval = tokio::time::interval(self.interval);
        // 启动时不立即触发，等满一个周期
        interval.tick().await;

        loop {
            interval.tick().await;
            self.trigger_refresh().await;
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn trigger_refresh(&self) {
        let result = self
            .runner
            .start(
                AssessmentType::PolicyExplorer,
                ScanConfiguration::default(),
                "scheduler".to_string(),
            )
            .await;

        match result {
            Ok(job) => {
                info!(job_id = %job.job_id, "Nightly policy explorer scan started");
            }
            Err(StartError::ScanRunning(_)) => {
                warn!("Skipping nightly refresh, a policy explorer scan is already running");
            }
            Err(e) => {
                error!("Failed to start nightly policy explorer scan: {}", e);
            }
        }
    }
}
