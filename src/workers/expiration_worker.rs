use crate::domain::repositories::findings_repository::FindingsRepository;
use crate::domain::repositories::jobs_repository::{JobsRepository, RepositoryError};
use crate::domain::repositories::scan_config_repository::ScanConfigRepository;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 过期数据清理工作器
///
/// 定期清理超过保留期的任务、失败明细、发现与扫描配置。
pub struct ExpirationWorker {
    jobs_repository: Arc<dyn JobsRepository>,
    findings_repository: Arc<dyn FindingsRepository>,
    config_repository: Arc<dyn ScanConfigRepository>,
    interval: Duration,
}

impl ExpirationWorker {
    pub fn new(
        jobs_repository: Arc<dyn JobsRepository>,
        findings_repository: Arc<dyn FindingsRepository>,
        config_repository: Arc<dyn ScanConfigRepository>,
    ) -> Self {
        Self {
            jobs_repository,
            findings_repository,
            config_repository,
            interval: Duration::from_secs(60 * 60), // 每小时运行一次
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!("Expiration worker started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;

            match self.cleanup_expired().await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired rows", count);
                    }
                }
                Err(e) => {
                    error!("Failed to cleanup expired rows: {}", e);
                }
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn cleanup_expired(&self) -> Result<u64, RepositoryError> {
        let now = Utc::now().fixed_offset();
        let jobs = self.jobs_repository.purge_expired(now).await?;
        let findings = self.findings_repository.purge_expired(now).await?;
        let configs = self.config_repository.purge_expired(now).await?;
        Ok(jobs + findings + configs)
    }
}

#[cfg(test)]
#[path = "expiration_worker_test.rs"]
mod tests;
