// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Extension;
use chrono::Duration;
use orgscan::config::settings::Settings;
use orgscan::credentials::{Capability, CredentialBroker, StsCredentialBroker, TrustList};
use orgscan::domain::models::job::AssessmentType;
use orgscan::domain::repositories::findings_repository::FindingsRepository;
use orgscan::domain::repositories::jobs_repository::JobsRepository;
use orgscan::domain::repositories::scan_config_repository::ScanConfigRepository;
use orgscan::domain::services::jobs_service::JobsService;
use orgscan::domain::services::organizations_gateway::OrganizationsGateway;
use orgscan::infrastructure::aws::organizations::AwsOrganizationsGateway;
use orgscan::infrastructure::aws::sts::current_principal_arn;
use orgscan::infrastructure::database::connection;
use orgscan::infrastructure::repositories::findings_repo_impl::FindingsRepositoryImpl;
use orgscan::infrastructure::repositories::jobs_repo_impl::JobsRepositoryImpl;
use orgscan::infrastructure::repositories::scan_config_repo_impl::ScanConfigRepositoryImpl;
use orgscan::orchestrator::access_validator::{AccessValidator, StsAccessValidator};
use orgscan::orchestrator::account_resolver::AccountResolver;
use orgscan::orchestrator::finalizer::JobFinalizer;
use orgscan::orchestrator::runner::{AssessmentRunner, JobOrchestrator};
use orgscan::orchestrator::task_executor::{ScanTaskExecutor, SpokeScanExecutor};
use orgscan::presentation::routes;
use orgscan::scanners::delegated_admin::DelegatedAdminScan;
use orgscan::scanners::router::ScannerRegistry;
use orgscan::scanners::s3_policy::S3PolicyScanner;
use orgscan::scanners::trusted_access::TrustedAccessScan;
use orgscan::scanners::SynchronousScan;
use orgscan::utils::retry_policy::RetryPolicy;
use orgscan::utils::telemetry;
use orgscan::workers::expiration_worker::ExpirationWorker;
use orgscan::workers::nightly_worker::NightlyWorker;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use migration::{Migrator, MigratorTrait};

fn build_trust_list(settings: &Settings, own_principal: &str) -> TrustList {
    let principals: Vec<String> = settings
        .aws
        .trusted_principals
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut trust_list = TrustList::new();
    for capability in [
        Capability::ValidateAccess,
        Capability::ScanSpokeResources,
        Capability::ScanSingleAccount,
    ] {
        if principals.is_empty() {
            trust_list = trust_list.allow(capability, own_principal);
        } else {
            for principal in &principals {
                trust_list = trust_list.allow(capability, principal);
            }
        }
    }
    trust_list
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting orgscan...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // Initialize Prometheus Metrics
    orgscan::infrastructure::metrics::init_metrics(&settings.metrics.listen_addr);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize AWS clients
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let sts_client = aws_sdk_sts::Client::new(&aws_config);
    let organizations_client = aws_sdk_organizations::Client::new(&aws_config);

    let principal_arn = current_principal_arn(&sts_client).await?;
    info!(principal_arn, "Resolved hub principal");

    // 5. Initialize components
    let jobs_repo: Arc<dyn JobsRepository> = Arc::new(JobsRepositoryImpl::new(db.clone()));
    let findings_repo: Arc<dyn FindingsRepository> =
        Arc::new(FindingsRepositoryImpl::new(db.clone()));
    let config_repo: Arc<dyn ScanConfigRepository> =
        Arc::new(ScanConfigRepositoryImpl::new(db.clone()));

    let gateway: Arc<dyn OrganizationsGateway> =
        Arc::new(AwsOrganizationsGateway::new(organizations_client));

    let trust_list = build_trust_list(&settings, &principal_arn);
    let broker: Arc<dyn CredentialBroker> = Arc::new(StsCredentialBroker::new(
        sts_client,
        settings.aws.spoke_role_name.clone(),
        settings.aws.partition.clone(),
        principal_arn,
        trust_list,
    ));

    let finding_retention = Duration::days(settings.scan.finding_retention_days);
    let job_retention = Duration::days(settings.scan.job_retention_days);

    let retry_policy = RetryPolicy::with_limits(
        settings.retry.max_retries,
        std::time::Duration::from_millis(settings.retry.initial_backoff_ms),
        std::time::Duration::from_millis(settings.retry.max_backoff_ms),
    );

    let registry = Arc::new(ScannerRegistry::new().register(Arc::new(S3PolicyScanner)));
    let validator: Arc<dyn AccessValidator> = Arc::new(StsAccessValidator::new(
        broker.clone(),
        retry_policy.clone(),
    ));
    let executor: Arc<dyn ScanTaskExecutor> = Arc::new(SpokeScanExecutor::new(
        broker.clone(),
        registry,
        findings_repo.clone(),
        finding_retention,
        Duration::days(settings.scan.policy_explorer_retention_days),
    ));

    let resolver = Arc::new(AccountResolver::new(gateway.clone()));
    let finalizer = Arc::new(JobFinalizer::new(jobs_repo.clone()));

    let orchestrator = Arc::new(JobOrchestrator::new(
        resolver,
        validator,
        executor,
        jobs_repo.clone(),
        finalizer.clone(),
        retry_policy,
        settings.scan.account_concurrency,
        settings.scan.task_concurrency,
        job_retention,
    ));

    let mut sync_strategies: HashMap<AssessmentType, Arc<dyn SynchronousScan>> = HashMap::new();
    sync_strategies.insert(
        AssessmentType::DelegatedAdmin,
        Arc::new(DelegatedAdminScan::new(gateway.clone(), finding_retention)),
    );
    sync_strategies.insert(
        AssessmentType::TrustedAccess,
        Arc::new(TrustedAccessScan::new(gateway.clone(), finding_retention)),
    );

    let runner = Arc::new(AssessmentRunner::new(
        jobs_repo.clone(),
        findings_repo.clone(),
        finalizer,
        orchestrator,
        sync_strategies,
        job_retention,
    ));

    let jobs_service = Arc::new(JobsService::new(jobs_repo.clone(), findings_repo.clone()));

    // 6. Start workers
    ExpirationWorker::new(jobs_repo, findings_repo, config_repo.clone()).start();
    NightlyWorker::new(runner.clone()).start();

    // 7. Start HTTP server
    let app = routes::routes()
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(Extension(runner))
        .layer(Extension(jobs_service))
        .layer(Extension(config_repo))
        .layer(Extension(settings.clone()));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
