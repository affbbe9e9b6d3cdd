// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{anyhow, Context};
use tracing::info;

/// 解析服务自身的主体 ARN
///
/// 启动时调用一次，得到的主体写入凭证代理的能力信任表。
pub async fn current_principal_arn(client: &aws_sdk_sts::Client) -> anyhow::Result<String> {
    let identity = client
        .get_caller_identity()
        .send()
        .await
        .context("Failed to resolve caller identity")?;
    let arn = identity
        .arn()
        .ok_or_else(|| anyhow!("GetCallerIdentity returned no ARN"))?
        .to_string();
    info!(%arn, "Resolved service principal");
    Ok(arn)
}
