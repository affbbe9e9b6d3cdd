// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 受支持的服务条目
#[derive(Debug, Clone, Copy)]
pub struct SupportedService {
    pub service_name: &'static str,
    pub service_principal: &'static str,
    pub friendly_name: &'static str,
}

/// 受支持的区域条目
#[derive(Debug, Clone, Copy)]
pub struct SupportedRegion {
    pub region: &'static str,
    pub region_name: &'static str,
}

/// 资源策略扫描支持的服务全集
///
/// 账户访问验证把请求范围裁剪到该表内；不在表内的服务
/// 在执行器里记为业务失败而不是编排错误。
pub static SUPPORTED_SERVICES: &[SupportedService] = &[
    SupportedService {
        service_name: "iam",
        service_principal: "iam.amazonaws.com",
        friendly_name: "AWS Identity and Access Management (AWS IAM)",
    },
    SupportedService {
        service_name: "s3",
        service_principal: "s3.amazonaws.com",
        friendly_name: "Amazon S3 (Amazon Simple Storage Service)",
    },
    SupportedService {
        service_name: "glacier",
        service_principal: "glacier.amazonaws.com",
        friendly_name: "Amazon S3 Glacier",
    },
    SupportedService {
        service_name: "sns",
        service_principal: "sns.amazonaws.com",
        friendly_name: "Amazon Simple Notification Service (Amazon SNS)",
    },
    SupportedService {
        service_name: "sqs",
        service_principal: "sqs.amazonaws.com",
        friendly_name: "Amazon Simple Queue Service (Amazon SQS)",
    },
    SupportedService {
        service_name: "lambda",
        service_principal: "lambda.amazonaws.com",
        friendly_name: "AWS Lambda",
    },
    SupportedService {
        service_name: "elasticfilesystem",
        service_principal: "elasticfilesystem.amazonaws.com",
        friendly_name: "Amazon Elastic File System (Amazon EFS)",
    },
    SupportedService {
        service_name: "secretsmanager",
        service_principal: "secretsmanager.amazonaws.com",
        friendly_name: "AWS Secrets Manager",
    },
    SupportedService {
        service_name: "iot",
        service_principal: "iot.amazonaws.com",
        friendly_name: "AWS IoT",
    },
    SupportedService {
        service_name: "kms",
        service_principal: "kms.amazonaws.com",
        friendly_name: "AWS Key Management Service (KMS)",
    },
    SupportedService {
        service_name: "apigateway",
        service_principal: "apigateway.amazonaws.com",
        friendly_name: "Amazon API Gateway",
    },
    SupportedService {
        service_name: "events",
        service_principal: "events.amazonaws.com",
        friendly_name: "Amazon EventBridge",
    },
    SupportedService {
        service_name: "ses",
        service_principal: "ses.amazonaws.com",
        friendly_name: "Amazon Simple Email Service (SES)",
    },
    SupportedService {
        service_name: "ecr",
        service_principal: "ecr.amazonaws.com",
        friendly_name: "Amazon Elastic Container Registry",
    },
    SupportedService {
        service_name: "config",
        service_principal: "config.amazonaws.com",
        friendly_name: "AWS Config",
    },
    SupportedService {
        service_name: "ssm_incidents",
        service_principal: "ssm-incidents.amazonaws.com",
        friendly_name: "AWS Systems Manager Incident Manager",
    },
    SupportedService {
        service_name: "opensearchservice",
        service_principal: "opensearchservice.amazonaws.com",
        friendly_name: "Amazon OpenSearch Service",
    },
    SupportedService {
        service_name: "cloudformation",
        service_principal: "cloudformation.amazonaws.com",
        friendly_name: "AWS CloudFormation",
    },
    SupportedService {
        service_name: "glue",
        service_principal: "glue.amazonaws.com",
        friendly_name: "AWS Glue",
    },
    SupportedService {
        service_name: "serverlessrepo",
        service_principal: "serverlessrepo.amazonaws.com",
        friendly_name: "AWS Serverless Application Repository",
    },
    SupportedService {
        service_name: "backup",
        service_principal: "backup.amazonaws.com",
        friendly_name: "AWS Backup",
    },
    SupportedService {
        service_name: "codeartifact",
        service_principal: "codeartifact.amazonaws.com",
        friendly_name: "AWS CodeArtifact",
    },
    SupportedService {
        service_name: "codebuild",
        service_principal: "codebuild.amazonaws.com",
        friendly_name: "AWS CodeBuild",
    },
    SupportedService {
        service_name: "mediastore",
        service_principal: "mediastore.amazonaws.com",
        friendly_name: "AWS Elemental MediaStore",
    },
    SupportedService {
        service_name: "ec2",
        service_principal: "ec2.amazonaws.com",
        friendly_name: "Amazon VPC (VPC Endpoints)",
    },
];

/// 资源策略扫描支持的区域全集
pub static SUPPORTED_REGIONS: &[SupportedRegion] = &[
    SupportedRegion {
        region: "us-east-1",
        region_name: "US East (N. Virginia)",
    },
    SupportedRegion {
        region: "us-east-2",
        region_name: "US East (Ohio)",
    },
    SupportedRegion {
        region: "us-west-1",
        region_name: "US West (N. California)",
    },
    SupportedRegion {
        region: "us-west-2",
        region_name: "US West (Oregon)",
    },
    SupportedRegion {
        region: "af-south-1",
        region_name: "Africa (Cape Town) [Opt-In Required]",
    },
    SupportedRegion {
        region: "ap-east-1",
        region_name: "Asia Pacific (Hong Kong) [Opt-In Required]",
    },
    SupportedRegion {
        region: "ap-southeast-1",
        region_name: "Asia Pacific (Singapore)",
    },
    SupportedRegion {
        region: "ap-southeast-2",
        region_name: "Asia Pacific (Sydney)",
    },
    SupportedRegion {
        region: "ap-southeast-3",
        region_name: "Asia Pacific (Jakarta) [Opt-In Required]",
    },
    SupportedRegion {
        region: "ap-south-1",
        region_name: "Asia Pacific (Mumbai)",
    },
    SupportedRegion {
        region: "ap-northeast-3",
        region_name: "Asia Pacific (Osaka)",
    },
    SupportedRegion {
        region: "ap-northeast-2",
        region_name: "Asia Pacific (Seoul)",
    },
    SupportedRegion {
        region: "ap-northeast-1",
        region_name: "Asia Pacific (Tokyo)",
    },
    SupportedRegion {
        region: "ca-central-1",
        region_name: "Canada (Central)",
    },
    SupportedRegion {
        region: "eu-central-1",
        region_name: "Europe (Frankfurt)",
    },
    SupportedRegion {
        region: "eu-west-3",
        region_name: "Europe (Paris)",
    },
    SupportedRegion {
        region: "eu-west-2",
        region_name: "Europe (London)",
    },
    SupportedRegion {
        region: "eu-west-1",
        region_name: "Europe (Ireland)",
    },
    SupportedRegion {
        region: "eu-north-1",
        region_name: "Europe (Stockholm)",
    },
    SupportedRegion {
        region: "eu-south-1",
        region_name: "Europe (Milan) [Opt-In Required]",
    },
    SupportedRegion {
        region: "me-south-1",
        region_name: "Middle East (Bahrain) [Opt-In Required]",
    },
    SupportedRegion {
        region: "me-central-1",
        region_name: "Middle East (UAE) [Opt-In Required]",
    },
    SupportedRegion {
        region: "sa-east-1",
        region_name: "South America (Sao Paulo)",
    },
];

/// 全部受支持的服务名
pub fn service_names() -> Vec<String> {
    SUPPORTED_SERVICES
        .iter()
        .map(|s| s.service_name.to_string())
        .collect()
}

/// 全部受支持的区域名
pub fn region_names() -> Vec<String> {
    SUPPORTED_REGIONS
        .iter()
        .map(|r| r.region.to_string())
        .collect()
}

pub fn is_supported_service(name: &str) -> bool {
    SUPPORTED_SERVICES.iter().any(|s| s.service_name == name)
}

pub fn is_supported_region(name: &str) -> bool {
    SUPPORTED_REGIONS.iter().any(|r| r.region == name)
}

/// 把请求的服务列表裁剪到受支持的子集
///
/// 省略表示"全部受支持的"。
pub fn narrow_services(requested: Option<&[String]>) -> Vec<String> {
    match requested {
        Some(names) => names
            .iter()
            .filter(|name| is_supported_service(name))
            .cloned()
            .collect(),
        None => service_names(),
    }
}

/// 把请求的区域列表裁剪到受支持的子集
pub fn narrow_regions(requested: Option<&[String]>) -> Vec<String> {
    match requested {
        Some(names) => names
            .iter()
            .filter(|name| is_supported_region(name))
            .cloned()
            .collect(),
        None => region_names(),
    }
}
