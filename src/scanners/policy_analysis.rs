// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;

pub const AWS_PRINCIPAL_ORG_ID: &str = "aws:PrincipalOrgID";
pub const AWS_PRINCIPAL_ORG_PATHS: &str = "aws:PrincipalOrgPaths";
pub const AWS_RESOURCE_ORG_ID: &str = "aws:ResourceOrgID";
pub const AWS_RESOURCE_ORG_PATHS: &str = "aws:ResourceOrgPaths";

const ORG_CONTEXT_KEYS: [&str; 4] = [
    AWS_PRINCIPAL_ORG_ID,
    AWS_PRINCIPAL_ORG_PATHS,
    AWS_RESOURCE_ORG_ID,
    AWS_RESOURCE_ORG_PATHS,
];

/// 策略文档中对组织的依赖
///
/// 条件结构为 Condition : { 操作符 : { 上下文键 : 取值 }}，
/// 只有上下文键命中组织相关全局键的语句才构成依赖。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgDependency {
    pub resource_name: String,
    pub global_context_key: String,
    pub organizations_resource: String,
}

fn is_org_context_key(key: &str) -> bool {
    ORG_CONTEXT_KEYS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(key))
}

fn condition_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn dependencies_in_statement(resource_name: &str, statement: &Value, out: &mut Vec<OrgDependency>) {
    let Some(condition) = statement.get("Condition").and_then(Value::as_object) else {
        return;
    };
    for key_values in condition.values().filter_map(Value::as_object) {
        for (context_key, value) in key_values {
            if is_org_context_key(context_key) {
                let dependency = OrgDependency {
                    resource_name: resource_name.to_string(),
                    global_context_key: context_key.clone(),
                    organizations_resource: condition_value_to_string(value),
                };
                if !out.contains(&dependency) {
                    out.push(dependency);
                }
            }
        }
    }
}

/// 策略文档中的语句集合
///
/// Statement 可以是单对象或数组，缺失时返回空集。
pub fn statements(policy: &Value) -> Vec<&Value> {
    match policy.get("Statement") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
        None => Vec::new(),
    }
}

/// 在策略文档中查找对组织的依赖
///
/// 接受 JSON 字符串形式的策略文档；解析失败或没有 Statement 时
/// 返回空集。结果按出现顺序去重。
pub fn find_org_dependencies(resource_name: &str, policy_document: &str) -> Vec<OrgDependency> {
    let Ok(policy) = serde_json::from_str::<Value>(policy_document) else {
        return Vec::new();
    };

    let mut dependencies = Vec::new();
    for statement in statements(&policy) {
        dependencies_in_statement(resource_name, statement, &mut dependencies);
    }
    dependencies
}
