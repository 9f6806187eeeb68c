// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Overview graph types and flattening into service status rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const PROJECT_URL_BASE: &str = "https://railway.app/project";

/// Five-value health summary derived from the latest deployment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
    Healthy,
    Deploying,
    Degraded,
    Down,
    Unknown,
}

impl Health {
    /// Map an upstream deployment status string to a health value.
    ///
    /// Case-insensitive; unmapped or absent statuses are `Unknown`.
    pub fn from_status(status: Option<&str>) -> Self {
        let Some(status) = status else {
            return Self::Unknown;
        };
        match status.to_ascii_uppercase().as_str() {
            "FAILED" | "CRASHED" | "REMOVED" => Self::Down,
            "BUILDING" | "DEPLOYING" | "QUEUED" | "WAITING" => Self::Deploying,
            "SUCCESS" => Self::Healthy,
            "SLEEPING" => Self::Degraded,
            _ => Self::Unknown,
        }
    }
}

// -- Overview graph (provider wire shapes) ------------------------------------

/// Relay-style `{ edges: [ { node } ] }` connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct Connection<T> {
    #[serde(default)]
    pub edges: Vec<Edge<T>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverviewData {
    #[serde(default)]
    pub me: Option<Viewer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Viewer {
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub projects: Connection<Project>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub environments: Connection<EnvironmentNode>,
    #[serde(default)]
    pub services: Connection<Service>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentNode {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub service_instances: Connection<ServiceInstance>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    pub id: String,
    pub environment_id: String,
    #[serde(default)]
    pub latest_deployment: Option<Deployment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

// -- Flattened rows -----------------------------------------------------------

/// One service-environment status row of the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRow {
    pub project_id: String,
    pub project_name: String,
    pub service_id: String,
    pub service_name: String,
    pub environment_id: String,
    pub environment_name: String,
    pub health: Health,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deploy_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deploy_at: Option<String>,
    pub railway_url: String,
}

/// Flatten the overview graph into status rows, preserving traversal order.
///
/// A service with no instances still yields exactly one placeholder row so
/// it stays visible on the dashboard.
pub fn flatten_overview(data: &OverviewData) -> Vec<ServiceRow> {
    let mut rows = Vec::new();
    let workspaces = data.me.as_ref().map(|v| v.workspaces.as_slice()).unwrap_or_default();

    for workspace in workspaces {
        for project_edge in &workspace.projects.edges {
            let project = &project_edge.node;
            let env_names: HashMap<&str, &str> = project
                .environments
                .edges
                .iter()
                .map(|e| (e.node.id.as_str(), e.node.name.as_str()))
                .collect();

            for service_edge in &project.services.edges {
                let service = &service_edge.node;
                let instances = &service.service_instances.edges;

                for instance_edge in instances {
                    let instance = &instance_edge.node;
                    let deployment = instance.latest_deployment.as_ref();
                    rows.push(ServiceRow {
                        project_id: project.id.clone(),
                        project_name: project.name.clone(),
                        service_id: service.id.clone(),
                        service_name: service.name.clone(),
                        environment_id: instance.environment_id.clone(),
                        environment_name: env_names
                            .get(instance.environment_id.as_str())
                            .copied()
                            .unwrap_or("unknown")
                            .to_owned(),
                        health: Health::from_status(deployment.and_then(|d| d.status.as_deref())),
                        last_deploy_status: deployment.and_then(|d| d.status.clone()),
                        last_deploy_at: deployment.and_then(|d| d.created_at.clone()),
                        railway_url: format!(
                            "{PROJECT_URL_BASE}/{}?environmentId={}",
                            project.id, instance.environment_id
                        ),
                    });
                }

                if instances.is_empty() {
                    rows.push(ServiceRow {
                        project_id: project.id.clone(),
                        project_name: project.name.clone(),
                        service_id: service.id.clone(),
                        service_name: service.name.clone(),
                        environment_id: String::new(),
                        environment_name: "—".to_owned(),
                        health: Health::Unknown,
                        last_deploy_status: None,
                        last_deploy_at: None,
                        railway_url: format!("{PROJECT_URL_BASE}/{}", project.id),
                    });
                }
            }
        }
    }

    rows
}

#[cfg(test)]
#[path = "overview_tests.rs"]
mod tests;
