// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GraphQL client for the provider's gateway API.
//!
//! The GraphQL documents are treated as an opaque external contract; the
//! rest of the crate only sees the narrow typed operations below, so the
//! provider's schema can evolve (or be mocked) without touching the
//! session, refresh, or streaming logic.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::upstream::logs::LogEntry;
use crate::upstream::overview::OverviewData;

const OVERVIEW_QUERY: &str = r#"
  query overview {
    me {
      workspaces {
        id
        name
        projects {
          edges {
            node {
              id
              name
              environments {
                edges {
                  node {
                    id
                    name
                  }
                }
              }
              services {
                edges {
                  node {
                    id
                    name
                    serviceInstances {
                      edges {
                        node {
                          id
                          environmentId
                          latestDeployment {
                            id
                            status
                            createdAt
                            meta
                          }
                        }
                      }
                    }
                  }
                }
              }
            }
          }
        }
      }
    }
  }
"#;

const ENVIRONMENT_LOGS_QUERY: &str = r#"
  query environmentLogs(
    $environmentId: String!
    $filter: String
    $beforeLimit: Int
  ) {
    environmentLogs(
      environmentId: $environmentId
      filter: $filter
      beforeLimit: $beforeLimit
    ) {
      message
      severity
      timestamp
      tags {
        deploymentId
        serviceId
      }
    }
  }
"#;

const REDEPLOY_MUTATION: &str = r#"
  mutation serviceInstanceRedeploy($serviceId: String!, $environmentId: String!) {
    serviceInstanceRedeploy(serviceId: $serviceId, environmentId: $environmentId)
  }
"#;

/// Authenticated GraphQL client for one request's access token.
pub struct ApiClient<'a> {
    api_url: &'a str,
    token: &'a str,
    http: &'a reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
struct GraphQlResponse<T> {
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl<'a> ApiClient<'a> {
    pub fn new(http: &'a reqwest::Client, api_url: &'a str, token: &'a str) -> Self {
        Self { api_url, token, http }
    }

    /// POST a GraphQL request and return the `data` payload.
    ///
    /// A GraphQL-level error array fails with the first error's message.
    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> anyhow::Result<T> {
        let body = serde_json::json!({ "query": query, "variables": variables });
        let resp = self
            .http
            .post(self.api_url)
            .bearer_auth(self.token)
            .json(&body)
            .send()
            .await?;

        let envelope: GraphQlResponse<T> = resp.error_for_status()?.json().await?;
        if let Some(first) = envelope.errors.first() {
            anyhow::bail!("{}", first.message);
        }
        envelope.data.ok_or_else(|| anyhow::anyhow!("GraphQL response missing data"))
    }

    /// Fetch the workspace → project → service overview graph.
    pub async fn fetch_overview_graph(&self) -> anyhow::Result<OverviewData> {
        self.query(OVERVIEW_QUERY, serde_json::Value::Null).await
    }

    /// Fetch one page of environment logs, newest first.
    pub async fn fetch_log_page(
        &self,
        environment_id: &str,
        service_id: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<LogEntry>> {
        let variables = serde_json::json!({
            "environmentId": environment_id,
            "filter": format!("@service:{service_id}"),
            "beforeLimit": limit,
        });

        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct LogsData {
            #[serde(default)]
            environment_logs: Vec<LogEntry>,
        }

        let data: LogsData = self.query(ENVIRONMENT_LOGS_QUERY, variables).await?;
        Ok(data.environment_logs)
    }

    /// Trigger a redeploy of a service instance; returns the new deployment id.
    pub async fn redeploy(
        &self,
        service_id: &str,
        environment_id: &str,
    ) -> anyhow::Result<String> {
        let variables = serde_json::json!({
            "serviceId": service_id,
            "environmentId": environment_id,
        });

        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RedeployData {
            service_instance_redeploy: String,
        }

        let data: RedeployData = self.query(REDEPLOY_MUTATION, variables).await?;
        Ok(data.service_instance_redeploy)
    }
}
