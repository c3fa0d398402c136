// Copyright 2025 JiangLong.
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

//! Load balancer front end: URL maps, proxies and forwarding rules

use crate::domain::config::PlannerConfig;
use crate::domain::plan::graph::{DependencySet, ResourceHandle, ResourceKind, ResourceRequest};
use crate::domain::plan::naming::ResourceNames;
use crate::infrastructure::constants::*;
use crate::infrastructure::provider::ResourceProvider;
use crate::shared::error::PlanError;
use serde_json::json;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadBalancerMode {
    /// HTTPS chain plus an HTTP map redirecting to it
    Https { domain: String },
    /// HTTP map routing straight to the backend service
    HttpOnly,
}

impl LoadBalancerMode {
    pub fn from_domain(domain: Option<&str>) -> Self {
        match domain.map(str::trim) {
            Some(d) if !d.is_empty() => LoadBalancerMode::Https {
                domain: d.to_string(),
            },
            _ => LoadBalancerMode::HttpOnly,
        }
    }

    pub fn https_redirect(&self) -> bool {
        matches!(self, LoadBalancerMode::Https { .. })
    }

    pub fn domain(&self) -> Option<&str> {
        match self {
            LoadBalancerMode::Https { domain } => Some(domain),
            LoadBalancerMode::HttpOnly => None,
        }
    }
}

/// Handles declared by the load balancer wiring
#[derive(Debug, Clone)]
pub struct LoadBalancerOutputs {
    pub mode: LoadBalancerMode,
    pub ssl_certificate: Option<ResourceHandle>,
    pub https_forwarding_rule: Option<ResourceHandle>,
    pub http_url_map: ResourceHandle,
    pub http_forwarding_rule: ResourceHandle,
    pub declared: Vec<ResourceHandle>,
}

pub struct LoadBalancerWiring<'a> {
    provider: &'a dyn ResourceProvider,
    config: &'a PlannerConfig,
    names: ResourceNames,
    prerequisites: &'a DependencySet,
    address: &'a ResourceHandle,
    backend_service: &'a ResourceHandle,
}

impl<'a> LoadBalancerWiring<'a> {
    pub fn new(
        provider: &'a dyn ResourceProvider,
        config: &'a PlannerConfig,
        prerequisites: &'a DependencySet,
        address: &'a ResourceHandle,
        backend_service: &'a ResourceHandle,
    ) -> Self {
        Self {
            provider,
            config,
            names: ResourceNames::new(config.prefix.clone()),
            prerequisites,
            address,
            backend_service,
        }
    }

    pub async fn declare(&self, mode: LoadBalancerMode) -> Result<LoadBalancerOutputs, PlanError> {
        let mut declared = Vec::new();
        let mut ssl_certificate = None;
        let mut https_forwarding_rule = None;

        if let LoadBalancerMode::Https { domain } = &mode {
            info!("Declaring HTTPS chain for domain {}", domain);
            let (cert, rule, handles) = self.declare_https_chain(domain).await?;
            ssl_certificate = Some(cert);
            https_forwarding_rule = Some(rule);
            declared.extend(handles);
        }

        let http_url_map = self.declare_http_url_map(&mode).await?;
        declared.push(http_url_map.clone());

        let http_proxy = self
            .provider
            .declare(
                ResourceRequest::new(ResourceKind::TargetHttpProxy, self.names.http_proxy())
                    .attr("project", self.config.project.as_str())
                    .attr("name", self.names.http_proxy())
                    .input("urlMap", &http_url_map, "selfLink")
                    .depends_on(self.prerequisites),
            )
            .await?;
        declared.push(http_proxy.clone());

        let http_forwarding_rule = self
            .provider
            .declare(
                self.forwarding_rule(self.names.http_forwarding_rule(), HTTP_PORT)
                    .input("target", &http_proxy, "selfLink"),
            )
            .await?;
        declared.push(http_forwarding_rule.clone());

        Ok(LoadBalancerOutputs {
            mode,
            ssl_certificate,
            https_forwarding_rule,
            http_url_map,
            http_forwarding_rule,
            declared,
        })
    }

    async fn declare_https_chain(
        &self,
        domain: &str,
    ) -> Result<(ResourceHandle, ResourceHandle, Vec<ResourceHandle>), PlanError> {
        let cert = self
            .provider
            .declare(
                ResourceRequest::new(
                    ResourceKind::ManagedSslCertificate,
                    self.names.ssl_certificate(),
                )
                .attr("project", self.config.project.as_str())
                .attr("name", self.names.ssl_certificate())
                .attr(
                    "description",
                    format!("{} - Global Load Balancer - Managed SSL Certificate", DESCRIPTION_PREFIX),
                )
                .attr("type", "MANAGED")
                .attr("managed", json!({ "domains": [domain] }))
                .depends_on(self.prerequisites),
            )
            .await?;

        let url_map = self
            .provider
            .declare(
                ResourceRequest::new(ResourceKind::UrlMap, self.names.https_url_map())
                    .attr("project", self.config.project.as_str())
                    .attr("name", self.names.https_url_map_name())
                    .attr(
                        "description",
                        format!("{} - Global Load Balancer - HTTPS URL Map", DESCRIPTION_PREFIX),
                    )
                    .input("defaultService", self.backend_service, "selfLink")
                    .depends_on(self.prerequisites),
            )
            .await?;

        let proxy = self
            .provider
            .declare(
                ResourceRequest::new(ResourceKind::TargetHttpsProxy, self.names.https_proxy())
                    .attr("project", self.config.project.as_str())
                    .attr("name", self.names.https_proxy())
                    .input("urlMap", &url_map, "selfLink")
                    .attr("sslCertificates", json!([cert.self_link()]))
                    .after(&cert)
                    .depends_on(self.prerequisites),
            )
            .await?;

        let rule = self
            .provider
            .declare(
                self.forwarding_rule(self.names.https_forwarding_rule(), HTTPS_PORT)
                    .input("target", &proxy, "selfLink"),
            )
            .await?;

        let handles = vec![cert.clone(), url_map, proxy, rule.clone()];
        Ok((cert, rule, handles))
    }

    async fn declare_http_url_map(
        &self,
        mode: &LoadBalancerMode,
    ) -> Result<ResourceHandle, PlanError> {
        let redirect = mode.https_redirect();
        let mut request = ResourceRequest::new(ResourceKind::UrlMap, self.names.http_url_map(redirect))
            .attr("project", self.config.project.as_str())
            .attr("name", self.names.http_url_map_name())
            .attr(
                "description",
                format!("{} - Global Load Balancer - HTTP URL Map", DESCRIPTION_PREFIX),
            )
            .input("defaultService", self.backend_service, "selfLink")
            .attr("httpsRedirect", redirect)
            .depends_on(self.prerequisites);

        if let Some(domain) = mode.domain() {
            request = request
                .attr(
                    "hostRules",
                    json!([{
                        "hosts": [domain],
                        "pathMatcher": PATH_MATCHER_ALL_PATHS,
                        "description": "Default Route All Paths",
                    }]),
                )
                .attr(
                    "pathMatchers",
                    json!([{
                        "name": PATH_MATCHER_ALL_PATHS,
                        "defaultService": self.backend_service.self_link(),
                        "pathRules": [{
                            "paths": ["/*"],
                            "urlRedirect": {
                                "stripQuery": false,
                                "httpsRedirect": true,
                            },
                        }],
                    }]),
                );
        }

        self.provider.declare(request).await
    }

    fn forwarding_rule(&self, name: String, port: u16) -> ResourceRequest {
        ResourceRequest::new(ResourceKind::GlobalForwardingRule, name)
            .attr("project", self.config.project.as_str())
            .input("ipAddress", self.address, "selfLink")
            .attr("portRange", port.to_string())
            .attr("loadBalancingScheme", LOAD_BALANCING_SCHEME)
            .depends_on(self.prerequisites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_domain() {
        assert_eq!(LoadBalancerMode::from_domain(None), LoadBalancerMode::HttpOnly);
        assert_eq!(LoadBalancerMode::from_domain(Some("  ")), LoadBalancerMode::HttpOnly);

        let mode = LoadBalancerMode::from_domain(Some("shop.example.com"));
        assert!(mode.https_redirect());
        assert_eq!(mode.domain(), Some("shop.example.com"));
        assert!(!LoadBalancerMode::HttpOnly.https_redirect());
    }
}
