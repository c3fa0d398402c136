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

/// Configuration file environment variable
pub const CONF_FILE_ENV: &str = "GKE_AT_SCALE_CONF_FILE";

/// Name prefix limits
pub const MAX_PREFIX_LEN: usize = 5;

/// Google APIs enabled on the project before anything else
pub const DEFAULT_SERVICES: &[&str] = &["compute.googleapis.com", "container.googleapis.com"];

/// APIs added when fleet features are enabled
pub const FLEET_SERVICES: &[&str] = &[
    "artifactregistry.googleapis.com",
    "mesh.googleapis.com",
    "anthos.googleapis.com",
    "gkehub.googleapis.com",
];

/// Firewall configuration
pub const FIREWALL_PORTS: &[&str] = &["80", "8080", "443"];
pub const HEALTH_CHECK_SOURCE_RANGES: &[&str] = &["35.191.0.0/16", "130.211.0.0/22"];
pub const APP_INGRESS_SOURCE_RANGES: &[&str] = &["0.0.0.0/0"];
pub const APP_ACCESS_TARGET_TAG: &str = "gke-app-access";

/// Service accounts
pub const ADMIN_SERVICE_ACCOUNT_ID: &str = "svc-gke-at-scale-admin";
pub const AUTONEG_SERVICE_ACCOUNT_ID: &str = "autoneg-system";
pub const AUTONEG_K8S_NAMESPACE: &str = "autoneg-system";
pub const AUTONEG_K8S_SERVICE_ACCOUNT: &str = "autoneg-controller-manager";
pub const WORKLOAD_IDENTITY_USER_ROLE: &str = "roles/iam.workloadIdentityUser";

/// Permissions granted to the AutoNeg controller
pub const AUTONEG_PERMISSIONS: &[&str] = &[
    "compute.backendServices.get",
    "compute.backendServices.update",
    "compute.regionBackendServices.get",
    "compute.regionBackendServices.update",
    "compute.networkEndpointGroups.use",
    "compute.healthChecks.useReadOnly",
    "compute.regionHealthChecks.useReadOnly",
];

/// Workload identity pool
pub const WORKLOAD_IDENTITY_PURPOSE: &str = "gke";
pub const WORKLOAD_IDENTITY_HASH_LEN: usize = 6;
pub const RESERVED_POOL_PREFIX: &str = "gcp-";

/// Fleet, registry and cluster setup commands
pub const FLEET_LOCATION: &str = "global";
pub const ARTIFACT_REGISTRY_FORMAT: &str = "DOCKER";
pub const DEFAULT_REGISTRY_LOCATION: &str = "europe";
pub const DEFAULT_REGISTRY_ID: &str = "gke-at-scale";
pub const DEFAULT_SETUP_SCRIPT: &str = "./gke-config/setup.sh";
pub const DEFAULT_TEARDOWN_SCRIPT: &str = "./gke-config/delete.sh";
pub const ASMCLI_COMMAND: &str = "asmcli";

/// Load balancer
pub const HTTP_PORT: u16 = 80;
pub const HTTPS_PORT: u16 = 443;
pub const LOAD_BALANCING_SCHEME: &str = "EXTERNAL";
pub const HEALTH_CHECK_PORT: u16 = 80;
pub const HEALTH_CHECK_INTERVAL_SEC: u32 = 1;
pub const HEALTH_CHECK_TIMEOUT_SEC: u32 = 1;
pub const HEALTH_CHECK_HEALTHY_THRESHOLD: u32 = 4;
pub const HEALTH_CHECK_UNHEALTHY_THRESHOLD: u32 = 5;
pub const BACKEND_CDN_TTL_SEC: u32 = 5;
pub const BACKEND_CONNECTION_DRAINING_SEC: u32 = 10;
pub const AUTONEG_MAX_RATE_PER_ENDPOINT: u32 = 100;
pub const PATH_MATCHER_ALL_PATHS: &str = "all-paths";

/// GKE clusters and node pools
pub const MASTER_AUTHORIZED_CIDR: &str = "0.0.0.0/0";
pub const DEFAULT_MACHINE_TYPE: &str = "e2-medium";
pub const DEFAULT_LOCATION_POLICY: &str = "BALANCED";
pub const DEFAULT_MIN_NODES: u32 = 1;
pub const DEFAULT_MAX_NODES: u32 = 5;
pub const NODE_POOL_SUFFIX: &str = "np-01";
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Kubeconfig exec plugin
pub const KUBECONFIG_API_VERSION: &str = "v1";
pub const KUBECONFIG_KIND: &str = "Config";
pub const EXEC_API_VERSION: &str = "client.authentication.k8s.io/v1beta1";
pub const EXEC_COMMAND: &str = "gke-gcloud-auth-plugin";
pub const EXEC_INSTALL_HINT: &str = "Install gke-gcloud-auth-plugin for use with kubectl by following https://cloud.google.com/blog/products/containers-kubernetes/kubectl-auth-changes-in-gke";

/// Istio service mesh charts
pub const ISTIO_REPOSITORY: &str = "https://istio-release.storage.googleapis.com/charts";
pub const ISTIO_NAMESPACE: &str = "istio-system";
pub const ISTIO_DEFAULT_REVISION: &str = "default";
pub const CHART_ISTIO_BASE: &str = "base";
pub const CHART_ISTIOD: &str = "istiod";
pub const CHART_ISTIO_GATEWAY: &str = "gateway";
pub const INGRESS_GATEWAY_RELEASE: &str = "istio-ingressgateway";

/// Local application charts
pub const DEFAULT_CHART_PATH: &str = "../apps/helm";
pub const DEFAULT_CHART_VERSION: &str = "0.1.0";
pub const CHART_CLUSTER_OPS: &str = "cluster-ops";
pub const CHART_APP_TEAM: &str = "app-team";

/// Application namespace
pub const DEFAULT_APP_NAMESPACE: &str = "app-team";
pub const LABEL_ISTIO_INJECTION: &str = "istio-injection";
pub const LABEL_ISTIO_INJECTION_VALUE: &str = "enabled";

/// Annotations
pub const ANNOTATION_GKE_NEG: &str = "cloud.google.com/neg";
pub const ANNOTATION_AUTONEG: &str = "controller.autoneg.dev/neg";
pub const ANNOTATION_LB_TYPE: &str = "networking.gke.io/load-balancer-type";
pub const ANNOTATION_GCP_SERVICE_ACCOUNT: &str = "iam.gke.io/gcp-service-account";

/// Application branding defaults
pub const DEFAULT_CUSTOMER: &str = "Pulumi Developers";
pub const DEFAULT_COLOR_PRIMARY: &str = "#805ac3";
pub const DEFAULT_COLOR_SECONDARY: &str = "#4d5bd9";
pub const DEFAULT_COLOR_BACKGROUND: &str = "#f7bf2a";
pub const DEFAULT_PLATFORM: &str = "GKE";

/// Description prefix for every declared resource
pub const DESCRIPTION_PREFIX: &str = "GKE at Scale";
