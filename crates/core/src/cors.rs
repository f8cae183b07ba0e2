use std::collections::BTreeSet;

use serde::Serialize;

/// URL scope every environment policy applies to.
pub const API_SCOPE: &str = "/v1/api/**";

const LOCAL_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://10.74.0.123:3000",
    "https://campaign-controller.apps.stegienko.local",
];
const DEV_ORIGINS: &[&str] = &["https://campaign-controller-dev.apps.stegienko.local"];
const STAGE_ORIGINS: &[&str] = &["https://campaign-controller-stage.apps.stegienko.com"];

/// Deployment tiers that carry a cross-origin policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentProfile {
    Local,
    Dev,
    Stage,
}

impl EnvironmentProfile {
    /// Order in which active profiles are tested; the first hit wins.
    pub const PRIORITY: [EnvironmentProfile; 3] = [Self::Local, Self::Dev, Self::Stage];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Stage => "stage",
        }
    }

    /// Parses an exact profile identifier.
    pub fn parse(value: &str) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|profile| profile.as_str() == value)
    }

    /// Returns the literal access policy for this profile.
    pub fn policy(self) -> AccessPolicy {
        let origins = match self {
            Self::Local => LOCAL_ORIGINS,
            Self::Dev => DEV_ORIGINS,
            Self::Stage => STAGE_ORIGINS,
        };
        AccessPolicy::permissive(origins)
    }
}

/// Either a wildcard or an explicit set of allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowList {
    Any,
    Only(BTreeSet<String>),
}

impl AllowList {
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

/// Cross-origin rules applied to a URL scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPolicy {
    pub scope: String,
    pub allowed_origins: Vec<String>,
    pub allowed_methods: AllowList,
    pub allowed_headers: AllowList,
    pub allow_credentials: bool,
}

impl AccessPolicy {
    fn permissive(origins: &[&str]) -> Self {
        Self {
            scope: API_SCOPE.to_string(),
            allowed_origins: origins.iter().map(|origin| origin.to_string()).collect(),
            allowed_methods: AllowList::Any,
            allowed_headers: AllowList::Any,
            allow_credentials: true,
        }
    }

    /// Path prefix the policy is mounted under.
    pub fn route_prefix(&self) -> &str {
        scope_prefix(&self.scope)
    }
}

/// Strips the trailing `/**` glob from a URL scope.
pub fn scope_prefix(scope: &str) -> &str {
    scope
        .strip_suffix("/**")
        .unwrap_or_else(|| scope.trim_end_matches('/'))
}

/// Outcome of matching the active profiles against the known set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileResolution {
    Matched(EnvironmentProfile),
    /// No known profile was active; carries what was active for diagnostics.
    Unrecognized(Vec<String>),
}

impl ProfileResolution {
    pub fn profile(&self) -> Option<EnvironmentProfile> {
        match self {
            Self::Matched(profile) => Some(*profile),
            Self::Unrecognized(_) => None,
        }
    }
}

/// Picks the highest-priority known profile among the active identifiers.
pub fn resolve_profile<I, S>(active: I) -> ProfileResolution
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let active: Vec<String> = active
        .into_iter()
        .map(|profile| profile.as_ref().to_string())
        .collect();

    let matched = EnvironmentProfile::PRIORITY
        .into_iter()
        .find(|candidate| active.iter().any(|value| value == candidate.as_str()));

    match matched {
        Some(profile) => ProfileResolution::Matched(profile),
        None => ProfileResolution::Unrecognized(active),
    }
}

/// Resolves the access policy for the active profiles.
///
/// Returns `None` when no known profile is active, in which case no
/// cross-origin mapping may be registered for [`API_SCOPE`].
pub fn resolve<I, S>(active: I) -> Option<AccessPolicy>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    resolve_profile(active)
        .profile()
        .map(EnvironmentProfile::policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn local_profile_yields_local_origins() {
        let policy = resolve(["local"]).expect("local policy");
        assert_eq!(
            policy.allowed_origins,
            vec![
                "http://localhost:3000",
                "http://10.74.0.123:3000",
                "https://campaign-controller.apps.stegienko.local",
            ]
        );
        assert_eq!(policy.scope, "/v1/api/**");
        assert!(policy.allowed_methods.is_any());
        assert!(policy.allowed_headers.is_any());
        assert!(policy.allow_credentials);
    }

    #[test]
    fn dev_and_stage_have_single_origins() {
        let dev = resolve(["dev"]).expect("dev policy");
        assert_eq!(
            dev.allowed_origins,
            vec!["https://campaign-controller-dev.apps.stegienko.local"]
        );

        let stage = resolve(["stage"]).expect("stage policy");
        assert_eq!(
            stage.allowed_origins,
            vec!["https://campaign-controller-stage.apps.stegienko.com"]
        );
    }

    #[test]
    fn priority_order_beats_declaration_order() {
        assert_eq!(
            resolve(["stage", "local"]),
            Some(EnvironmentProfile::Local.policy())
        );
        assert_eq!(
            resolve_profile(["stage", "dev"]),
            ProfileResolution::Matched(EnvironmentProfile::Dev)
        );
    }

    #[test]
    fn unrecognized_profiles_resolve_to_no_policy() {
        assert_eq!(resolve(["production"]), None);
        assert_eq!(
            resolve_profile(["production", "LOCAL"]),
            ProfileResolution::Unrecognized(vec!["production".into(), "LOCAL".into()])
        );
    }

    #[test]
    fn empty_profile_set_resolves_to_no_policy() {
        let none: [&str; 0] = [];
        assert_eq!(resolve(none), None);
    }

    #[test]
    fn resolution_is_repeatable() {
        let active = vec!["dev".to_string(), "stage".to_string()];
        assert_eq!(resolve(&active), resolve(&active));
    }

    #[test]
    fn route_prefix_strips_glob() {
        let policy = EnvironmentProfile::Dev.policy();
        assert_eq!(policy.route_prefix(), "/v1/api");
        assert_eq!(scope_prefix("/v2/"), "/v2");
    }

    #[test]
    fn parse_accepts_exact_identifiers_only() {
        assert_eq!(EnvironmentProfile::parse("stage"), Some(EnvironmentProfile::Stage));
        assert_eq!(EnvironmentProfile::parse("Stage"), None);
    }

    #[test]
    fn policy_serializes_with_wildcards() {
        let value = serde_json::to_value(EnvironmentProfile::Stage.policy()).expect("serialize");
        assert_eq!(value["allowed_methods"], json!("any"));
        assert_eq!(value["allow_credentials"], json!(true));
    }
}
