//! Environment-driven access policy for the campaign controller HTTP surface.

pub mod cors;

pub use cors::{
    resolve, resolve_profile, scope_prefix, AccessPolicy, AllowList, EnvironmentProfile,
    ProfileResolution, API_SCOPE,
};
