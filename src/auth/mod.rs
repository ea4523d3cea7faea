//! Credential resolution and header injection for tracking-server calls.
//!
//! Per-call flow:
//! 1. **Classify** — the tracking URI is classified once at construction as
//!    a Hokusai proxy or a generic server ([`endpoint`]).
//! 2. **Snapshot** — the credential set is re-read from its source on every
//!    call, so rotated secrets apply without restart ([`credentials`]).
//! 3. **Inject** — one scheme is selected by fixed precedence and placed on
//!    the outbound headers ([`headers`]).

pub mod credentials;
pub mod endpoint;
pub mod headers;

pub use credentials::{
    redact_secret, CredentialSet, CredentialSource, CredentialVars, EnvCredentials,
    StaticCredentials,
};
pub use endpoint::{classify_endpoint, EndpointKind};
pub use headers::{inject_auth, resolve_scheme, AuthScheme, API_KEY_HEADER};
