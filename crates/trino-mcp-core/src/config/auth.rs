//! Authentication configuration types.
//!
//! Three modes are supported:
//! 1. `basic` - user and password sent as HTTP basic credentials
//! 2. `bearer` - a single access token sent as a bearer token
//! 3. `ddauth` - an access token plus a Datadog identity JWT, minted by
//!    external commands and refreshed on demand

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How the gateway authenticates to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthMode {
    /// HTTP basic credentials from user and password.
    Basic,
    /// Static or minted bearer token, no identity JWT.
    Bearer,
    /// Identity-provider brokered: access token plus identity JWT.
    #[default]
    IdentityBrokered,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthMode::Basic),
            "bearer" | "jwt" => Ok(AuthMode::Bearer),
            "ddauth" | "datadog" => Ok(AuthMode::IdentityBrokered),
            other => Err(format!(
                "unknown auth type '{}', expected basic, bearer or ddauth",
                other
            )),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Basic => f.write_str("basic"),
            AuthMode::Bearer => f.write_str("bearer"),
            AuthMode::IdentityBrokered => f.write_str("ddauth"),
        }
    }
}

/// A credential value that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw value. Only header builders should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Identity attributes forwarded to the engine as extra credentials.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentityConfig {
    pub org_id: Option<String>,
    pub client_id: Option<String>,
    pub user_uuid: Option<String>,
    /// Datacenter passed to the minting commands.
    pub datacenter: String,
}

/// An external command split into program and arguments.
///
/// The `{datacenter}` placeholder in any argument is substituted at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Split a template on whitespace. Returns `None` for a blank template.
    pub fn parse(template: &str) -> Option<Self> {
        let mut words = template.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    /// Arguments with `{datacenter}` substituted.
    pub fn render_args(&self, datacenter: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{datacenter}", datacenter))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Authentication settings consumed by the credential manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub identity: IdentityConfig,
    /// Pre-minted access token.
    pub access_token: Option<Secret>,
    /// Pre-minted identity JWT.
    pub identity_token: Option<Secret>,
    /// Re-mint on every header request instead of reusing until forced.
    pub always_refresh: bool,
    pub jwt_command: CommandSpec,
    pub token_command: CommandSpec,
    /// Deadline for a single minting command.
    pub mint_timeout: Duration,
}

pub(crate) const DEFAULT_DATACENTER: &str = "us1.prod.dog";
pub(crate) const DEFAULT_JWT_COMMAND: &str =
    "ddtool auth token rapid-trino --datacenter {datacenter}";
pub(crate) const DEFAULT_TOKEN_COMMAND: &str =
    "ddtool auth token rapid-trino-access --datacenter {datacenter}";
pub(crate) const DEFAULT_MINT_TIMEOUT_SECS: u64 = 30;

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            identity: IdentityConfig {
                datacenter: DEFAULT_DATACENTER.to_string(),
                ..Default::default()
            },
            access_token: None,
            identity_token: None,
            always_refresh: false,
            jwt_command: CommandSpec::parse(DEFAULT_JWT_COMMAND).unwrap_or(CommandSpec {
                program: "ddtool".to_string(),
                args: Vec::new(),
            }),
            token_command: CommandSpec::parse(DEFAULT_TOKEN_COMMAND).unwrap_or(CommandSpec {
                program: "ddtool".to_string(),
                args: Vec::new(),
            }),
            mint_timeout: Duration::from_secs(DEFAULT_MINT_TIMEOUT_SECS),
        }
    }
}
