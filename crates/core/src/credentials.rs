//! Credential resolution
//!
//! Credentials are resolved by an ordered chain of sources; the first source
//! that produces a value wins. When none does, the transport falls back to
//! its own default discovery chain.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::params::CredentialParams;

/// Environment variable naming a local profile
pub const ENV_PROFILE: &str = "AWS_PROFILE";
/// Environment variable holding an access key
pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY";
/// Environment variable holding a secret key
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_KEY";

/// Resolved credentials handed to the transport factory
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSpec {
    /// Named profile from the shared AWS configuration files
    Profile(String),
    /// Explicit key pair
    Static {
        access_key_id: String,
        secret_access_key: String,
    },
    /// Let the transport use its default credential chain
    Ambient,
}

impl CredentialSpec {
    pub fn is_ambient(&self) -> bool {
        matches!(self, CredentialSpec::Ambient)
    }
}

impl std::fmt::Debug for CredentialSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSpec::Profile(name) => f.debug_tuple("Profile").field(name).finish(),
            CredentialSpec::Static { access_key_id, .. } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .finish(),
            CredentialSpec::Ambient => f.write_str("Ambient"),
        }
    }
}

/// Read access to environment variables
pub trait Environment: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Knows which named profiles exist locally
pub trait ProfileCatalog: Send + Sync {
    fn contains(&self, profile: &str) -> Result<bool>;
}

/// Profile catalog backed by the AWS shared credentials and config files
#[derive(Debug, Clone)]
pub struct SharedProfileFiles {
    credentials_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
}

impl SharedProfileFiles {
    /// Locate the shared files the way the AWS tooling does
    ///
    /// `AWS_SHARED_CREDENTIALS_FILE` and `AWS_CONFIG_FILE` override the
    /// defaults under `~/.aws/`.
    pub fn from_env(env: &dyn Environment) -> Self {
        let aws_dir = dirs::home_dir().map(|home| home.join(".aws"));
        let credentials_file = env
            .var("AWS_SHARED_CREDENTIALS_FILE")
            .map(PathBuf::from)
            .or_else(|| aws_dir.as_ref().map(|d| d.join("credentials")));
        let config_file = env
            .var("AWS_CONFIG_FILE")
            .map(PathBuf::from)
            .or_else(|| aws_dir.as_ref().map(|d| d.join("config")));
        Self {
            credentials_file,
            config_file,
        }
    }

    /// Use explicit file locations (useful for testing)
    pub fn with_paths(credentials_file: Option<PathBuf>, config_file: Option<PathBuf>) -> Self {
        Self {
            credentials_file,
            config_file,
        }
    }

    fn sections(path: &Option<PathBuf>) -> Result<Vec<String>> {
        let Some(path) = path else {
            return Ok(Vec::new());
        };
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(content
            .lines()
            .filter_map(section_header)
            .map(str::to_string)
            .collect())
    }
}

/// Section name of a `[name]` header line
///
/// Anything after the closing bracket must be blank or a `#`/`;` comment.
fn section_header(line: &str) -> Option<&str> {
    let (name, rest) = line.trim().strip_prefix('[')?.split_once(']')?;
    let rest = rest.trim_start();
    (rest.is_empty() || rest.starts_with(['#', ';'])).then_some(name.trim())
}

impl ProfileCatalog for SharedProfileFiles {
    fn contains(&self, profile: &str) -> Result<bool> {
        if Self::sections(&self.credentials_file)?
            .iter()
            .any(|s| s == profile)
        {
            return Ok(true);
        }
        // Config file sections are written as `[profile name]`, except default
        Ok(Self::sections(&self.config_file)?.iter().any(|s| {
            s.strip_prefix("profile ").map(str::trim) == Some(profile)
                || (s == "default" && profile == "default")
        }))
    }
}

/// Inputs shared by every credential source
pub struct ResolveContext<'a> {
    pub env: &'a dyn Environment,
    pub profiles: &'a dyn ProfileCatalog,
}

impl ResolveContext<'_> {
    fn env_var(&self, name: &str) -> Option<String> {
        self.env.var(name).filter(|v| !v.is_empty())
    }

    fn checked_profile(&self, name: &str) -> Result<CredentialSpec> {
        if self.profiles.contains(name)? {
            Ok(CredentialSpec::Profile(name.to_string()))
        } else {
            Err(Error::Credentials(format!(
                "Profile {name} not found in the shared AWS configuration"
            )))
        }
    }
}

/// One step of the credential chain
pub trait CredentialSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce credentials, or `Ok(None)` to defer to the next source
    fn resolve(
        &self,
        params: Option<&CredentialParams>,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<CredentialSpec>>;
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// `params.profile`
pub struct ExplicitProfile;

impl CredentialSource for ExplicitProfile {
    fn name(&self) -> &'static str {
        "explicit profile"
    }

    fn resolve(
        &self,
        params: Option<&CredentialParams>,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<CredentialSpec>> {
        params
            .and_then(|p| non_empty(&p.profile))
            .map(|name| ctx.checked_profile(name))
            .transpose()
    }
}

/// `params.accessKeyId` + `params.secretAccessKey`
pub struct ExplicitKeys;

impl CredentialSource for ExplicitKeys {
    fn name(&self) -> &'static str {
        "explicit keys"
    }

    fn resolve(
        &self,
        params: Option<&CredentialParams>,
        _ctx: &ResolveContext<'_>,
    ) -> Result<Option<CredentialSpec>> {
        let Some(params) = params else {
            return Ok(None);
        };
        Ok(
            match (
                non_empty(&params.access_key_id),
                non_empty(&params.secret_access_key),
            ) {
                (Some(access), Some(secret)) => Some(CredentialSpec::Static {
                    access_key_id: access.to_string(),
                    secret_access_key: secret.to_string(),
                }),
                _ => None,
            },
        )
    }
}

/// `AWS_PROFILE`
pub struct EnvProfile;

impl CredentialSource for EnvProfile {
    fn name(&self) -> &'static str {
        "environment profile"
    }

    fn resolve(
        &self,
        _params: Option<&CredentialParams>,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<CredentialSpec>> {
        ctx.env_var(ENV_PROFILE)
            .map(|name| ctx.checked_profile(&name))
            .transpose()
    }
}

/// `AWS_ACCESS_KEY` + `AWS_SECRET_KEY`
pub struct EnvKeys;

impl CredentialSource for EnvKeys {
    fn name(&self) -> &'static str {
        "environment keys"
    }

    fn resolve(
        &self,
        _params: Option<&CredentialParams>,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<CredentialSpec>> {
        Ok(
            match (ctx.env_var(ENV_ACCESS_KEY), ctx.env_var(ENV_SECRET_KEY)) {
                (Some(access_key_id), Some(secret_access_key)) => Some(CredentialSpec::Static {
                    access_key_id,
                    secret_access_key,
                }),
                _ => None,
            },
        )
    }
}

/// Ordered credential chain
pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
    env: Arc<dyn Environment>,
    profiles: Arc<dyn ProfileCatalog>,
}

impl CredentialResolver {
    /// Standard chain over the process environment and shared AWS files
    pub fn new() -> Self {
        let env: Arc<dyn Environment> = Arc::new(ProcessEnv);
        let profiles = Arc::new(SharedProfileFiles::from_env(env.as_ref()));
        Self::with_context(env, profiles)
    }

    /// Standard chain over a custom environment and profile catalog
    pub fn with_context(env: Arc<dyn Environment>, profiles: Arc<dyn ProfileCatalog>) -> Self {
        Self {
            sources: Self::default_sources(),
            env,
            profiles,
        }
    }

    /// Explicit params first, then the environment
    pub fn default_sources() -> Vec<Box<dyn CredentialSource>> {
        vec![
            Box::new(ExplicitProfile),
            Box::new(ExplicitKeys),
            Box::new(EnvProfile),
            Box::new(EnvKeys),
        ]
    }

    /// Append a source at the end of the chain
    pub fn push_source(&mut self, source: Box<dyn CredentialSource>) {
        self.sources.push(source);
    }

    /// Resolve credentials; `Ambient` when no source matches
    pub fn resolve(&self, params: Option<&CredentialParams>) -> Result<CredentialSpec> {
        let ctx = ResolveContext {
            env: self.env.as_ref(),
            profiles: self.profiles.as_ref(),
        };
        for source in &self.sources {
            if let Some(spec) = source.resolve(params, &ctx)? {
                tracing::debug!(source = source.name(), "Resolved credentials");
                return Ok(spec);
            }
        }
        tracing::debug!("No explicit credentials, using ambient chain");
        Ok(CredentialSpec::Ambient)
    }
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Profiles(Vec<&'static str>);

    impl ProfileCatalog for Profiles {
        fn contains(&self, profile: &str) -> Result<bool> {
            Ok(self.0.iter().any(|p| *p == profile))
        }
    }

    fn resolver(env: &[(&str, &str)], profiles: Vec<&'static str>) -> CredentialResolver {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CredentialResolver::with_context(Arc::new(env), Arc::new(Profiles(profiles)))
    }

    #[test]
    fn test_explicit_profile_wins() {
        let r = resolver(&[(ENV_PROFILE, "envprof")], vec!["render", "envprof"]);
        let params = CredentialParams {
            profile: Some("render".into()),
            access_key_id: Some("AK".into()),
            secret_access_key: Some("SK".into()),
        };
        assert_eq!(
            r.resolve(Some(&params)).unwrap(),
            CredentialSpec::Profile("render".into())
        );
    }

    #[test]
    fn test_explicit_profile_missing_fails_fast() {
        let r = resolver(&[], vec![]);
        let err = r
            .resolve(Some(&CredentialParams::profile("ghost")))
            .unwrap_err();
        assert!(matches!(err, Error::Credentials(_)));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_explicit_keys_before_env() {
        let r = resolver(
            &[(ENV_ACCESS_KEY, "ENVAK"), (ENV_SECRET_KEY, "ENVSK")],
            vec![],
        );
        let spec = r.resolve(Some(&CredentialParams::keys("AK", "SK"))).unwrap();
        assert_eq!(
            spec,
            CredentialSpec::Static {
                access_key_id: "AK".into(),
                secret_access_key: "SK".into()
            }
        );
    }

    #[test]
    fn test_half_key_pair_is_ignored() {
        let r = resolver(&[], vec![]);
        let params = CredentialParams {
            access_key_id: Some("AK".into()),
            ..Default::default()
        };
        assert_eq!(r.resolve(Some(&params)).unwrap(), CredentialSpec::Ambient);
    }

    #[test]
    fn test_env_profile_before_env_keys() {
        let r = resolver(
            &[
                (ENV_PROFILE, "farm"),
                (ENV_ACCESS_KEY, "ENVAK"),
                (ENV_SECRET_KEY, "ENVSK"),
            ],
            vec!["farm"],
        );
        assert_eq!(r.resolve(None).unwrap(), CredentialSpec::Profile("farm".into()));
    }

    #[test]
    fn test_env_profile_missing_fails_fast() {
        let r = resolver(&[(ENV_PROFILE, "nope")], vec![]);
        assert!(matches!(r.resolve(None), Err(Error::Credentials(_))));
    }

    #[test]
    fn test_env_keys() {
        let r = resolver(
            &[(ENV_ACCESS_KEY, "ENVAK"), (ENV_SECRET_KEY, "ENVSK")],
            vec![],
        );
        assert_eq!(
            r.resolve(None).unwrap(),
            CredentialSpec::Static {
                access_key_id: "ENVAK".into(),
                secret_access_key: "ENVSK".into()
            }
        );
    }

    #[test]
    fn test_ambient_fallback() {
        let r = resolver(&[(ENV_PROFILE, "")], vec![]);
        assert!(r.resolve(None).unwrap().is_ambient());
        assert!(r.resolve(Some(&CredentialParams::default())).unwrap().is_ambient());
    }

    #[test]
    fn test_custom_source_appended() {
        struct Fixed;
        impl CredentialSource for Fixed {
            fn name(&self) -> &'static str {
                "fixed"
            }
            fn resolve(
                &self,
                _: Option<&CredentialParams>,
                _: &ResolveContext<'_>,
            ) -> Result<Option<CredentialSpec>> {
                Ok(Some(CredentialSpec::Profile("fixed".into())))
            }
        }

        let mut r = resolver(&[], vec![]);
        r.push_source(Box::new(Fixed));
        assert_eq!(r.resolve(None).unwrap(), CredentialSpec::Profile("fixed".into()));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let spec = CredentialSpec::Static {
            access_key_id: "AK".into(),
            secret_access_key: "topsecret".into(),
        };
        let debug = format!("{spec:?}");
        assert!(debug.contains("AK"));
        assert!(!debug.contains("topsecret"));
    }

    #[test]
    fn test_shared_profile_files() {
        let dir = TempDir::new().unwrap();
        let credentials = dir.path().join("credentials");
        let config = dir.path().join("config");
        std::fs::write(
            &credentials,
            "[default]\naws_access_key_id = a\n\n[render]\naws_access_key_id = b\n",
        )
        .unwrap();
        std::fs::write(&config, "[profile spaces]\nregion = nyc3\n").unwrap();

        let catalog = SharedProfileFiles::with_paths(Some(credentials), Some(config));
        assert!(catalog.contains("default").unwrap());
        assert!(catalog.contains("render").unwrap());
        assert!(catalog.contains("spaces").unwrap());
        assert!(!catalog.contains("profile spaces").unwrap());
        assert!(!catalog.contains("missing").unwrap());
    }

    #[test]
    fn test_section_headers_with_comments() {
        assert_eq!(section_header("[render] # farm creds"), Some("render"));
        assert_eq!(section_header("  [ spaces ];nyc3"), Some("spaces"));
        assert_eq!(section_header("[profile ci]"), Some("profile ci"));
        assert_eq!(section_header("[broken] trailing"), None);
        assert_eq!(section_header("# [commented]"), None);
        assert_eq!(section_header("region = us-east-1"), None);
    }

    #[test]
    fn test_shared_profile_files_commented_headers() {
        let dir = TempDir::new().unwrap();
        let credentials = dir.path().join("credentials");
        let config = dir.path().join("config");
        std::fs::write(
            &credentials,
            "[render] # farm creds\naws_access_key_id = a\naws_secret_access_key = b\n",
        )
        .unwrap();
        std::fs::write(&config, "[profile spaces] ; nyc3\nregion = nyc3\n").unwrap();

        let catalog = SharedProfileFiles::with_paths(Some(credentials), Some(config));
        assert!(catalog.contains("render").unwrap());
        assert!(catalog.contains("spaces").unwrap());

        let env: HashMap<String, String> = HashMap::new();
        let r = CredentialResolver::with_context(Arc::new(env), Arc::new(catalog));
        assert_eq!(
            r.resolve(Some(&CredentialParams::profile("render"))).unwrap(),
            CredentialSpec::Profile("render".into())
        );
    }

    #[test]
    fn test_shared_profile_files_absent() {
        let dir = TempDir::new().unwrap();
        let catalog = SharedProfileFiles::with_paths(
            Some(dir.path().join("nope")),
            None,
        );
        assert!(!catalog.contains("default").unwrap());
    }
}
