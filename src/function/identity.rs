//! Function identity and path suffix derivation.
//!
//! Every platform encodes the identity of a deployed action differently:
//!
//! | platform   | native identity                                   |
//! |------------|---------------------------------------------------|
//! | aws        | `arn:aws:lambda:<region>:<account>:function:<name>:<4_3_1>` |
//! | azure      | `<package>--<name>_<1_45_0>` function name        |
//! | google     | `<package>--<name>_<1_45_0>` service name         |
//! | cloudflare | `<package>--<name>_<1_45_0>` script name          |
//! | openwhisk  | `/<namespace>/<package>/<name>@<1.45.0>`          |
//!
//! The helpers here turn those strings into a [`FunctionIdentity`]. The owning app is
//! always supplied by the caller from the platform's tenant or API identifier. When the
//! native string carries no version, the configured fallback is used; without one the
//! identity cannot be derived.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between package and function name in packaged names.
pub const PACKAGE_SEPARATOR: &str = "--";

/// Qualifier Lambda uses for the unpublished version of a function.
const LATEST_QUALIFIER: &str = "$LATEST";

/// Errors raised while parsing native identity strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("malformed function arn: {0}")]
    MalformedArn(String),
    #[error("malformed action name: {0}")]
    MalformedActionName(String),
    #[error("empty function name")]
    EmptyName,
    #[error("invalid version {0:?}, expected major.minor.patch")]
    InvalidVersion(String),
    #[error("function {0} carries no version and none is configured")]
    MissingVersion(String),
}

/// Logical identity of a deployed action.
///
/// `version` is always `major.minor.patch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionIdentity {
    pub name: String,
    pub version: String,
    pub app: String,
}

impl FunctionIdentity {
    /// Build an identity, normalizing `version` (`4_3_1` and `4.3.1` are both accepted).
    pub fn new(
        name: impl Into<String>,
        version: impl AsRef<str>,
        app: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdentityError::EmptyName);
        }
        Ok(Self {
            name,
            version: normalize_version(version.as_ref())?,
            app: app.into(),
        })
    }

    /// Derive identity from a Lambda invocation ARN.
    ///
    /// The version is the alias the function was invoked through. An unqualified ARN,
    /// or one qualified with `$LATEST`, falls back to `fallback_version`. A packaged function name (`pkg--name`)
    /// contributes only its name part.
    pub fn from_lambda_arn(
        arn: &str,
        app: impl Into<String>,
        fallback_version: Option<&str>,
    ) -> Result<Self, IdentityError> {
        let parts: Vec<&str> = arn.split(':').collect();
        let well_formed = matches!(parts.len(), 7 | 8)
            && parts[0] == "arn"
            && parts[2] == "lambda"
            && parts[5] == "function"
            && !parts[6].is_empty();
        if !well_formed {
            return Err(IdentityError::MalformedArn(arn.to_string()));
        }

        let mut packaged = PackagedName::parse(parts[6])?;
        if let Some(alias) = parts.get(7).filter(|alias| **alias != LATEST_QUALIFIER) {
            packaged.version = Some(alias.to_string());
        }
        packaged.into_identity(app, fallback_version)
    }

    /// Derive identity from an activation action name such as `/ns/pkg/name@1.2.3`.
    ///
    /// The namespace becomes the app. A missing `@version` falls back to
    /// `fallback_version`.
    pub fn from_action_name(
        action: &str,
        fallback_version: Option<&str>,
    ) -> Result<Self, IdentityError> {
        let malformed = || IdentityError::MalformedActionName(action.to_string());
        let (path, version) = match action.rsplit_once('@') {
            Some((path, version)) if !version.is_empty() => (path, Some(version)),
            Some(_) => return Err(malformed()),
            None => (action, fallback_version),
        };

        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            [namespace, _, name] | [namespace, name]
                if !namespace.is_empty() && !name.is_empty() =>
            {
                let version = version.ok_or_else(|| IdentityError::MissingVersion(name.to_string()))?;
                Self::new(*name, version, *namespace)
            }
            _ => Err(malformed()),
        }
    }
}

/// A `package--name_major_minor_patch` string split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedName {
    pub package: Option<String>,
    pub name: String,
    /// Dot-separated version, when the string carried one.
    pub version: Option<String>,
}

impl PackagedName {
    /// Parse a packaged function name.
    ///
    /// The package is split off first. The version is the trailing run of three
    /// numeric underscore-separated components, so names may contain underscores
    /// themselves.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let (package, rest) = match raw.split_once(PACKAGE_SEPARATOR) {
            Some((package, rest)) if !package.is_empty() => (Some(package.to_string()), rest),
            _ => (None, raw),
        };

        let parts: Vec<&str> = rest.split('_').collect();
        let (name, version) = if parts.len() >= 4 && parts[parts.len() - 3..].iter().all(|s| is_numeric(s)) {
            let split = parts.len() - 3;
            (parts[..split].join("_"), Some(parts[split..].join(".")))
        } else {
            (rest.to_string(), None)
        };

        if name.is_empty() {
            return Err(IdentityError::EmptyName);
        }
        Ok(Self {
            package,
            name,
            version,
        })
    }

    /// Build the identity, with `fallback_version` used when none was encoded.
    pub fn into_identity(
        self,
        app: impl Into<String>,
        fallback_version: Option<&str>,
    ) -> Result<FunctionIdentity, IdentityError> {
        let version = match (self.version.as_deref(), fallback_version) {
            (Some(version), _) | (None, Some(version)) => version.to_string(),
            (None, None) => return Err(IdentityError::MissingVersion(self.fqn())),
        };
        FunctionIdentity::new(self.name, version, app)
    }

    /// The string this name was parsed from, in canonical form.
    pub fn fqn(&self) -> String {
        let mut out = String::new();
        if let Some(package) = &self.package {
            out.push_str(package);
            out.push_str(PACKAGE_SEPARATOR);
        }
        out.push_str(&self.name);
        if let Some(version) = &self.version {
            out.push('_');
            out.push_str(&version.replace('.', "_"));
        }
        out
    }
}

/// Normalize a version into `major.minor.patch`.
///
/// Underscores are accepted as separators (`4_3_1` → `4.3.1`). Anything that is not
/// exactly three numeric components is rejected.
pub fn normalize_version(raw: &str) -> Result<String, IdentityError> {
    let normalized = raw.trim().replace('_', ".");
    let components: Vec<&str> = normalized.split('.').collect();
    if components.len() != 3 || !components.iter().all(|c| is_numeric(c)) {
        return Err(IdentityError::InvalidVersion(raw.to_string()));
    }
    Ok(normalized)
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Join routing segments into a path prefix, skipping empty ones.
///
/// `routing_prefix(&["api", "pkg", "name", "1.0.0"])` is `/api/pkg/name/1.0.0`.
pub fn routing_prefix(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .fold(String::new(), |mut acc, s| {
            acc.push('/');
            acc.push_str(s);
            acc
        })
}

/// Strip the routing prefix from an inbound path.
///
/// The prefix only matches on a segment boundary. When it does not match, the whole
/// path is the suffix. The result is empty or starts with `/`.
pub fn path_suffix(path: &str, prefix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let suffix = match path.strip_prefix(prefix) {
        Some(rest) if !prefix.is_empty() && (rest.is_empty() || rest.starts_with('/')) => rest,
        _ => path,
    };
    if suffix.is_empty() || suffix.starts_with('/') {
        suffix.to_string()
    } else {
        format!("/{}", suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lambda_arn_with_alias() {
        let identity = FunctionIdentity::from_lambda_arn(
            "arn:aws:lambda:us-east-1:118435662149:function:dump:4_3_1",
            "kvvyh7ikcb",
            None,
        )
        .unwrap();
        assert_eq!(identity, FunctionIdentity::new("dump", "4.3.1", "kvvyh7ikcb").unwrap());
    }

    #[test]
    fn test_lambda_arn_unqualified_and_packaged() {
        let arn = "arn:aws:lambda:eu-west-1:1:function:helix-services--dump";
        let identity = FunctionIdentity::from_lambda_arn(arn, "api", Some("2_1_0")).unwrap();
        assert_eq!(identity.name, "dump");
        assert_eq!(identity.version, "2.1.0");

        assert_eq!(
            FunctionIdentity::from_lambda_arn(arn, "api", None),
            Err(IdentityError::MissingVersion("helix-services--dump".into()))
        );
    }

    #[test]
    fn test_lambda_arn_latest_qualifier_uses_fallback() {
        let arn = "arn:aws:lambda:us-east-1:1:function:dump:$LATEST";
        let identity = FunctionIdentity::from_lambda_arn(arn, "app", Some("1.0.0")).unwrap();
        assert_eq!(identity.version, "1.0.0");
        assert!(matches!(
            FunctionIdentity::from_lambda_arn(arn, "app", None),
            Err(IdentityError::MissingVersion(_))
        ));
        assert!(matches!(
            FunctionIdentity::from_lambda_arn("arn:aws:lambda:us-east-1:1:function:dump:prod", "app", None),
            Err(IdentityError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_lambda_arn_malformed() {
        assert!(matches!(
            FunctionIdentity::from_lambda_arn("dump", "app", Some("1.0.0")),
            Err(IdentityError::MalformedArn(_))
        ));
    }

    #[test]
    fn test_version_is_always_three_components() {
        assert_eq!(normalize_version("4_3_1").unwrap(), "4.3.1");
        assert_eq!(normalize_version("1.45.0").unwrap(), "1.45.0");
        for bad in ["latest", "$LATEST", "1.2", "1.2.3.4", "1..3", "a.b.c", ""] {
            assert_eq!(
                normalize_version(bad),
                Err(IdentityError::InvalidVersion(bad.to_string())),
                "{}",
                bad
            );
        }
        assert!(FunctionIdentity::new("dump", "latest", "app").is_err());
        assert_eq!(FunctionIdentity::new("", "1.0.0", "app"), Err(IdentityError::EmptyName));
    }

    #[test]
    fn test_packaged_name() {
        let parsed = PackagedName::parse("simple-package--simple-name_1_45_0").unwrap();
        assert_eq!(parsed.package.as_deref(), Some("simple-package"));
        assert_eq!(parsed.name, "simple-name");
        assert_eq!(parsed.version.as_deref(), Some("1.45.0"));
        assert_eq!(parsed.fqn(), "simple-package--simple-name_1_45_0");
    }

    #[test]
    fn test_packaged_name_with_underscores_and_no_version() {
        let parsed = PackagedName::parse("my_fn_2_0_1").unwrap();
        assert_eq!(parsed.package, None);
        assert_eq!(parsed.name, "my_fn");
        assert_eq!(parsed.version.as_deref(), Some("2.0.1"));

        let bare = PackagedName::parse("pkg--worker").unwrap();
        assert_eq!(bare.name, "worker");
        assert_eq!(bare.version, None);
        assert_eq!(bare.clone().into_identity("acct", Some("3.0.0")).unwrap().version, "3.0.0");
        assert_eq!(
            bare.clone().into_identity("acct", None),
            Err(IdentityError::MissingVersion("pkg--worker".into()))
        );
        assert!(matches!(
            bare.into_identity("acct", Some("latest")),
            Err(IdentityError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_action_name() {
        let identity = FunctionIdentity::from_action_name("/helix/pkg/dump@4.3.1", None).unwrap();
        assert_eq!(identity, FunctionIdentity::new("dump", "4.3.1", "helix").unwrap());
        assert!(FunctionIdentity::from_action_name("dump@", None).is_err());

        let unversioned = FunctionIdentity::from_action_name("/helix/dump", Some("1.0.0")).unwrap();
        assert_eq!(unversioned.version, "1.0.0");
        assert_eq!(
            FunctionIdentity::from_action_name("/helix/dump", None),
            Err(IdentityError::MissingVersion("dump".into()))
        );
    }

    #[test]
    fn test_path_suffix() {
        let prefix = routing_prefix(&["api", "simple-package", "simple-name", "1.45.0"]);
        assert_eq!(prefix, "/api/simple-package/simple-name/1.45.0");
        assert_eq!(
            path_suffix("/api/simple-package/simple-name/1.45.0/foo", &prefix),
            "/foo"
        );
        assert_eq!(path_suffix("/api/simple-package/simple-name/1.45.0", &prefix), "");
        assert_eq!(path_suffix("/other/foo", &prefix), "/other/foo");
        assert_eq!(
            path_suffix("/api/simple-package/simple-name/1.45.01", &prefix),
            "/api/simple-package/simple-name/1.45.01"
        );
        assert_eq!(path_suffix("", ""), "");
    }
}
