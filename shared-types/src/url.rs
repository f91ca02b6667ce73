use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static VALID_USER: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[a-z0-9][a-zA-Z0-9+.-]+$"));
static VALID_SERIES: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[a-z]+([a-z-]+[a-z])?$"));
static VALID_NAME: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^[a-z][a-z0-9]*(-[a-z0-9]*[a-z][a-z0-9]*)*$"));

#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static charm URL pattern")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("charm URL has invalid schema: {0:?}")]
    InvalidSchema(String),

    #[error("charm URL has invalid form: {0:?}")]
    InvalidForm(String),

    #[error("local charm URL with user name: {0:?}")]
    LocalWithUser(String),

    #[error("charm URL has invalid user name: {0:?}")]
    InvalidUser(String),

    #[error("charm URL without series: {0:?}")]
    MissingSeries(String),

    #[error("charm URL has invalid series: {0:?}")]
    InvalidSeries(String),

    #[error("charm URL has invalid charm name: {0:?}")]
    InvalidName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    /// Charms published to the store.
    Store,
    /// Charms from a local repository; these never carry a user.
    Local,
}

impl Schema {
    pub fn as_str(self) -> &'static str {
        match self {
            Schema::Store => "cs",
            Schema::Local => "local",
        }
    }
}

/// Identifies a charm: `<schema>:[~<user>/]<series>/<name>[-<revision>]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharmUrl {
    pub schema: Schema,
    pub user: Option<String>,
    pub series: String,
    pub name: String,
    pub revision: Option<u32>,
}

impl CharmUrl {
    /// Storage path shared by every revision of this charm.
    pub fn to_path(&self) -> String {
        match &self.user {
            Some(user) => format!("~{}/{}/{}", user, self.series, self.name),
            None => format!("{}/{}", self.series, self.name),
        }
    }

    pub fn with_revision(&self, revision: u32) -> Self {
        Self {
            revision: Some(revision),
            ..self.clone()
        }
    }
}

impl FromStr for CharmUrl {
    type Err = UrlError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let (schema, rest) = match url.split_once(':') {
            Some(("cs", rest)) => (Schema::Store, rest),
            Some(("local", rest)) => (Schema::Local, rest),
            _ => return Err(UrlError::InvalidSchema(url.to_string())),
        };

        let mut parts: Vec<&str> = rest.split('/').collect();
        if parts.len() > 3 {
            return Err(UrlError::InvalidForm(url.to_string()));
        }

        let mut user = None;
        if let Some(name) = parts[0].strip_prefix('~') {
            if schema == Schema::Local {
                return Err(UrlError::LocalWithUser(url.to_string()));
            }
            if !VALID_USER.is_match(name) {
                return Err(UrlError::InvalidUser(url.to_string()));
            }
            user = Some(name.to_string());
            parts.remove(0);
        }

        let &[series, name] = parts.as_slice() else {
            return Err(if parts.len() < 2 {
                UrlError::MissingSeries(url.to_string())
            } else {
                UrlError::InvalidForm(url.to_string())
            });
        };
        if !VALID_SERIES.is_match(series) {
            return Err(UrlError::InvalidSeries(url.to_string()));
        }

        let (name, revision) = split_revision(name);
        if !VALID_NAME.is_match(name) {
            return Err(UrlError::InvalidName(url.to_string()));
        }

        Ok(Self {
            schema,
            user,
            series: series.to_string(),
            name: name.to_string(),
            revision,
        })
    }
}

/// Splits a trailing `-<digits>` revision off a charm name.
fn split_revision(name: &str) -> (&str, Option<u32>) {
    if let Some((base, rev)) = name.rsplit_once('-') {
        if !base.is_empty() && !rev.is_empty() && rev.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(revision) = rev.parse() {
                return (base, Some(revision));
            }
        }
    }
    (name, None)
}

impl fmt::Display for CharmUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema.as_str(), self.to_path())?;
        if let Some(revision) = self.revision {
            write!(f, "-{revision}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_parse_store_url() {
        let url: CharmUrl = "cs:oneiric/wordpress-42".parse().unwrap();
        assert_eq!(url.schema, Schema::Store);
        assert_eq!(url.user, None);
        assert_eq!(url.series, "oneiric");
        assert_eq!(url.name, "wordpress");
        assert_eq!(url.revision, Some(42));
        assert_eq!(url.to_string(), "cs:oneiric/wordpress-42");
    }

    #[test]
    fn test_parse_user_url() {
        let url: CharmUrl = "cs:~charmers/precise/mysql".parse().unwrap();
        assert_eq!(url.user.as_deref(), Some("charmers"));
        assert_eq!(url.series, "precise");
        assert_eq!(url.name, "mysql");
        assert_eq!(url.revision, None);
        assert_eq!(url.to_path(), "~charmers/precise/mysql");
        assert_eq!(url.to_string(), "cs:~charmers/precise/mysql");
    }

    #[test]
    fn test_hyphenated_names() {
        let url: CharmUrl = "local:trusty/haproxy-ssl".parse().unwrap();
        assert_eq!(url.schema, Schema::Local);
        assert_eq!(url.name, "haproxy-ssl");
        assert_eq!(url.revision, None);

        let url: CharmUrl = "cs:trusty/mongo-db2-3".parse().unwrap();
        assert_eq!(url.name, "mongo-db2");
        assert_eq!(url.revision, Some(3));
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            ("oneiric/wordpress", UrlError::InvalidSchema("oneiric/wordpress".into())),
            ("bs:oneiric/wordpress", UrlError::InvalidSchema("bs:oneiric/wordpress".into())),
            ("cs:a/b/c/d", UrlError::InvalidForm("cs:a/b/c/d".into())),
            ("cs:wordpress", UrlError::MissingSeries("cs:wordpress".into())),
            ("cs:~user/a/b/c", UrlError::InvalidForm("cs:~user/a/b/c".into())),
            ("local:~user/series/name", UrlError::LocalWithUser("local:~user/series/name".into())),
            ("cs:~Bad/series/name", UrlError::InvalidUser("cs:~Bad/series/name".into())),
            ("cs:Series/name", UrlError::InvalidSeries("cs:Series/name".into())),
            ("cs:series/1name", UrlError::InvalidName("cs:series/1name".into())),
            ("cs:series/name-", UrlError::InvalidName("cs:series/name-".into())),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<CharmUrl>().unwrap_err(), expected, "{input}");
        }
    }

    #[test]
    fn test_error_message() {
        let err = "cs:".parse::<CharmUrl>().unwrap_err();
        assert_eq!(err.to_string(), "charm URL without series: \"cs:\"");
    }

    #[test]
    fn test_with_revision() {
        let url: CharmUrl = "cs:precise/mysql".parse().unwrap();
        assert_eq!(url.with_revision(5).to_string(), "cs:precise/mysql-5");
    }
}
