//! Matcher model and rule table.

use std::path::{Path, PathBuf};

use authcore_core::{AuthcoreError, AuthcoreResult};
use serde::Deserialize;

const BUILTIN_MODEL: &str = include_str!("../policies/rbac_model.conf");
const BUILTIN_POLICY: &str = include_str!("../policies/rbac_policy.csv");

/// Where to read the policy from. Unset paths fall back to the built-in
/// files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub model_path: Option<PathBuf>,
    pub policy_path: Option<PathBuf>,
}

/// One line of the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRule {
    /// `p, sub, obj, act`
    Permission {
        subject: String,
        object: String,
        action: String,
    },
    /// `g, member, role`: `member` inherits everything `role` may do.
    Inheritance { member: String, role: String },
}

/// A parsed model definition plus rule table, loaded once at startup.
#[derive(Debug, Clone)]
pub struct PolicySource {
    model: String,
    rules: Vec<PolicyRule>,
}

impl PolicySource {
    pub fn parse(model: impl Into<String>, policy: &str) -> AuthcoreResult<Self> {
        let rules = policy
            .lines()
            .enumerate()
            .filter_map(|(n, line)| {
                let line = line.trim();
                (!line.is_empty() && !line.starts_with('#')).then_some((n + 1, line))
            })
            .map(|(n, line)| parse_rule(n, line))
            .collect::<AuthcoreResult<Vec<_>>>()?;
        Ok(Self {
            model: model.into(),
            rules,
        })
    }

    pub fn builtin() -> AuthcoreResult<Self> {
        Self::parse(BUILTIN_MODEL, BUILTIN_POLICY)
    }

    pub async fn from_files(model_path: &Path, policy_path: &Path) -> AuthcoreResult<Self> {
        let model = read(model_path).await?;
        let policy = read(policy_path).await?;
        Self::parse(model, &policy)
    }

    pub async fn from_config(config: &PolicyConfig) -> AuthcoreResult<Self> {
        let model = match &config.model_path {
            Some(path) => read(path).await?,
            None => BUILTIN_MODEL.to_string(),
        };
        match &config.policy_path {
            Some(path) => Self::parse(model, &read(path).await?),
            None => Self::parse(model, BUILTIN_POLICY),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// `p` rules in casbin's vector form.
    pub fn permissions(&self) -> Vec<Vec<String>> {
        self.rules
            .iter()
            .filter_map(|rule| match rule {
                PolicyRule::Permission {
                    subject,
                    object,
                    action,
                } => Some(vec![subject.clone(), object.clone(), action.clone()]),
                PolicyRule::Inheritance { .. } => None,
            })
            .collect()
    }

    /// `g` rules as `(member, role)` pairs.
    pub fn inheritance(&self) -> Vec<(String, String)> {
        self.rules
            .iter()
            .filter_map(|rule| match rule {
                PolicyRule::Inheritance { member, role } => Some((member.clone(), role.clone())),
                PolicyRule::Permission { .. } => None,
            })
            .collect()
    }
}

async fn read(path: &Path) -> AuthcoreResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AuthcoreError::Policy(format!("{}: {e}", path.display())))
}

fn parse_rule(line_no: usize, line: &str) -> AuthcoreResult<PolicyRule> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let malformed = || AuthcoreError::Policy(format!("malformed rule on line {line_no}: {line}"));
    if fields.iter().any(|f| f.is_empty()) {
        return Err(malformed());
    }
    match fields.as_slice() {
        ["p", subject, object, action] => Ok(PolicyRule::Permission {
            subject: subject.to_string(),
            object: object.to_string(),
            action: action.to_string(),
        }),
        ["g", member, role] => Ok(PolicyRule::Inheritance {
            member: member.to_string(),
            role: role.to_string(),
        }),
        _ => Err(malformed()),
    }
}
