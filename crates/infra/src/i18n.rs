//! Message catalog backing the core's [`Translator`] seam.

use std::collections::HashMap;

use keyward_auth::message::{Message, Translator, keys};

/// `(locale, key) -> template` catalog.
///
/// Templates use positional placeholders (`{0}`, `{1}`, ...). Lookups fall
/// back to the default locale, then to the bare key followed by its
/// arguments.
#[derive(Debug, Clone)]
pub struct CatalogTranslator {
    default_locale: String,
    templates: HashMap<(String, String), String>,
}

impl CatalogTranslator {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            templates: HashMap::new(),
        }
    }

    /// English catalog covering every key the core emits.
    pub fn english() -> Self {
        let mut catalog = Self::new("en");
        for (key, template) in [
            (keys::INVALID_CREDENTIAL, "Incorrect user name or password"),
            (
                keys::ACCOUNT_LOCKED,
                "You have entered a wrong password too many times, please wait {0} minutes {1} seconds and try again",
            ),
            (keys::ACCOUNT_FORBIDDEN, "The user {0} is forbidden to sign in, please contact the administrator"),
            (keys::UNSUPPORTED_SCHEME, "Unsupported password type: {0}"),
            (keys::FEDERATED_ACCOUNT, "The user {0} must sign in through the directory"),
            (keys::ORGANIZATION_NOT_FOUND, "The organization of user {0} does not exist"),
            (keys::POLICY_ENGINE_FAILED, "The permission {0} could not be evaluated"),
            (keys::AMBIGUOUS_IDENTITY, "Multiple directory accounts match {0}"),
            (keys::DIRECTORY_ERROR, "Directory {0} failed: {1}"),
            (keys::SERVICE_UNAVAILABLE, "The service is temporarily unavailable ({0}), please try again later"),
            (keys::LOGIN_REQUIRED, "Please sign in first"),
            (keys::SESSION_OUTDATED, "Your session has expired, please sign in again"),
            (keys::TARGET_NOT_FOUND, "The user {0} does not exist"),
            (keys::NO_PERMISSION, "You don't have the permission to do this"),
        ] {
            catalog.insert("en", key, template);
        }
        catalog
    }

    pub fn insert(&mut self, locale: &str, key: &str, template: &str) {
        self.templates
            .insert((locale.to_string(), key.to_string()), template.to_string());
    }

    /// Merge a flat JSON object of `key -> template` for `locale`.
    pub fn load_json(&mut self, locale: &str, json: &str) -> anyhow::Result<usize> {
        let entries: HashMap<String, String> = serde_json::from_str(json)?;
        let count = entries.len();
        for (key, template) in entries {
            self.templates.insert((locale.to_string(), key), template);
        }
        tracing::debug!(locale, count, "message catalog loaded");
        Ok(count)
    }

    fn template(&self, locale: &str, key: &str) -> Option<&str> {
        self.templates
            .get(&(locale.to_string(), key.to_string()))
            .or_else(|| {
                self.templates
                    .get(&(self.default_locale.clone(), key.to_string()))
            })
            .map(String::as_str)
    }
}

impl Translator for CatalogTranslator {
    fn translate(&self, locale: &str, message: &Message) -> String {
        match self.template(locale, message.key()) {
            Some(template) => fill(template, message.args()),
            None => message.to_string(),
        }
    }
}

/// Substitute `{n}` placeholders in one pass; argument text is never
/// rescanned. Placeholders without a matching argument are kept verbatim.
fn fill(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let arg = tail.find('}').and_then(|close| {
            let index: usize = tail[..close].parse().ok()?;
            Some((args.get(index)?, close))
        });
        match arg {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
