// src/resolver/endpoint.rs

//! Gateway URL templates

use crate::error::{Error, Result};
use std::fmt;

/// Placeholder replaced by the identifier when a template is expanded
pub const ID_PLACEHOLDER: &str = "{id}";

/// Public gateways used by the reference deployment, in priority order
pub const REFERENCE_GATEWAYS: [&str; 4] = [
    "https://ipfs.io/ipfs/{id}",
    "https://gateway.pinata.cloud/ipfs/{id}",
    "https://cloudflare-ipfs.com/ipfs/{id}",
    "https://dweb.link/ipfs/{id}",
];

/// A URL template parameterized by identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    template: String,
}

impl EndpointTemplate {
    /// Parse a template
    ///
    /// A string without `{id}` is taken as a base URL and gets `/{id}`
    /// appended. The expanded form must be a valid URL.
    pub fn parse(template: &str) -> Result<Self> {
        let template = template.trim();
        let template = if template.contains(ID_PLACEHOLDER) {
            template.to_string()
        } else {
            format!("{}/{}", template.trim_end_matches('/'), ID_PLACEHOLDER)
        };

        let sample = template.replace(ID_PLACEHOLDER, "sample");
        url::Url::parse(&sample).map_err(|e| {
            Error::ConfigError(format!("Invalid gateway template '{}': {}", template, e))
        })?;

        Ok(Self { template })
    }

    /// Substitute the identifier into the template
    pub fn expand(&self, identifier: &str) -> String {
        self.template.replace(ID_PLACEHOLDER, identifier)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for EndpointTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Ordered gateway list; position is priority
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointList {
    templates: Vec<EndpointTemplate>,
}

impl EndpointList {
    /// The four public gateways of the reference deployment
    pub fn reference() -> Self {
        Self {
            templates: REFERENCE_GATEWAYS
                .iter()
                .map(|t| EndpointTemplate {
                    template: (*t).to_string(),
                })
                .collect(),
        }
    }

    pub fn from_templates<I, S>(templates: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let templates = templates
            .into_iter()
            .map(|t| EndpointTemplate::parse(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { templates })
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
