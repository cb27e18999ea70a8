use serde::{Deserialize, Serialize};

/// Rule configuration for a compliance pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRules {
    pub required_prefixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl Default for ComplianceRules {
    fn default() -> Self {
        Self {
            required_prefixes: vec!["Date:".to_string(), "Signature:".to_string()],
            keyword: None,
        }
    }
}

impl ComplianceRules {
    pub fn with_prefixes(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required_prefixes: prefixes.into_iter().map(Into::into).collect(),
            keyword: None,
        }
    }

    pub(crate) fn success_message(&self) -> String {
        let quoted: Vec<String> = self
            .required_prefixes
            .iter()
            .map(|prefix| format!("'{prefix}'"))
            .collect();

        match quoted.as_slice() {
            [] => "All required values are present.".to_string(),
            [only] => format!("All values for {only} are present."),
            [init @ .., last] => {
                format!("All values for {} and {last} are present.", init.join(", "))
            }
        }
    }
}
