use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::env;

pub const DEFAULT_TABLE_NAME: &str = "data-storage-dynamodb";

/// Lambda settings, read once per cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaConfig {
    pub table_name: String,
    /// `None` lets the SDK pick up the function's own region.
    pub region: Option<String>,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            table_name: lookup("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            region: lookup("TABLE_REGION").filter(|r| !r.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("TABLE_NAME", &self.table_name)?;
        // DynamoDB 資料表名稱長度限制
        validation::validate_range("TABLE_NAME", self.table_name.len(), 3, 255)?;
        if let Some(region) = &self.region {
            validate_aws_region("TABLE_REGION", region)?;
        }
        Ok(())
    }
}

pub fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    use crate::utils::error::IngestError;

    validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(IngestError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LambdaConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.table_name, "data-storage-dynamodb");
        assert_eq!(config.region, None);
    }

    #[test]
    fn test_overrides() {
        let config =
            LambdaConfig::from_lookup(lookup(&[("TABLE_NAME", "weather"), ("TABLE_REGION", "us-east-1")]))
                .unwrap();
        assert_eq!(config.table_name, "weather");
        assert_eq!(config.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_bad_region() {
        assert!(LambdaConfig::from_lookup(lookup(&[("TABLE_REGION", "US_EAST")])).is_err());
        assert!(LambdaConfig::from_lookup(lookup(&[("TABLE_NAME", "ab")])).is_err());
    }
}
