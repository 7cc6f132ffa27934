use crate::core::ingest::{ErrorPolicy, JobSettings, PartitionKey, StampSpec};
use crate::core::normalizer::{FieldMap, Normalizer, PassthroughMode};
use crate::utils::error::{IngestError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// ThingSpeak serves at most this many entries per request.
pub const MAX_RESULTS: usize = 8000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFile {
    pub pipeline: PipelineSection,
    pub source: SourceSection,
    pub normalize: NormalizeSection,
    pub sink: SinkSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    pub url: String,
    pub results: Option<usize>,
    pub interval_seconds: Option<u64>,
    pub record_delay_seconds: Option<f64>,
}

/// Built-in rename tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum MapPreset {
    /// `field1` → `wind_direction`, ...
    SnakeCase,
    /// `field1` → `Wind Direction`, ...
    Labels,
    /// No renaming.
    None,
}

impl MapPreset {
    pub fn field_map(self) -> FieldMap {
        match self {
            MapPreset::SnakeCase => FieldMap::thingspeak_snake_case(),
            MapPreset::Labels => FieldMap::thingspeak_labels(),
            MapPreset::None => FieldMap::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapEntry {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeSection {
    pub mode: PassthroughMode,
    pub preset: Option<MapPreset>,
    /// Applied after the preset, in file order.
    pub field_map: Option<Vec<FieldMapEntry>>,
    pub stamp: StampSpec,
    pub partition: Option<PartitionKey>,
    pub on_error: Option<ErrorPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Jsonl,
    Kinesis,
    Kafka,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSection {
    pub kind: SinkKind,
    pub path: Option<String>,
    pub stream_name: Option<String>,
    pub region: Option<String>,
    pub topic: Option<String>,
    pub bootstrap_servers: Option<String>,
    pub security_protocol: Option<String>,
    pub sasl_mechanism: Option<String>,
}

impl PipelineFile {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(IngestError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| IngestError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${KAFKA_BOOTSTRAP})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| IngestError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn field_map(&self) -> Result<FieldMap> {
        let preset = self.normalize.preset.unwrap_or(MapPreset::None).field_map();
        let custom = self.normalize.field_map.iter().flatten();

        FieldMap::new(
            preset
                .iter()
                .map(|(s, t)| (s.to_string(), t.to_string()))
                .chain(custom.map(|e| (e.source.clone(), e.target.clone()))),
        )
    }

    pub fn results(&self) -> usize {
        self.source.results.unwrap_or(100)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.source.interval_seconds.unwrap_or(60))
    }

    pub fn job_settings(&self) -> Result<JobSettings> {
        let record_delay = self.source.record_delay_seconds.unwrap_or(0.0);
        let record_delay = Duration::try_from_secs_f64(record_delay).map_err(|_| {
            IngestError::InvalidConfigValueError {
                field: "source.record_delay_seconds".to_string(),
                value: record_delay.to_string(),
                reason: "Delay must be a non-negative number of seconds".to_string(),
            }
        })?;

        Ok(JobSettings {
            normalizer: Normalizer::new(self.field_map()?, self.normalize.mode),
            stamp: self.normalize.stamp.clone(),
            partition: self.normalize.partition.unwrap_or(PartitionKey::EntryId),
            policy: self.normalize.on_error.unwrap_or(ErrorPolicy::LogAndContinue),
            record_delay,
        })
    }
}

impl Validate for PipelineFile {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validation::validate_url("source.url", &self.source.url)?;
        validation::validate_range("source.results", self.results(), 1, MAX_RESULTS)?;
        validation::validate_non_empty_string("normalize.stamp.name", &self.normalize.stamp.name)?;

        let field_map = self.field_map()?;
        if let Err(e) =
            validation::validate_unique_targets("normalize.field_map", field_map.iter().map(|(_, t)| t))
        {
            // 允許但提醒：碰撞時以宣告順序較後者為準
            tracing::warn!("⚠️ {}", e);
        }

        match self.sink.kind {
            SinkKind::Jsonl => {
                let path = validation::validate_required_field("sink.path", &self.sink.path)?;
                validation::validate_path("sink.path", path)?;
            }
            SinkKind::Kinesis => {
                validation::validate_required_field("sink.stream_name", &self.sink.stream_name)?;
            }
            SinkKind::Kafka => {
                validation::validate_required_field("sink.topic", &self.sink.topic)?;
                validation::validate_required_field(
                    "sink.bootstrap_servers",
                    &self.sink.bootstrap_servers,
                )?;
            }
        }

        tracing::info!("✅ Pipeline configuration validation passed");
        Ok(())
    }
}
