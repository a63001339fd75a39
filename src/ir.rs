use serde::{Deserialize, Serialize};

/// Lane tier a frame type belongs to. The discriminant is the base lane index
/// of the tier; namespaced lanes are carved out of `base + 1 .. next base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Interaction,
    CommandReadModel,
    Event,
}

impl Tier {
    pub const BAND_WIDTH: u32 = 100;

    pub fn base_index(self) -> u32 {
        match self {
            Tier::Interaction => 0,
            Tier::CommandReadModel => 100,
            Tier::Event => 200,
        }
    }

    /// Exclusive upper bound of the index band reserved for this tier.
    pub fn band_end(self) -> u32 {
        self.base_index() + Self::BAND_WIDTH
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelEntityType {
    Screen,
    Processor,
    ReadModel,
    Command,
    Event,
    Other(String),
}

impl ModelEntityType {
    pub fn from_token(token: &str) -> Self {
        match token {
            "scn" | "screen" => Self::Screen,
            "pcr" | "processor" => Self::Processor,
            "rmo" | "readmodel" => Self::ReadModel,
            "cmd" | "command" => Self::Command,
            "evt" | "event" => Self::Event,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_token(&self) -> &str {
        match self {
            Self::Screen => "screen",
            Self::Processor => "processor",
            Self::ReadModel => "readmodel",
            Self::Command => "command",
            Self::Event => "event",
            Self::Other(tag) => tag.as_str(),
        }
    }

    /// Unrecognized types fall into the event tier.
    pub fn tier(&self) -> Tier {
        match self {
            Self::Screen | Self::Processor => Tier::Interaction,
            Self::ReadModel | Self::Command => Tier::CommandReadModel,
            Self::Event | Self::Other(_) => Tier::Event,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for ModelEntityType {
    fn from(value: String) -> Self {
        Self::from_token(value.trim())
    }
}

impl From<ModelEntityType> for String {
    fn from(value: ModelEntityType) -> Self {
        value.as_token().to_string()
    }
}

/// One timeline entry of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub name: String,
    pub model_entity_type: ModelEntityType,
    pub entity_identifier: String,
    #[serde(default)]
    pub source_frames: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_inline_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_reference: Option<String>,
    #[serde(default)]
    pub is_reset_frame: bool,
}

impl Frame {
    pub fn new(
        name: impl Into<String>,
        model_entity_type: ModelEntityType,
        entity_identifier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model_entity_type,
            entity_identifier: entity_identifier.into(),
            source_frames: Vec::new(),
            data_inline_value: None,
            data_reference: None,
            is_reset_frame: false,
        }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_frames = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_inline_value(mut self, value: impl Into<String>) -> Self {
        self.data_inline_value = Some(value.into());
        self
    }

    pub fn with_data_reference(mut self, name: impl Into<String>) -> Self {
        self.data_reference = Some(name.into());
        self
    }

    pub fn reset(mut self) -> Self {
        self.is_reset_frame = true;
        self
    }

    pub fn has_source_frames(&self) -> bool {
        !self.source_frames.is_empty()
    }

    /// `Billing.InvoiceIssued` -> `Some("Billing")`. Only a single qualifier
    /// level is recognized.
    pub fn namespace(&self) -> Option<&str> {
        match split_identifier(&self.entity_identifier) {
            Some((namespace, _)) if !namespace.is_empty() => Some(namespace),
            _ => None,
        }
    }

    /// Identifier with any namespace prefix dropped. `None` when the
    /// identifier carries a namespace but no trailing name.
    pub fn short_name(&self) -> Option<&str> {
        match split_identifier(&self.entity_identifier) {
            Some((_, name)) if name.is_empty() => None,
            Some((_, name)) => Some(name),
            None if self.entity_identifier.is_empty() => None,
            None => Some(self.entity_identifier.as_str()),
        }
    }
}

fn split_identifier(identifier: &str) -> Option<(&str, &str)> {
    let mut parts = identifier.split('.');
    let first = parts.next()?;
    let second = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((first, second))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEntity {
    pub name: String,
    pub data_block_value: String,
}

impl DataEntity {
    pub fn new(name: impl Into<String>, data_block_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_block_value: data_block_value.into(),
        }
    }
}

/// Parsed event model as handed over by the grammar front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventModel {
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub data_entities: Vec<DataEntity>,
}

impl EventModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json5_str(input: &str) -> anyhow::Result<Self> {
        let model = json5::from_str(input)?;
        Ok(model)
    }
}
