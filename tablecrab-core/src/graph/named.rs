use crate::error::TopologyError;
use crate::graph::TopologyBuilder;

const MAX_NAME_LENGTH: usize = 249;

/// Check that a user-supplied name is usable as a processor or topic name.
pub fn validate_name(name: &str) -> Result<(), TopologyError> {
    let invalid = |reason: &str| TopologyError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name cannot be `.` or `..`"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(invalid("name is longer than 249 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid("only ASCII alphanumerics, '.', '_' and '-' are allowed"));
    }
    Ok(())
}

/// Optional user-chosen scope name for the processors of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Named {
    name: Option<String>,
}

impl Named {
    /// Let the engine generate names.
    pub fn unnamed() -> Self {
        Self::default()
    }

    /// Use `name` as the scope of every processor the operation creates.
    pub fn new(name: impl Into<String>) -> Result<Self, TopologyError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self { name: Some(name) })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `<name><suffix>` when a scope name was given, otherwise a generated
    /// `<prefix><index>` name.
    pub fn suffix_with_or_else_get<B>(&self, suffix: &str, builder: &mut B, prefix: &str) -> String
    where
        B: TopologyBuilder + ?Sized,
    {
        match &self.name {
            Some(name) => format!("{name}{suffix}"),
            None => builder.new_processor_name(prefix),
        }
    }
}
