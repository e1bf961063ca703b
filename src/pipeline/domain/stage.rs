//! Stage registry for the sales pipeline.
//!
//! The registry is the closed, ordered set of pipeline stages together with
//! the tag vocabulary offered while a task sits in each stage and the colour
//! legend used to draw columns and tag chips. Its order defines the
//! left-to-right column order of the board and never changes at runtime.
//!
//! Lookups by key never fail loudly: an unknown key yields `None` or an empty
//! vocabulary so that tasks carrying legacy stage values degrade into an
//! unlabelled slot instead of breaking the board.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage value carried by a task.
///
/// A key may hold a value outside the registry (for example a stage from an
/// older board layout). Use [`StageRegistry::lookup`] to resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageKey(String);

impl StageKey {
    /// Key of the entry (triage) stage.
    pub const INBOX: &'static str = "INBOX";
    /// Key of the terminal completed stage.
    pub const COMPLETED: &'static str = "FINALIZADO";

    /// Creates a stage key from its wire form.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the entry stage key.
    #[must_use]
    pub fn inbox() -> Self {
        Self::new(Self::INBOX)
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether this key names the terminal completed stage.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.0 == Self::COMPLETED
    }
}

impl Default for StageKey {
    fn default() -> Self {
        Self::inbox()
    }
}

impl From<&str> for StageKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&StageDefinition> for StageKey {
    fn from(value: &StageDefinition) -> Self {
        Self::new(value.key)
    }
}

impl AsRef<str> for StageKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for StageKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StageKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static description of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDefinition {
    key: &'static str,
    title: &'static str,
    color: &'static str,
    tag_vocabulary: &'static [&'static str],
}

impl StageDefinition {
    /// Creates a stage definition.
    #[must_use]
    pub const fn new(
        key: &'static str,
        title: &'static str,
        color: &'static str,
        tag_vocabulary: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            title,
            color,
            tag_vocabulary,
        }
    }

    /// Returns the wire key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Returns the column heading.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.title
    }

    /// Returns the column background colour as a `#rrggbb` string.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        self.color
    }

    /// Returns the tags offered while a task sits in this stage.
    #[must_use]
    pub const fn tag_vocabulary(&self) -> &'static [&'static str] {
        self.tag_vocabulary
    }
}

/// Colour used for tags outside the legend.
pub const DEFAULT_TAG_COLOR: &str = "#9e9e9e";

const SALES_STAGES: &[StageDefinition] = &[
    StageDefinition::new(
        StageKey::INBOX,
        "Inbox",
        "#eceff1",
        &["C/Pendientes", "S/Pendientes", "Sin fecha"],
    ),
    StageDefinition::new(
        "COTIZACION",
        "Cotización",
        "#e3f2fd",
        &["Contactado", "Cotizado", "No contestó"],
    ),
    StageDefinition::new(
        "NEGOCIACION",
        "Negociación",
        "#fff8e1",
        &["Aceptado", "Precio alto", "Falta de atención"],
    ),
    StageDefinition::new(
        "APARTADO",
        "Apartado",
        "#f3e5f5",
        &[
            "C/Fecha",
            "Sin fecha",
            "Reagendado",
            "Confirmado",
            "Sin confirmar",
        ],
    ),
    StageDefinition::new("PAGADO", "Pagado", "#e8f5e9", &["Pagado", "No pagado"]),
    StageDefinition::new(
        StageKey::COMPLETED,
        "Finalizado",
        "#dcedc8",
        &["S/Pendientes", "C/Pendientes"],
    ),
    StageDefinition::new(
        "PERDIDO",
        "Perdido",
        "#ffebee",
        &[
            "Cancelado",
            "Precio alto",
            "No contestó",
            "No usa la maquina",
            "Maquina revendida",
        ],
    ),
];

const SALES_TAG_COLORS: &[(&str, &str)] = &[
    ("C/Pendientes", "#ff5252"),
    ("Sin fecha", "#9e9e9e"),
    ("Contactado", "#4caf50"),
    ("Cotizado", "#2196f3"),
    ("Aceptado", "#8bc34a"),
    ("C/Fecha", "#ff9800"),
    ("Reagendado", "#ff5722"),
    ("Cancelado", "#f44336"),
    ("Confirmado", "#4caf50"),
    ("Sin confirmar", "#ff9800"),
    ("Pagado", "#4caf50"),
    ("No pagado", "#f44336"),
    ("Precio alto", "#9c27b0"),
    ("Falta de atención", "#607d8b"),
    ("No contestó", "#795548"),
    ("No usa la maquina", "#9e9e9e"),
    ("Maquina revendida", "#673ab7"),
    ("S/Pendientes", "#cddc39"),
];

static SALES_PIPELINE: StageRegistry = StageRegistry {
    stages: SALES_STAGES,
    entry: StageKey::INBOX,
    completed: StageKey::COMPLETED,
    tag_colors: SALES_TAG_COLORS,
};

/// Closed, ordered set of pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRegistry {
    stages: &'static [StageDefinition],
    entry: &'static str,
    completed: &'static str,
    tag_colors: &'static [(&'static str, &'static str)],
}

impl StageRegistry {
    /// Returns the canonical seven-stage sales pipeline.
    #[must_use]
    pub fn sales_pipeline() -> &'static Self {
        &SALES_PIPELINE
    }

    /// Returns every stage in column order.
    #[must_use]
    pub const fn stages(&self) -> &'static [StageDefinition] {
        self.stages
    }

    /// Returns the stage keys in column order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.stages.iter().map(StageDefinition::key)
    }

    /// Finds the stage registered under `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&'static StageDefinition> {
        self.stages.iter().find(|stage| stage.key == key)
    }

    /// Returns the column position of `key`, if registered.
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.stages.iter().position(|stage| stage.key == key)
    }

    /// Returns whether `key` belongs to the registry.
    #[must_use]
    pub fn is_registered(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Returns the display title for `key`.
    #[must_use]
    pub fn title(&self, key: &str) -> Option<&'static str> {
        self.lookup(key).map(StageDefinition::title)
    }

    /// Returns the column colour for `key`.
    #[must_use]
    pub fn color(&self, key: &str) -> Option<&'static str> {
        self.lookup(key).map(StageDefinition::color)
    }

    /// Returns the tag vocabulary for `key`; empty for unknown stages.
    #[must_use]
    pub fn tag_vocabulary(&self, key: &str) -> &'static [&'static str] {
        self.lookup(key)
            .map(StageDefinition::tag_vocabulary)
            .unwrap_or_default()
    }

    /// Returns the stage new tasks land in by default.
    #[must_use]
    pub fn entry_stage(&self) -> StageKey {
        StageKey::new(self.entry)
    }

    /// Returns the terminal completed stage.
    #[must_use]
    pub fn completed_stage(&self) -> StageKey {
        StageKey::new(self.completed)
    }

    /// Returns the chip colour for `tag`, falling back to grey.
    #[must_use]
    pub fn tag_color(&self, tag: &str) -> &'static str {
        self.tag_colors
            .iter()
            .find(|(name, _)| *name == tag)
            .map_or(DEFAULT_TAG_COLOR, |&(_, color)| color)
    }
}
