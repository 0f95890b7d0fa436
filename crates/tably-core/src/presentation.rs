use serde::{Deserialize, Serialize};

/// How a report dataset should be shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationKind {
    Bar,
    Line,
    Pie,
    List,
    Table,
    None,
}

impl PresentationKind {
    /// Picker order
    pub const ALL: [PresentationKind; 6] = [
        PresentationKind::Bar,
        PresentationKind::Line,
        PresentationKind::Pie,
        PresentationKind::List,
        PresentationKind::Table,
        PresentationKind::None,
    ];

    /// Lowercased wire name sent as the `visualization` field
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationKind::Bar => "bar",
            PresentationKind::Line => "line",
            PresentationKind::Pie => "pie",
            PresentationKind::List => "list",
            PresentationKind::Table => "table",
            PresentationKind::None => "none",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bar" => Some(PresentationKind::Bar),
            "line" => Some(PresentationKind::Line),
            "pie" => Some(PresentationKind::Pie),
            "list" => Some(PresentationKind::List),
            "table" => Some(PresentationKind::Table),
            "none" => Some(PresentationKind::None),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PresentationKind::Bar => "Bar",
            PresentationKind::Line => "Line",
            PresentationKind::Pie => "Pie",
            PresentationKind::List => "List",
            PresentationKind::Table => "Table",
            PresentationKind::None => "None",
        }
    }
}

impl std::fmt::Display for PresentationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
