//! Tool categories and the action-to-category mapping

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Functional group of a tool
///
/// Declaration order is also the order built-in tools are assembled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Rag,
    Image,
    File,
    Web,
    Code,
    System,
    Conversation,
    Autonomous,
}

impl ToolCategory {
    /// All categories in declaration order
    pub const ALL: [ToolCategory; 8] = [
        ToolCategory::Rag,
        ToolCategory::Image,
        ToolCategory::File,
        ToolCategory::Web,
        ToolCategory::Code,
        ToolCategory::System,
        ToolCategory::Conversation,
        ToolCategory::Autonomous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Rag => "rag",
            ToolCategory::Image => "image",
            ToolCategory::File => "file",
            ToolCategory::Web => "web",
            ToolCategory::Code => "code",
            ToolCategory::System => "system",
            ToolCategory::Conversation => "conversation",
            ToolCategory::Autonomous => "autonomous",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown tool category: {}", s))
    }
}

/// High-level intent of a conversation turn, used to narrow the tool set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Chat,
    GenerateImage,
    PerformRagSearch,
    SearchWeb,
    FileInteraction,
    ApplicationCommand,
}

impl ActionType {
    pub const ALL: [ActionType; 6] = [
        ActionType::Chat,
        ActionType::GenerateImage,
        ActionType::PerformRagSearch,
        ActionType::SearchWeb,
        ActionType::FileInteraction,
        ActionType::ApplicationCommand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Chat => "chat",
            ActionType::GenerateImage => "generate_image",
            ActionType::PerformRagSearch => "perform_rag_search",
            ActionType::SearchWeb => "search_web",
            ActionType::FileInteraction => "file_interaction",
            ActionType::ApplicationCommand => "application_command",
        }
    }

    /// Built-in categories exposed for this action
    ///
    /// `ApplicationCommand` exposes every category, and custom tools too.
    pub fn categories(&self) -> &'static [ToolCategory] {
        match self {
            ActionType::Chat => &[ToolCategory::Conversation],
            ActionType::GenerateImage => &[ToolCategory::Image],
            ActionType::PerformRagSearch => &[ToolCategory::Rag],
            ActionType::SearchWeb => &[ToolCategory::Web],
            ActionType::FileInteraction => &[ToolCategory::File],
            ActionType::ApplicationCommand => &ToolCategory::ALL,
        }
    }

    /// Whether this action exposes the complete tool set
    pub fn exposes_all_tools(&self) -> bool {
        matches!(self, ActionType::ApplicationCommand)
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    /// Accepts snake_case names in any letter case, e.g. `generate_image` or `GENERATE_IMAGE`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| format!("Unknown action type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order_and_names() {
        let names: Vec<&str> = ToolCategory::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            vec!["rag", "image", "file", "web", "code", "system", "conversation", "autonomous"]
        );
        assert_eq!(serde_json::to_value(ToolCategory::Rag).unwrap(), "rag");
        assert_eq!("Web".parse::<ToolCategory>().unwrap(), ToolCategory::Web);
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("chat".parse::<ActionType>().unwrap(), ActionType::Chat);
        assert_eq!(
            "GENERATE_IMAGE".parse::<ActionType>().unwrap(),
            ActionType::GenerateImage
        );
        assert_eq!(
            "file-interaction".parse::<ActionType>().unwrap(),
            ActionType::FileInteraction
        );
        assert!("dance".parse::<ActionType>().is_err());
    }

    #[test]
    fn test_action_categories() {
        assert_eq!(ActionType::Chat.categories(), &[ToolCategory::Conversation]);
        assert_eq!(ActionType::SearchWeb.categories(), &[ToolCategory::Web]);
        assert_eq!(ActionType::ApplicationCommand.categories().len(), 8);
        assert!(ActionType::ApplicationCommand.exposes_all_tools());
        assert!(!ActionType::PerformRagSearch.exposes_all_tools());
    }
}
