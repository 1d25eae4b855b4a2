use eframe::egui;

// ============================================================================
// TOOLS PANEL — tool enumeration + selector row
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    /// Paint single cells with the current palette color.
    #[default]
    Pen,
    /// Restore cells to the background color.
    Eraser,
    /// Flood-fill the 4-connected region under the cursor.
    Bucket,
    /// Pick the color of the cell under the cursor as the current color.
    Picker,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[Tool::Pen, Tool::Eraser, Tool::Bucket, Tool::Picker]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pen => "Pen",
            Tool::Eraser => "Eraser",
            Tool::Bucket => "Bucket",
            Tool::Picker => "Picker",
        }
    }

    /// Keyboard shortcut shown in the button tooltip.
    pub fn shortcut(&self) -> egui::Key {
        match self {
            Tool::Pen => egui::Key::B,
            Tool::Eraser => egui::Key::E,
            Tool::Bucket => egui::Key::G,
            Tool::Picker => egui::Key::I,
        }
    }

    fn shortcut_label(&self) -> &'static str {
        match self {
            Tool::Pen => "B",
            Tool::Eraser => "E",
            Tool::Bucket => "G",
            Tool::Picker => "I",
        }
    }
}

pub struct ToolsPanel {
    current_tool: Tool,
}

impl Default for ToolsPanel {
    fn default() -> Self {
        Self {
            current_tool: Tool::Pen,
        }
    }
}

impl ToolsPanel {
    pub fn current_tool(&self) -> Tool {
        self.current_tool
    }

    pub fn set_current_tool(&mut self, tool: Tool) {
        self.current_tool = tool;
    }

    /// One selectable button per tool.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for &tool in Tool::all() {
                let selected = self.current_tool == tool;
                let button = ui
                    .selectable_label(selected, tool.label())
                    .on_hover_text(format!("{} ({})", tool.label(), tool.shortcut_label()));
                if button.clicked() {
                    self.current_tool = tool;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tool_is_pen() {
        let panel = ToolsPanel::default();
        assert_eq!(panel.current_tool(), Tool::Pen);
    }

    #[test]
    fn set_current_tool_sticks() {
        let mut panel = ToolsPanel::default();
        panel.set_current_tool(Tool::Bucket);
        assert_eq!(panel.current_tool(), Tool::Bucket);
    }
}
